use core::fmt;

/// Errors reported by the request tracker.
///
/// Apart from [`ClientError::OutboxFull`] these are configuration errors:
/// they point at a mapping that cannot work as configured and are not
/// retried. Timeouts are not errors,
/// they reach listeners as `request_terminated` notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClientError {
    /// `set` was called for a mapping without a set template.
    NoSetMessage,
    /// A request was created for a mapping without a response template.
    NoResponseTemplate,
    /// The request template contains a non-SysEx message.
    RequestNotSysex,
    /// The response template contains a non-SysEx message.
    ResponseNotSysex,
    /// Feedback was simulated for a mapping that has no pending request.
    NoRequestForFeedback,
    /// The request table is full ([`MAX_REQUESTS`](super::MAX_REQUESTS)).
    RequestTableFull,
    /// A request already has [`MAX_LISTENERS_PER_REQUEST`](super::MAX_LISTENERS_PER_REQUEST)
    /// listeners.
    TooManyListeners,
    /// Two different mappings hash to the same key.
    KeyCollision,
    /// A template would exceed [`MAX_MESSAGES_PER_MAPPING`](super::MAX_MESSAGES_PER_MAPPING).
    TooManyMessages,
    /// Queued notifications were not dispatched in time and the outbox has
    /// no room for another batch.
    OutboxFull,
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ClientError::NoSetMessage => "mapping has no set message",
            ClientError::NoResponseTemplate => "mapping has no response template",
            ClientError::RequestNotSysex => "request message is not SysEx",
            ClientError::ResponseNotSysex => "response template is not SysEx",
            ClientError::NoRequestForFeedback => "no pending request to feed back a value to",
            ClientError::RequestTableFull => "request table full",
            ClientError::TooManyListeners => "too many listeners on one request",
            ClientError::KeyCollision => "mapping key collision",
            ClientError::TooManyMessages => "too many messages in template",
            ClientError::OutboxFull => "notification outbox full",
        };
        f.write_str(msg)
    }
}
