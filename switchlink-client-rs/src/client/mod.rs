//! Request/response tracking between the controller and the device.
//!
//! A [`ParameterMapping`] describes one device parameter as wire templates.
//! Callbacks ask a [`ParameterClient`] to request mappings; the client keeps
//! at most one [`ClientRequest`] per distinct mapping and attaches further
//! callers as additional listeners instead of sending the request again.
//!
//! # Request lifecycle
//!
//! ```text
//!             request()            response parsed (bounded lifetime)
//!   (none) ───────────► pending ─────────────────────────────► finished
//!                        │  │                                     ▲
//!                        │  └── lifetime exceeded ─► terminated ──┘
//!                        │
//!                        └── response parsed (unlimited lifetime)
//!                              ─► stays pending, notifies again on every push
//! ```
//!
//! Finished requests are pruned from the table in the same call that
//! finished them.
//!
//! # Notifications
//!
//! Listeners are addressed by [`ListenerId`]. Notifications are queued in
//! the client's outbox as [`ParameterUpdate`] snapshots (taken right after
//! the value was written) and delivered in registration order by
//! [`ParameterClient::dispatch()`]. Listeners may therefore call back into
//! the client while handling a notification on the next call, without
//! re-entrancy.
//!
//! # Capacities
//!
//! All storage is fixed-size; see the `MAX_*` constants below.

mod bidirectional;
mod error;
mod listener;
mod mapping;
mod message;
mod request;
mod tracker;
mod value;

use embassy_time::Instant;
use embedded_graphics::pixelcolor::Rgb888;

pub use bidirectional::{BidirectionalClient, BidirectionalProtocol, ProtocolEvent};
pub use error::ClientError;
pub use listener::{ClientListener, ListenerId, Listeners, ParameterUpdate};
pub use mapping::{MappingKey, MappingType, ParameterMapping};
pub use message::{
    single, MessageList, MidiInput, MidiMessage, MidiOutput, SysexData, WireBytes, SYSEX_END,
    SYSEX_START,
};
pub use request::{ClientRequest, RequestLifetime};
pub use tracker::{Client, ClientConfig};
pub use value::{ParameterValue, TextValue};

/// Maximum SysEx payload length (without `F0`/`F7`).
pub const MAX_SYSEX_LEN: usize = 64;

/// Maximum number of messages in one set/request/response template.
pub const MAX_MESSAGES_PER_MAPPING: usize = 4;

/// Maximum length of a text parameter value in bytes.
pub const MAX_TEXT_LEN: usize = 32;

/// Maximum number of concurrently tracked requests. Must be a power of two.
pub const MAX_REQUESTS: usize = 32;

/// Maximum number of listeners attached to one request.
pub const MAX_LISTENERS_PER_REQUEST: usize = 8;

/// Maximum number of queued notifications between two dispatches.
///
/// One `receive` or `update` call notifies every listener of a full
/// request table at most twice (a parsed answer, then a connection loss),
/// and one feedback `set` adds a single request's listeners on top.
pub const MAX_PENDING_EVENTS: usize =
    2 * MAX_REQUESTS * MAX_LISTENERS_PER_REQUEST + MAX_LISTENERS_PER_REQUEST;

const _: () = assert!(
    MAX_PENDING_EVENTS >= 2 * MAX_REQUESTS * MAX_LISTENERS_PER_REQUEST + MAX_LISTENERS_PER_REQUEST
);
const _: () = assert!(MAX_REQUESTS.is_power_of_two());

/// Decodes incoming messages into mapping values and encodes values into
/// set templates. Device specific.
pub trait ValueProvider {
    /// Try to parse `message` as an answer for `mapping`.
    ///
    /// Returns `false` if the message does not match the response template.
    /// On `true` the decoded value has already been written to
    /// `mapping.value`.
    fn parse(&mut self, mapping: &mut ParameterMapping, message: &MidiMessage) -> bool;

    /// Encode `value` into the set template(s) of `mapping`, in place.
    fn set_value(&mut self, mapping: &mut ParameterMapping, value: &ParameterValue);
}

/// The operations callbacks and UI elements use to talk to the device.
///
/// Implemented by [`Client`] and [`BidirectionalClient`], so callers can
/// work with `&mut dyn ParameterClient` regardless of the protocol in use.
pub trait ParameterClient {
    /// Announce interest in a mapping without sending anything.
    fn register(
        &mut self,
        mapping: &ParameterMapping,
        listener: ListenerId,
        now: Instant,
    ) -> Result<(), ClientError>;

    /// Ask the device for the current value of `mapping`.
    ///
    /// If a request for an equal mapping is already in flight, `listener`
    /// is attached to it and nothing is sent.
    fn request(
        &mut self,
        mapping: &ParameterMapping,
        listener: ListenerId,
        now: Instant,
    ) -> Result<(), ClientError>;

    /// Stamp `value` into the set template(s) of `mapping` and send them.
    fn set(&mut self, mapping: &mut ParameterMapping, value: &ParameterValue)
        -> Result<(), ClientError>;

    /// Run timeout sweeps and, if a message arrived, offer it to all
    /// pending requests.
    fn receive(&mut self, message: Option<&MidiMessage>, now: Instant);

    /// Periodic hook, called once per update interval.
    fn update(&mut self, _now: Instant) {}

    /// Deliver queued notifications.
    ///
    /// The outbox holds the notifications of one `receive`, `update` or
    /// `set` call. Dispatch after each of them; a `set` that finds no room
    /// fails with [`ClientError::OutboxFull`].
    fn dispatch(&mut self, listeners: &mut dyn Listeners);

    /// Color for a connection status indicator, if the client has one.
    fn status_color(&self) -> Option<Rgb888> {
        None
    }
}
