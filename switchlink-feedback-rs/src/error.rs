use core::fmt;

use switchlink::ClientError;

/// Errors raised while configuring or running callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CallbackError {
    /// Comparison mode code is not one of the known modes.
    InvalidComparisonMode(u16),
    /// A callback already holds [`MAX_CALLBACK_MAPPINGS`](crate::callback::MAX_CALLBACK_MAPPINGS).
    TooManyMappings,
    /// The client rejected a request or set.
    Client(ClientError),
}

impl From<ClientError> for CallbackError {
    fn from(e: ClientError) -> Self {
        CallbackError::Client(e)
    }
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackError::InvalidComparisonMode(code) => {
                write!(f, "invalid comparison mode: {}", code)
            }
            CallbackError::TooManyMappings => f.write_str("too many mappings in callback"),
            CallbackError::Client(e) => write!(f, "client error: {}", e),
        }
    }
}
