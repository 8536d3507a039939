use std::path::PathBuf;

/// All error types that can occur when controlling WiZ lights.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The host or port of a device address failed validation.
    #[error("invalid address {input:?}: {reason}")]
    InvalidAddress { input: String, reason: String },

    /// A hex color string was not of the form `#RRGGBB` / `RRGGBB`.
    #[error("invalid color string {0:?}; expected 6 hex digits with an optional leading '#'")]
    InvalidColorFormat(String),

    /// Failed to serialize a payload to JSON.
    #[error("failed to encode payload: {0:?}")]
    Encoding(serde_json::Error),

    /// A network socket operation failed.
    #[error("socket {action} error: {err:?}")]
    Socket { action: String, err: std::io::Error },

    /// Every delivery attempt to a device failed.
    #[error("failed to deliver command to {address} after {attempts} attempts: {last_error}")]
    DispatchFailed {
        address: String,
        attempts: u32,
        #[source]
        last_error: Box<Error>,
    },

    /// Reading discovery replies failed for a reason other than the window closing.
    #[error("error reading discovery response: {0:?}")]
    Discovery(std::io::Error),

    /// An inline timer is already pending for this session.
    #[error("a sleep timer is already pending")]
    TimerPending,

    /// The detached timer worker could not be launched.
    #[error("failed to spawn timer worker: {0:?}")]
    Spawn(std::io::Error),

    /// The controller configuration could not be read, parsed or validated.
    #[error("config {path:?}: {reason}")]
    Config { path: PathBuf, reason: String },
}

impl Error {
    /// Create a new socket error
    pub fn socket(action: &str, err: std::io::Error) -> Self {
        Error::Socket {
            action: action.to_string(),
            err,
        }
    }

    /// Create a new invalid address error
    pub fn invalid_address(input: &str, reason: &str) -> Self {
        Error::InvalidAddress {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn config(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::Config {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
