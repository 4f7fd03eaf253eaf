use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that may occur in this library.
#[derive(Debug, Error, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub enum Error {
    /// The port is already open.
    #[error("The port `{0}` is already open")]
    AlreadyOpen(String),

    /// The port is not open.
    #[error("The port `{0}` is not open")]
    NotOpen(String),

    /// The device behind the port could not be acquired.
    #[error("The device for port `{name}` is unavailable: {reason}")]
    DeviceUnavailable {
        /// The port whose device could not be acquired.
        name: String,

        /// Why the device could not be acquired, e.g. missing or busy.
        reason: String,
    },

    /// A command referenced a port name the backend does not know.
    #[error("The port `{0}` does not exist")]
    PortNotFound(String),

    /// A port may not subscribe to itself.
    #[error("The port `{0}` may not subscribe to itself")]
    SelfSubscription(String),

    /// The backend could not be reached, or dropped a request mid-flight.
    #[error("The backend could not be reached: {0}")]
    TransportFailure(String),

    /// A configuration file did not uphold its invariants.
    #[error("The configuration is invalid. Problem: `{0}`")]
    BadConfig(String),
}

impl Error {
    /// A [`Error::DeviceUnavailable`] with the given reason.
    pub fn device_unavailable(name: &str, reason: &str) -> Self {
        Self::DeviceUnavailable {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// The problem description, if this is the bad config variant.
    pub fn try_into_bad_config(self) -> Result<String, Self> {
        if let Self::BadConfig(problem) = self {
            Ok(problem)
        } else {
            Err(self)
        }
    }
}
