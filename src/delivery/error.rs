use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::library::TrackId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("track not found: {0}")]
    NotFound(TrackId),
    #[error("failed to read track: {0}")]
    IoFailure(String),
    #[error("music service unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("music service did not answer in time")]
    Timeout,
    #[error("unexpected response from music service: {0}")]
    Protocol(String),
}

impl DeliveryError {
    /// Stable identifier carried in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::IoFailure(_) => "io_failure",
            Self::RemoteUnavailable(_) => "remote_unavailable",
            Self::Timeout => "timeout",
            Self::Protocol(_) => "protocol",
        }
    }

    /// Whether the service itself could not be reached.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_) | Self::Timeout)
    }
}

/// JSON body of every non-success HTTP response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl From<&DeliveryError> for ErrorBody {
    fn from(err: &DeliveryError) -> Self {
        Self {
            error: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}
