//! Error types for provider clients.

use culvert_protocol::PipelineError;
use thiserror::Error;

/// Errors raised while talking to a provider.
#[derive(Debug, Error)]
pub enum StationError {
    /// The request could not be sent or the body not read.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with an error payload; the text is readable.
    #[error("{0}")]
    Upstream(String),

    /// The provider answered with an unexpected status and no usable body.
    #[error("{provider} returned HTTP {status}")]
    Status { provider: &'static str, status: u16 },

    /// The response body did not have the expected shape.
    #[error("Failed to decode {provider} response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },

    #[error("Provided PipeLife credentials are not recognized. Make sure your credentials are valid")]
    InvalidCredentials,

    /// No station satisfies the request.
    #[error("{0}")]
    NoStation(String),
}

impl StationError {
    pub fn decode(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            provider,
            message: message.into(),
        }
    }
}

impl From<StationError> for PipelineError {
    fn from(err: StationError) -> Self {
        match err {
            StationError::NoStation(msg) => PipelineError::NoData(msg),
            other => PipelineError::Upstream(other.to_string()),
        }
    }
}

/// Result type for provider calls.
pub type Result<T> = std::result::Result<T, StationError>;
