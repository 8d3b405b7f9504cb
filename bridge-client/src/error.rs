//! Error types for the bridge client.

use std::time::Duration;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised while talking to the bridge host.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The bridge host is not listening
    #[error("Failed to connect to bridge at {address}: {source}")]
    Connect {
        /// Address the client tried
        address: String,
        /// Underlying socket error
        source: std::io::Error,
    },

    /// No response arrived in time
    #[error("No response from bridge within {0:?}")]
    Timeout(Duration),

    /// The host closed the connection without answering
    #[error("Bridge closed the connection without a response")]
    NoResponse,

    /// Socket I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The response was not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Get the error code for this error type.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "CONNECT_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::NoResponse => "NO_RESPONSE",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }
}
