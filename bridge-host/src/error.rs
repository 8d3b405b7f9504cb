//! Error types for the bridge host.

use flts_native_messaging::ProtocolError;

/// Result type for bridge host operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors raised by the bridge host.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Unusable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The listener could not be bound
    #[error("Failed to bind {address}: {source}")]
    Bind {
        /// Address the host tried to listen on
        address: String,
        /// Underlying socket error
        source: std::io::Error,
    },

    /// Client request exceeded the configured size
    #[error("Request of {length} bytes exceeds maximum size {max}")]
    RequestTooLarge {
        /// Bytes received so far
        length: usize,
        /// Configured upper bound
        max: usize,
    },

    /// Client request was not a usable bridge request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Framing errors on stdin/stdout
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Socket I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors on the TCP side
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BridgeError {
    /// Create a configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Get the error code for this error type.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Bind { .. } => "BIND_ERROR",
            Self::RequestTooLarge { .. } => "REQUEST_TOO_LARGE",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Protocol(e) => e.error_code(),
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }
}
