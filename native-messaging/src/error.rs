//! Error types for the native messaging wire layer.
//!
//! Both the extension side and the bridge host build their own error enums on
//! top of [`ProtocolError`], so framing and JSON failures are reported the
//! same way on either end of the pipe.

/// Result type for wire-level operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while framing, reading or writing native messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Malformed frame (bad length header, truncated payload, invalid UTF-8)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Frame length outside the accepted range
    #[error("Message length {length} exceeds maximum size {max}")]
    MessageTooLarge {
        /// Length announced by the header (or produced by the encoder)
        length: usize,
        /// Configured upper bound
        max: usize,
    },

    /// I/O errors on the underlying pipe or socket
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProtocolError {
    /// Create a protocol error.
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol(message.into())
    }

    /// Get the error code for this error type.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Protocol(_) => "PROTOCOL_ERROR",
            Self::MessageTooLarge { .. } => "MESSAGE_TOO_LARGE",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    /// True when the peer closed the pipe in the middle of a frame.
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ProtocolError::protocol("test").error_code(), "PROTOCOL_ERROR");
        assert_eq!(
            ProtocolError::MessageTooLarge { length: 10, max: 5 }.error_code(),
            "MESSAGE_TOO_LARGE"
        );
    }

    #[test]
    fn test_too_large_message() {
        let error = ProtocolError::MessageTooLarge {
            length: 2_000_000,
            max: 1_048_576,
        };
        assert_eq!(
            error.to_string(),
            "Message length 2000000 exceeds maximum size 1048576"
        );
    }

    #[test]
    fn test_disconnect_classification() {
        let eof = ProtocolError::from(std::io::Error::from(std::io::ErrorKind::UnexpectedEof));
        assert!(eof.is_disconnect());

        let other = ProtocolError::from(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(!other.is_disconnect());
        assert!(!ProtocolError::protocol("bad").is_disconnect());
    }
}
