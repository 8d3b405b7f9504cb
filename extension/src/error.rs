//! Error types for the extension side.

use crate::browser::TabId;
use flts_native_messaging::ProtocolError;

/// Result type for extension operations.
pub type ExtensionResult<T> = Result<T, ExtensionError>;

/// Result type for browser platform calls.
pub type BrowserResult<T> = Result<T, BrowserError>;

/// Failures reported by the browser's tab APIs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrowserError {
    /// The tab id does not name an open tab
    #[error("No tab with id: {0}")]
    NoTab(TabId),

    /// Script injection was refused for the tab
    #[error("Cannot access contents of tab {tab_id}: {reason}")]
    ScriptRejected {
        /// Target tab
        tab_id: TabId,
        /// Platform-supplied reason
        reason: String,
    },
}

/// Errors raised while relaying commands.
#[derive(Debug, thiserror::Error)]
pub enum ExtensionError {
    /// `send` was called with no active connection
    #[error("Not connected to a native messaging host")]
    NotConnected,

    /// No executable is registered for the requested host name
    #[error("Specified native messaging host not found: {0}")]
    HostNotFound(String),

    /// The command's `data` did not match the handler's request shape
    #[error("Invalid request data: {0}")]
    InvalidData(String),

    /// A browser API call failed
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Framing or JSON failure on the port
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// I/O failure while talking to the host process
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExtensionError {
    /// Create an invalid-data error.
    pub fn invalid_data<S: Into<String>>(message: S) -> Self {
        Self::InvalidData(message.into())
    }

    /// Get the error code for this error type.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotConnected => "NOT_CONNECTED",
            Self::HostNotFound(_) => "HOST_NOT_FOUND",
            Self::InvalidData(_) => "INVALID_DATA",
            Self::Browser(_) => "BROWSER_ERROR",
            Self::Protocol(e) => e.error_code(),
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ExtensionError::NotConnected.error_code(), "NOT_CONNECTED");
        assert_eq!(ExtensionError::invalid_data("x").error_code(), "INVALID_DATA");
        assert_eq!(
            ExtensionError::from(BrowserError::NoTab(3)).error_code(),
            "BROWSER_ERROR"
        );
        assert_eq!(
            ExtensionError::from(ProtocolError::protocol("bad")).error_code(),
            "PROTOCOL_ERROR"
        );
    }

    #[test]
    fn test_browser_error_display() {
        let error = ExtensionError::from(BrowserError::NoTab(9));
        assert_eq!(error.to_string(), "Browser error: No tab with id: 9");
    }
}
