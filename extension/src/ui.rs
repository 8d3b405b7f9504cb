//! UI reflector: the log panel and the connect/send controls.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Connection state shown by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiState {
    /// Connect button visible, message controls hidden
    #[default]
    Disconnected,
    /// Connect button hidden, message controls visible
    Connected,
}

/// Which controls are visible in a given [`UiState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlVisibility {
    /// "Connect" button
    pub connect_button: bool,
    /// Message text input
    pub input_text: bool,
    /// "Send" button
    pub send_message_button: bool,
}

impl UiState {
    /// Control visibility for this state.
    pub fn controls(self) -> ControlVisibility {
        let connected = self == Self::Connected;
        ControlVisibility {
            connect_button: !connected,
            input_text: connected,
            send_message_button: connected,
        }
    }
}

/// Sink for human-readable activity lines and connection state.
pub trait UiReflector: Send + Sync {
    /// Append a line to the log.
    fn append_message(&self, text: &str);

    /// Switch between connected and disconnected controls.
    fn set_state(&self, state: UiState);
}

/// One line of the log panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// When the line was appended
    pub timestamp: DateTime<Utc>,
    /// Raw text
    pub text: String,
}

#[derive(Debug, Default)]
struct PanelState {
    entries: Vec<LogEntry>,
    state: UiState,
}

/// Append-only log panel.
///
/// Lines are stored as plain text and escaped when rendered, so text coming
/// from the native peer can never inject markup.
#[derive(Debug, Default)]
pub struct LogPanel {
    inner: Mutex<PanelState>,
}

impl LogPanel {
    /// Empty panel in the disconnected state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> UiState {
        self.inner.lock().state
    }

    /// Snapshot of all entries.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.inner.lock().entries.clone()
    }

    /// Snapshot of the entry texts.
    pub fn lines(&self) -> Vec<String> {
        self.inner.lock().entries.iter().map(|e| e.text.clone()).collect()
    }

    /// True if any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.inner.lock().entries.iter().any(|e| e.text.contains(needle))
    }

    /// Panel contents as `<p>` fragments.
    pub fn render_html(&self) -> String {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|e| format!("<p>{}</p>", escape_html(&e.text)))
            .collect()
    }
}

impl UiReflector for LogPanel {
    fn append_message(&self, text: &str) {
        tracing::info!(target: "flts_extension::ui", "{}", text);
        self.inner.lock().entries.push(LogEntry {
            timestamp: Utc::now(),
            text: text.to_string(),
        });
    }

    fn set_state(&self, state: UiState) {
        tracing::debug!(target: "flts_extension::ui", ?state, "UI state");
        self.inner.lock().state = state;
    }
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
