//! Browser tab platform.
//!
//! The handlers never cache tab state; every command re-queries the live tab
//! set through this trait. Real browsers implement it over their extension
//! APIs; [`crate::InMemoryBrowser`] implements it for tests and for the
//! simulator binary.

use crate::error::BrowserResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Platform-assigned tab identifier.
pub type TabId = i64;

/// Platform-assigned window identifier.
pub type WindowId = i64;

/// Snapshot of one open tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    /// Tab id
    pub id: TabId,
    /// Owning window
    #[serde(default)]
    pub window_id: WindowId,
    /// Current document title
    pub title: String,
    /// Current URL, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Snapshot of one browser window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// Window id
    pub id: WindowId,
    /// Tabs in strip order; empty unless the query asked for them
    #[serde(default)]
    pub tabs: Vec<Tab>,
}

/// Filter for [`Browser::query_tabs`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabQuery {
    /// Exact title match
    pub title: Option<String>,
    /// Restrict to one window
    pub window_id: Option<WindowId>,
}

impl TabQuery {
    /// Query for tabs whose title equals `title` exactly.
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            window_id: None,
        }
    }

    /// True when `tab` satisfies every set field.
    pub fn matches(&self, tab: &Tab) -> bool {
        self.title.as_deref().map_or(true, |t| t == tab.title)
            && self.window_id.map_or(true, |w| w == tab.window_id)
    }
}

/// Asynchronous tab APIs used by the command handlers.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Tabs matching `query`, in platform enumeration order.
    async fn query_tabs(&self, query: TabQuery) -> BrowserResult<Vec<Tab>>;

    /// Run `code` in the context of the tab's document.
    async fn execute_script(&self, tab_id: TabId, code: &str) -> BrowserResult<()>;

    /// All windows; tabs are included only when `populate` is set.
    async fn get_all_windows(&self, populate: bool) -> BrowserResult<Vec<Window>>;

    /// Close exactly the given tabs.
    async fn remove_tabs(&self, tab_ids: &[TabId]) -> BrowserResult<()>;
}

const TITLE_SCRIPT_PREFIX: &str = "document.title = ";

/// Script that sets `document.title`.
///
/// The title is embedded as a JSON string literal, which is also a valid
/// JavaScript string literal, so quotes and backslashes in `title` cannot
/// break out of the assignment.
pub fn title_script(title: &str) -> String {
    let literal = serde_json::Value::from(title).to_string();
    format!("{}{};", TITLE_SCRIPT_PREFIX, literal)
}

/// Inverse of [`title_script`]; `None` for any other script.
pub fn parse_title_script(code: &str) -> Option<String> {
    let literal = code.strip_prefix(TITLE_SCRIPT_PREFIX)?.strip_suffix(';')?;
    serde_json::from_str(literal).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(id: TabId, window_id: WindowId, title: &str) -> Tab {
        Tab {
            id,
            window_id,
            title: title.to_string(),
            url: None,
        }
    }

    #[test]
    fn test_query_matching() {
        let draft = tab(1, 10, "Draft");
        assert!(TabQuery::default().matches(&draft));
        assert!(TabQuery::title("Draft").matches(&draft));
        assert!(!TabQuery::title("draft").matches(&draft));
        assert!(!TabQuery {
            title: None,
            window_id: Some(11),
        }
        .matches(&draft));
    }

    #[test]
    fn test_title_script_escapes_quotes() {
        let script = title_script("it's a \"test\"\\");
        assert_eq!(script, r#"document.title = "it's a \"test\"\\";"#);
        assert_eq!(parse_title_script(&script).as_deref(), Some("it's a \"test\"\\"));
    }

    #[test]
    fn test_title_script_injection_stays_literal() {
        let hostile = "x'; alert(1); '";
        let script = title_script(hostile);
        assert_eq!(parse_title_script(&script).as_deref(), Some(hostile));
    }

    #[test]
    fn test_parse_rejects_other_scripts() {
        assert_eq!(parse_title_script("alert(1);"), None);
        assert_eq!(parse_title_script("document.title = 'x';"), None);
    }

    #[test]
    fn test_tab_wire_shape() {
        let value = serde_json::to_value(tab(4, 2, "Inbox")).unwrap();
        assert_eq!(value["windowId"], 2);
        assert!(value.get("url").is_none());
    }
}
