//! In-process browser used by tests and the simulator binary.

use crate::browser::{parse_title_script, Browser, Tab, TabId, TabQuery, Window, WindowId};
use crate::error::{BrowserError, BrowserResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::Path;

/// URL schemes the platform refuses to inject scripts into.
const RESTRICTED_SCHEMES: &[&str] = &["chrome://", "chrome-extension://", "about:"];

/// Mutable window/tab model behind the [`Browser`] trait.
///
/// Scripts are not evaluated; only the title assignment produced by
/// [`crate::browser::title_script`] is understood.
#[derive(Debug, Default)]
pub struct InMemoryBrowser {
    windows: RwLock<Vec<Window>>,
}

impl InMemoryBrowser {
    /// Empty browser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Browser with the given windows; each tab's `window_id` is normalised
    /// to its containing window.
    pub fn with_windows(mut windows: Vec<Window>) -> Self {
        for window in &mut windows {
            for tab in &mut window.tabs {
                tab.window_id = window.id;
            }
        }
        Self {
            windows: RwLock::new(windows),
        }
    }

    /// Load a JSON fixture holding an array of windows.
    pub fn from_fixture_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let windows: Vec<Window> = serde_json::from_str(&content)?;
        Ok(Self::with_windows(windows))
    }

    /// Open a tab in `window_id`, creating the window if needed. Tab ids are
    /// allocated above every id seen so far.
    pub fn open_tab(&self, window_id: WindowId, title: &str, url: Option<&str>) -> Tab {
        let mut windows = self.windows.write();
        let id = windows
            .iter()
            .flat_map(|w| w.tabs.iter().map(|t| t.id))
            .max()
            .unwrap_or(0)
            + 1;
        let tab = Tab {
            id,
            window_id,
            title: title.to_string(),
            url: url.map(str::to_string),
        };

        match windows.iter_mut().find(|w| w.id == window_id) {
            Some(window) => window.tabs.push(tab.clone()),
            None => windows.push(Window {
                id: window_id,
                tabs: vec![tab.clone()],
            }),
        }
        tab
    }

    /// Current snapshot of one tab.
    pub fn tab(&self, tab_id: TabId) -> Option<Tab> {
        self.windows
            .read()
            .iter()
            .flat_map(|w| w.tabs.iter())
            .find(|t| t.id == tab_id)
            .cloned()
    }

    /// Ids of every open tab, in enumeration order.
    pub fn tab_ids(&self) -> Vec<TabId> {
        self.windows
            .read()
            .iter()
            .flat_map(|w| w.tabs.iter().map(|t| t.id))
            .collect()
    }

    /// Titles of every open tab, in enumeration order.
    pub fn titles(&self) -> Vec<String> {
        self.windows
            .read()
            .iter()
            .flat_map(|w| w.tabs.iter().map(|t| t.title.clone()))
            .collect()
    }
}

#[async_trait]
impl Browser for InMemoryBrowser {
    async fn query_tabs(&self, query: TabQuery) -> BrowserResult<Vec<Tab>> {
        Ok(self
            .windows
            .read()
            .iter()
            .flat_map(|w| w.tabs.iter())
            .filter(|t| query.matches(t))
            .cloned()
            .collect())
    }

    async fn execute_script(&self, tab_id: TabId, code: &str) -> BrowserResult<()> {
        let mut windows = self.windows.write();
        let tab = windows
            .iter_mut()
            .flat_map(|w| w.tabs.iter_mut())
            .find(|t| t.id == tab_id)
            .ok_or(BrowserError::NoTab(tab_id))?;

        if let Some(url) = tab.url.as_deref() {
            if RESTRICTED_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
                return Err(BrowserError::ScriptRejected {
                    tab_id,
                    reason: format!("cannot inject into {}", url),
                });
            }
        }

        let title = parse_title_script(code).ok_or_else(|| BrowserError::ScriptRejected {
            tab_id,
            reason: "unsupported script".to_string(),
        })?;
        tab.title = title;
        Ok(())
    }

    async fn get_all_windows(&self, populate: bool) -> BrowserResult<Vec<Window>> {
        let windows = self.windows.read();
        Ok(windows
            .iter()
            .map(|w| Window {
                id: w.id,
                tabs: if populate { w.tabs.clone() } else { Vec::new() },
            })
            .collect())
    }

    async fn remove_tabs(&self, tab_ids: &[TabId]) -> BrowserResult<()> {
        let mut windows = self.windows.write();
        let open: HashSet<TabId> = windows
            .iter()
            .flat_map(|w| w.tabs.iter().map(|t| t.id))
            .collect();
        if let Some(missing) = tab_ids.iter().find(|id| !open.contains(id)) {
            return Err(BrowserError::NoTab(*missing));
        }

        let doomed: HashSet<TabId> = tab_ids.iter().copied().collect();
        for window in windows.iter_mut() {
            window.tabs.retain(|t| !doomed.contains(&t.id));
        }
        // Closing the last tab closes the window.
        windows.retain(|w| !w.tabs.is_empty());
        Ok(())
    }
}
