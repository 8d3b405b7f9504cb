//! Rename the first tab whose title matches.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    browser::{title_script, Browser, TabQuery},
    error::ExtensionResult,
    route_trait::{CommandRoute, RouteMetadata, RouteReply},
};
use flts_native_messaging::RequestType;

/// Reply when the title was replaced.
pub const TAB_TITLE_REPLACED: &str = "Tab title replaced";

/// Reply when no tab carries `current_name`.
pub const TAB_NOT_FOUND: &str = "Tab not found";

/// `data` of a rename command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameTabRequest {
    /// Exact title to look for
    pub current_name: String,
    /// Title to set
    pub new_name: String,
}

/// Rename-tab handler.
///
/// Takes the first match in platform enumeration order. Replies with the
/// tab and window ids on success.
pub struct RenameTabRoute;

#[async_trait]
impl CommandRoute for RenameTabRoute {
    type Request = RenameTabRequest;

    fn metadata() -> RouteMetadata {
        RouteMetadata {
            request_type: RequestType::RenameTab,
            route_id: "rename_tab",
            description: "Set document.title of the first tab whose title matches current_name",
        }
    }

    async fn handle(req: Self::Request, browser: &dyn Browser) -> ExtensionResult<RouteReply> {
        let tabs = browser.query_tabs(TabQuery::title(req.current_name.as_str())).await?;

        let Some(tab) = tabs.into_iter().next() else {
            tracing::debug!(current_name = %req.current_name, "No tab with matching title");
            return Ok(RouteReply::error(TAB_NOT_FOUND));
        };

        if let Err(e) = browser.execute_script(tab.id, &title_script(&req.new_name)).await {
            tracing::warn!(tab_id = tab.id, error = %e, "Title script failed");
            return Ok(RouteReply::error(format!("Script execution failed: {}", e)));
        }

        tracing::info!(tab_id = tab.id, window_id = tab.window_id, "Tab renamed");

        Ok(RouteReply::success(TAB_TITLE_REPLACED)
            .with("tabId", tab.id)
            .with("windowId", tab.window_id))
    }
}
