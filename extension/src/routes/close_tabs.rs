//! Close tabs by id.

use async_trait::async_trait;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::{
    browser::{Browser, TabId},
    error::ExtensionResult,
    route_trait::{CommandRoute, RouteMetadata, RouteReply},
};
use flts_native_messaging::{integral_value, RequestType};

/// Reply when at least one tab was closed.
pub const TABS_CLOSED: &str = "Tabs closed";

/// Reply when none of the requested ids is open.
pub const NO_MATCHING_TABS: &str = "No matching tabs to close";

/// `data` of a close command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseTabsRequest {
    /// Ids to close; ids that are no longer open are skipped
    #[serde(rename = "tabIds", deserialize_with = "deserialize_tab_ids")]
    pub tab_ids: Vec<TabId>,
}

/// Accepts `2` and `2.0` alike; anything else in the list rejects the request.
fn deserialize_tab_ids<'de, D>(deserializer: D) -> Result<Vec<TabId>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<Value>::deserialize(deserializer)?
        .iter()
        .map(|v| {
            integral_value(v).ok_or_else(|| D::Error::custom(format!("invalid tab id: {}", v)))
        })
        .collect()
}

/// Close-tabs handler.
pub struct CloseTabsRoute;

impl CloseTabsRoute {
    /// Requested ids that are currently open, in request order, without
    /// duplicates.
    pub async fn existing_tab_ids(
        browser: &dyn Browser,
        requested: &[TabId],
    ) -> ExtensionResult<Vec<TabId>> {
        let windows = browser.get_all_windows(true).await?;
        let open: HashSet<TabId> = windows
            .iter()
            .flat_map(|w| w.tabs.iter().map(|t| t.id))
            .collect();

        let mut seen = HashSet::new();
        Ok(requested
            .iter()
            .copied()
            .filter(|id| open.contains(id) && seen.insert(*id))
            .collect())
    }
}

#[async_trait]
impl CommandRoute for CloseTabsRoute {
    type Request = CloseTabsRequest;

    fn metadata() -> RouteMetadata {
        RouteMetadata {
            request_type: RequestType::CloseTabs,
            route_id: "close_tabs",
            description: "Close every requested tab that is still open",
        }
    }

    async fn handle(req: Self::Request, browser: &dyn Browser) -> ExtensionResult<RouteReply> {
        let valid = Self::existing_tab_ids(browser, &req.tab_ids).await?;

        if valid.is_empty() {
            tracing::debug!(requested = ?req.tab_ids, "None of the requested tabs is open");
            return Ok(RouteReply::error(NO_MATCHING_TABS));
        }

        if valid.len() < req.tab_ids.len() {
            tracing::debug!(
                requested = req.tab_ids.len(),
                closing = valid.len(),
                "Skipping tab ids that are not open"
            );
        }

        browser.remove_tabs(&valid).await?;
        tracing::info!(closed = ?valid, "Tabs closed");

        Ok(RouteReply::success(TABS_CLOSED))
    }
}
