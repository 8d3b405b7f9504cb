//! Request builders.
//!
//! Every builder stamps a fresh UUID v4 `requestId` and `source = "flts"`.

use flts_native_messaging::{BridgeRequest, RequestType};
use serde_json::json;

/// Rename the first tab titled `current_name` to `new_name`.
pub fn rename_tab(current_name: &str, new_name: &str) -> BridgeRequest {
    BridgeRequest::new(
        RequestType::RenameTab,
        json!({"current_name": current_name, "new_name": new_name}),
    )
}

/// Close the listed tabs; ids that are no longer open are skipped.
pub fn close_tabs(tab_ids: &[i64]) -> BridgeRequest {
    BridgeRequest::new(RequestType::CloseTabs, json!({ "tabIds": tab_ids }))
}

/// Ask the bridge host to shut down.
pub fn exit() -> BridgeRequest {
    BridgeRequest::new(RequestType::Exit, json!({}))
}
