//! End-to-end tests for the extension side over an in-process port.

use std::sync::Arc;
use std::time::Duration;

use flts_extension::{
    CommandDispatcher, InMemoryBrowser, LogPanel, MemoryPeer, MemoryPlatform, Session, UiState,
};
use flts_native_messaging::ResponseType;
use serde_json::{json, Value};
use tokio::sync::mpsc;

struct Harness {
    browser: Arc<InMemoryBrowser>,
    panel: Arc<LogPanel>,
    session: Session,
    peers: mpsc::UnboundedReceiver<MemoryPeer>,
}

impl Harness {
    fn new(titles: &[&str]) -> Self {
        let browser = Arc::new(InMemoryBrowser::new());
        for title in titles {
            browser.open_tab(1, title, None);
        }
        let dispatcher = Arc::new(CommandDispatcher::with_default_routes(browser.clone()));
        let panel = Arc::new(LogPanel::new());
        let (platform, peers) = MemoryPlatform::new();
        let session = Session::new(
            Arc::new(platform),
            "com.flts.chrome.bridge",
            dispatcher,
            panel.clone(),
        );
        Self {
            browser,
            panel,
            session,
            peers,
        }
    }

    async fn connect(&mut self) -> MemoryPeer {
        self.session.connect().await;
        self.peers.recv().await.expect("platform should hand out a peer")
    }
}

async fn next_response(peer: &mut MemoryPeer) -> Value {
    tokio::time::timeout(Duration::from_secs(5), peer.recv())
        .await
        .expect("response should arrive")
        .expect("port should stay open")
}

async fn assert_silent(peer: &mut MemoryPeer) {
    let result = tokio::time::timeout(Duration::from_millis(100), peer.recv()).await;
    assert!(result.is_err(), "expected no response, got {:?}", result);
}

#[tokio::test]
async fn test_missing_keys_produce_no_response() {
    let mut harness = Harness::new(&["Draft"]);
    let mut peer = harness.connect().await;

    for message in [
        json!({"data": {}, "requestId": 1}),
        json!({"type": 0, "requestId": 1}),
        json!({"type": 0, "data": {"current_name": "Draft", "new_name": "X"}}),
        json!(17),
        json!([{"type": 0}]),
    ] {
        assert!(peer.send(message));
    }

    assert_silent(&mut peer).await;
    assert_eq!(harness.browser.titles(), vec!["Draft".to_string()]);
}

#[tokio::test]
async fn test_unrecognised_type_is_error_with_same_request_id() {
    let mut harness = Harness::new(&[]);
    let mut peer = harness.connect().await;

    peer.send(json!({"type": 5, "data": {}, "requestId": "abc-5"}));
    let response = next_response(&mut peer).await;

    assert_eq!(response["type"], ResponseType::Error as u8);
    assert_eq!(response["requestId"], "abc-5");
    assert_eq!(response["source"], "chrome");
    assert_eq!(response["data"]["msg"], "Request type could not be determined");
}

#[tokio::test]
async fn test_rename_success_and_not_found() {
    let mut harness = Harness::new(&["Draft"]);
    let mut peer = harness.connect().await;

    peer.send(json!({
        "type": 0,
        "data": {"current_name": "Draft", "new_name": "Final"},
        "requestId": 1
    }));
    let response = next_response(&mut peer).await;
    assert_eq!(response["type"], 0);
    assert_eq!(response["data"]["msg"], "Tab title replaced");
    assert_eq!(response["data"]["tabId"], 1);
    assert_eq!(response["data"]["windowId"], 1);
    assert_eq!(harness.browser.titles(), vec!["Final".to_string()]);

    peer.send(json!({
        "type": 0,
        "data": {"current_name": "Ghost", "new_name": "X"},
        "requestId": 2
    }));
    let response = next_response(&mut peer).await;
    assert_eq!(response["type"], 1);
    assert_eq!(response["data"]["msg"], "Tab not found");
    assert_eq!(response["requestId"], 2);
}

#[tokio::test]
async fn test_close_partial_and_none() {
    let mut harness = Harness::new(&["one", "two", "three"]);
    let mut peer = harness.connect().await;

    peer.send(json!({"type": 1, "data": {"tabIds": [2, 5]}, "requestId": "c1"}));
    let response = next_response(&mut peer).await;
    assert_eq!(response["type"], 0);
    assert_eq!(response["data"], json!({"msg": "Tabs closed"}));
    assert_eq!(harness.browser.tab_ids(), vec![1, 3]);

    peer.send(json!({"type": 1, "data": {"tabIds": [7, 8]}, "requestId": "c2"}));
    let response = next_response(&mut peer).await;
    assert_eq!(response["type"], 1);
    assert_eq!(response["data"]["msg"], "No matching tabs to close");
    assert_eq!(harness.browser.tab_ids(), vec![1, 3]);
}

#[tokio::test]
async fn test_float_encoded_numbers_route_like_integers() {
    let mut harness = Harness::new(&["Draft", "Other"]);
    let mut peer = harness.connect().await;

    let rename =
        r#"{"type":0.0,"data":{"current_name":"Draft","new_name":"Final"},"requestId":1}"#;
    peer.send(serde_json::from_str(rename).unwrap());
    let response = next_response(&mut peer).await;
    assert_eq!(response["type"], 0);
    assert_eq!(response["data"]["msg"], "Tab title replaced");
    assert_eq!(
        harness.browser.titles(),
        vec!["Final".to_string(), "Other".to_string()]
    );

    let close = r#"{"type":1e0,"data":{"tabIds":[2.0]},"requestId":2}"#;
    peer.send(serde_json::from_str(close).unwrap());
    let response = next_response(&mut peer).await;
    assert_eq!(response["type"], 0);
    assert_eq!(response["data"]["msg"], "Tabs closed");
    assert_eq!(harness.browser.tab_ids(), vec![1]);
}

#[tokio::test]
async fn test_every_accepted_command_answered_once() {
    let mut harness = Harness::new(&["a", "b", "c"]);
    let mut peer = harness.connect().await;

    let ids = [
        json!("s"),
        json!(12),
        json!(null),
        json!({"nested": [1, "x"]}),
        json!(false),
    ];
    let commands = [
        json!({"current_name": "a", "new_name": "A"}),
        json!({"tabIds": [3]}),
        json!({}),
        json!({"current_name": "nope", "new_name": "A"}),
        json!({"tabIds": "not a list"}),
    ];
    for (i, (id, data)) in ids.iter().zip(commands.iter()).enumerate() {
        let command_type = if i % 2 == 0 { 0 } else { 1 };
        peer.send(json!({"type": command_type, "data": data, "requestId": id}));
    }

    let mut seen = Vec::new();
    for _ in 0..ids.len() {
        seen.push(next_response(&mut peer).await["requestId"].clone());
    }
    assert_silent(&mut peer).await;

    for id in &ids {
        assert_eq!(seen.iter().filter(|s| *s == id).count(), 1, "requestId {} answered once", id);
    }
}

#[tokio::test]
async fn test_concurrent_renames_both_resolve() {
    let mut harness = Harness::new(&["Same"]);
    let mut peer = harness.connect().await;

    for (new_name, id) in [("First", "r1"), ("Second", "r2")] {
        peer.send(json!({
            "type": 0,
            "data": {"current_name": "Same", "new_name": new_name},
            "requestId": id
        }));
    }

    let a = next_response(&mut peer).await;
    let b = next_response(&mut peer).await;
    let mut ids = vec![a["requestId"].clone(), b["requestId"].clone()];
    ids.sort_by_key(|v| v.to_string());
    assert_eq!(ids, vec![json!("r1"), json!("r2")]);

    // Whichever ran second may find no tab left with the old title.
    let successes = [&a, &b].iter().filter(|r| r["type"] == 0).count();
    assert!(successes >= 1);
}

#[tokio::test]
async fn test_disconnect_clears_connection_and_allows_reconnect() {
    let mut harness = Harness::new(&["Draft"]);
    let peer = harness.connect().await;
    assert_eq!(harness.panel.state(), UiState::Connected);

    peer.disconnect("Native host has exited.");
    tokio::time::timeout(Duration::from_secs(5), harness.session.wait_for_disconnect())
        .await
        .expect("session should notice the disconnect");

    assert!(!harness.session.is_connected());
    assert_eq!(harness.panel.state(), UiState::Disconnected);
    assert!(harness.panel.contains("Failed to connect: Native host has exited."));

    let mut peer = harness.connect().await;
    assert!(harness.session.is_connected());
    peer.send(json!({"type": 9, "data": {}, "requestId": "after"}));
    assert_eq!(next_response(&mut peer).await["requestId"], "after");
}

#[tokio::test]
async fn test_reconnect_ignores_stale_disconnect() {
    let mut harness = Harness::new(&[]);
    let old_peer = harness.connect().await;
    let mut new_peer = harness.connect().await;

    old_peer.disconnect("old port closed");
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(harness.session.is_connected());
    assert!(!harness.panel.contains("old port closed"));

    new_peer.send(json!({"type": 3, "data": {}, "requestId": 1}));
    assert_eq!(next_response(&mut new_peer).await["requestId"], 1);
}

#[tokio::test]
async fn test_panel_logs_inbound_and_outbound() {
    let mut harness = Harness::new(&[]);
    let mut peer = harness.connect().await;

    peer.send(json!("plain text status"));
    peer.send(json!({"type": 1, "data": {"tabIds": []}, "requestId": "log-1"}));
    next_response(&mut peer).await;

    // The outbound line is appended once the post completes.
    for _ in 0..50 {
        if harness.panel.contains("Sent message: ") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let lines = harness.panel.lines();
    assert!(lines.iter().any(|l| l == "plain text status"));
    assert!(lines.iter().any(|l| l.contains("\"requestId\":\"log-1\"") && !l.starts_with("Sent")));
    assert!(lines.iter().any(|l| l.starts_with("Sent message: ") && l.contains("log-1")));
}

#[tokio::test]
async fn test_concurrent_close_requests_all_succeed() {
    let mut harness = Harness::new(&["1", "2", "3", "4"]);
    let mut peer = harness.connect().await;

    for (i, id) in [1, 2, 3, 4].iter().enumerate() {
        peer.send(json!({"type": 1, "data": {"tabIds": [id]}, "requestId": i}));
    }

    let mut ok = 0;
    for _ in 0..4 {
        if next_response(&mut peer).await["type"] == 0 {
            ok += 1;
        }
    }
    assert_eq!(ok, 4);
    assert!(harness.browser.tab_ids().is_empty());
}
