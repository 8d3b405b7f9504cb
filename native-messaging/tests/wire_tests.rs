//! Wire-level tests: frames over a pipe and the message shapes both ends use.

use flts_native_messaging::{
    config::{load_config_file, save_config_file},
    correlation_key, BridgeRequest, InboundMessage, NativeMessagingConfig,
    NativeMessagingProtocol, RequestType, ResponseMessage, ResponseType,
};
use serde_json::{json, Map, Value};
use tempfile::TempDir;

#[tokio::test]
async fn test_request_and_response_over_pipe() {
    let protocol = NativeMessagingProtocol::default();
    let (mut host_end, mut browser_end) = tokio::io::duplex(4096);

    let request = BridgeRequest::new(
        RequestType::RenameTab,
        json!({"current_name": "Draft", "new_name": "Final"}),
    );
    protocol.write_message(&mut host_end, &request).await.unwrap();

    let inbound = protocol.read_message(&mut browser_end).await.unwrap().unwrap();
    let InboundMessage::Command(command) = InboundMessage::decode(inbound) else {
        panic!("bridge request should decode as a command");
    };
    assert_eq!(command.request_type(), Some(RequestType::RenameTab));
    assert_eq!(command.request_id, request.request_id);

    let mut extra = Map::new();
    extra.insert("tabId".to_string(), json!(4));
    let response = ResponseMessage::success("Tab title replaced", extra, command.request_id);
    protocol.write_message(&mut browser_end, &response).await.unwrap();

    let answer = protocol.read_message(&mut host_end).await.unwrap().unwrap();
    assert_eq!(correlation_key(&answer["requestId"]), correlation_key(&request.request_id));

    let answer: ResponseMessage = serde_json::from_value(answer).unwrap();
    assert!(answer.is_successful());
    assert_eq!(answer.msg(), Some("Tab title replaced"));
    assert_eq!(answer.data["tabId"], 4);
}

#[tokio::test]
async fn test_peer_going_away_ends_stream() {
    let protocol = NativeMessagingProtocol::default();
    let (mut host_end, browser_end) = tokio::io::duplex(64);
    drop(browser_end);

    assert!(protocol.read_message(&mut host_end).await.unwrap().is_none());
}

#[test]
fn test_response_type_tolerates_unknown_codes() {
    let response: ResponseMessage =
        serde_json::from_value(json!({"type": 9, "data": {"msg": "?"}, "requestId": 1})).unwrap();
    assert_eq!(response.response_type, ResponseType::Unknown);
    assert!(!response.is_successful());

    let response: ResponseMessage = serde_json::from_value(json!({"data": {}})).unwrap();
    assert_eq!(response.response_type, ResponseType::Unknown);
    assert_eq!(response.request_id, Value::Null);
}

#[test]
fn test_config_save_and_load() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = NativeMessagingConfig {
        max_message_size: 2048,
        enable_logging: false,
    };

    for name in ["pipe.toml", "pipe.json"] {
        let path = dir.path().join(name);
        save_config_file(&config, &path)?;
        let loaded: NativeMessagingConfig = load_config_file(&path)?;
        assert_eq!(loaded, config);
    }
    Ok(())
}
