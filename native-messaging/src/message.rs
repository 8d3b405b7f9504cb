//! Messages exchanged across the bridge.
//!
//! Commands travel `FLTS -> bridge host -> extension` and responses travel
//! back the same way. The extension never interprets `requestId`; it is carried
//! as a raw JSON value and echoed untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `source` stamped on every response produced by the extension.
pub const SOURCE_CHROME: &str = "chrome";

/// `source` stamped on every request produced by the FLTS client.
pub const SOURCE_FLTS: &str = "flts";

/// Native messaging host name the extension connects to.
pub const DEFAULT_HOST_NAME: &str = "com.flts.chrome.bridge";

/// Operation requested by a command message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    /// Rename the first tab whose title matches
    RenameTab = 0,
    /// Close a set of tabs by id
    CloseTabs = 1,
    /// Stop the bridge host (never forwarded to the browser)
    Exit = 2,
}

impl RequestType {
    /// Numeric wire value.
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Map a wire value to a request type.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::RenameTab),
            1 => Some(Self::CloseTabs),
            2 => Some(Self::Exit),
            _ => None,
        }
    }

    /// Map a raw JSON `type` field to a request type. Any number equal to a
    /// known code matches, so `0`, `0.0` and `1e0` all route.
    pub fn from_value(value: &Value) -> Option<Self> {
        integral_value(value).and_then(Self::from_code)
    }
}

/// Outcome reported in a response message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum ResponseType {
    /// Command carried out
    Success = 0,
    /// Command rejected or failed
    Error = 1,
    /// No verdict (also the value for anything unrecognised on the wire)
    #[default]
    Unknown = 2,
}

impl From<ResponseType> for u8 {
    fn from(value: ResponseType) -> Self {
        value as u8
    }
}

impl From<u8> for ResponseType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Success,
            1 => Self::Error,
            _ => Self::Unknown,
        }
    }
}

/// A command that passed the presence checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMessage {
    /// Raw `type` field; see [`CommandMessage::request_type`]
    #[serde(rename = "type")]
    pub command_type: Value,

    /// Command-specific payload, not validated until a handler decodes it
    pub data: Value,

    /// Opaque correlation token
    #[serde(rename = "requestId")]
    pub request_id: Value,
}

impl CommandMessage {
    /// Build a command for a known request type.
    pub fn new(request_type: RequestType, data: Value, request_id: impl Into<Value>) -> Self {
        Self {
            command_type: Value::from(request_type.code()),
            data,
            request_id: request_id.into(),
        }
    }

    /// The request type, if `type` is one of the known integers.
    pub fn request_type(&self) -> Option<RequestType> {
        RequestType::from_value(&self.command_type)
    }
}

/// Why an inbound payload was dropped without a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    /// Payload was neither a string nor an object
    NotAnObject,
    /// Object lacked one of the required keys
    MissingField(&'static str),
}

/// Result of decoding a raw inbound payload.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Plain text; logged and otherwise ignored
    Text(String),
    /// Object carrying `type`, `data` and `requestId`
    Command(CommandMessage),
    /// Anything else; dropped without a response
    Ignored(IgnoredReason),
}

impl InboundMessage {
    /// Decode a raw payload. Fails closed: anything that is not a string or
    /// a complete command object becomes [`InboundMessage::Ignored`].
    pub fn decode(value: Value) -> Self {
        let mut object = match value {
            Value::String(text) => return Self::Text(text),
            Value::Object(object) => object,
            _ => return Self::Ignored(IgnoredReason::NotAnObject),
        };

        for field in ["type", "data", "requestId"] {
            if !object.contains_key(field) {
                return Self::Ignored(IgnoredReason::MissingField(field));
            }
        }

        Self::Command(CommandMessage {
            command_type: object.remove("type").unwrap_or(Value::Null),
            data: object.remove("data").unwrap_or(Value::Null),
            request_id: object.remove("requestId").unwrap_or(Value::Null),
        })
    }
}

/// Response sent back for an accepted command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Outcome
    #[serde(rename = "type", default)]
    pub response_type: ResponseType,

    /// Always an object with at least a `msg` string
    #[serde(default)]
    pub data: Value,

    /// Producer of the response
    #[serde(default)]
    pub source: String,

    /// Echo of the command's `requestId`
    #[serde(rename = "requestId", default)]
    pub request_id: Value,
}

impl ResponseMessage {
    /// Build a response stamped with [`SOURCE_CHROME`].
    pub fn new(response_type: ResponseType, data: Value, request_id: Value) -> Self {
        Self {
            response_type,
            data,
            source: SOURCE_CHROME.to_string(),
            request_id,
        }
    }

    /// SUCCESS with `msg` plus any extra fields.
    pub fn success(msg: &str, extra: Map<String, Value>, request_id: Value) -> Self {
        let mut data = extra;
        data.insert("msg".to_string(), Value::from(msg));
        Self::new(ResponseType::Success, Value::Object(data), request_id)
    }

    /// ERROR carrying only `msg`.
    pub fn error(msg: &str, request_id: Value) -> Self {
        let mut data = Map::new();
        data.insert("msg".to_string(), Value::from(msg));
        Self::new(ResponseType::Error, Value::Object(data), request_id)
    }

    /// `data.msg`, when present.
    pub fn msg(&self) -> Option<&str> {
        self.data.get("msg").and_then(Value::as_str)
    }

    /// True only for [`ResponseType::Success`].
    pub fn is_successful(&self) -> bool {
        self.response_type == ResponseType::Success
    }
}

/// Request sent by the FLTS client to the bridge host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeRequest {
    /// Raw request type; unknown values are still forwarded
    #[serde(rename = "type")]
    pub request_type: i64,

    /// Command payload
    #[serde(default)]
    pub data: Value,

    /// Producer of the request, `flts` for well-formed clients
    #[serde(default)]
    pub source: String,

    /// Correlation token, a UUID for requests built by [`BridgeRequest::new`]
    #[serde(rename = "requestId", default)]
    pub request_id: Value,
}

impl BridgeRequest {
    /// Build a request with a fresh UUID v4 id.
    pub fn new(request_type: RequestType, data: Value) -> Self {
        Self {
            request_type: request_type.code(),
            data,
            source: SOURCE_FLTS.to_string(),
            request_id: Value::from(uuid::Uuid::new_v4().to_string()),
        }
    }

    /// True for the host-handled EXIT request.
    pub fn is_exit(&self) -> bool {
        RequestType::from_code(self.request_type) == Some(RequestType::Exit)
    }

    /// True when the request claims to come from the FLTS client.
    pub fn is_from_flts(&self) -> bool {
        self.source == SOURCE_FLTS
    }
}

/// The integer a JSON number stands for, if it has no fractional part.
///
/// serde_json keeps `2` and `2.0` apart; senders that only have one number
/// type emit either form for the same value.
pub fn integral_value(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Lookup key for a `requestId` value.
///
/// Strings map to themselves; every other JSON value maps to its compact
/// serialization so that `1` and `"1"` stay distinct.
pub fn correlation_key(request_id: &Value) -> String {
    match request_id {
        Value::String(s) => s.clone(),
        other => format!("#{}", other),
    }
}
