//! Command route trait.
//!
//! Every command the extension understands is a type implementing
//! [`CommandRoute`]. The dispatcher decodes `data` into the route's request
//! type, calls [`CommandRoute::handle`] and turns the [`RouteReply`] into the
//! single response for the command.

use crate::browser::Browser;
use crate::error::ExtensionResult;
use async_trait::async_trait;
use flts_native_messaging::{RequestType, ResponseMessage, ResponseType};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt::Debug;

/// Static description of a route.
#[derive(Debug, Clone)]
pub struct RouteMetadata {
    /// Wire `type` the route answers
    pub request_type: RequestType,

    /// Short identifier used in logs
    pub route_id: &'static str,

    /// Human-readable description
    pub description: &'static str,
}

/// Outcome of a route, before the `requestId` is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteReply {
    /// SUCCESS or ERROR
    pub response_type: ResponseType,
    /// `data.msg`
    pub msg: String,
    /// Extra `data` fields next to `msg`
    pub extra: Map<String, Value>,
}

impl RouteReply {
    /// SUCCESS carrying `msg`.
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Success,
            msg: msg.into(),
            extra: Map::new(),
        }
    }

    /// ERROR carrying `msg`.
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Error,
            msg: msg.into(),
            extra: Map::new(),
        }
    }

    /// Add a `data` field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// Attach the request id and build the wire response.
    pub fn into_response(self, request_id: Value) -> ResponseMessage {
        let mut data = self.extra;
        data.insert("msg".to_string(), Value::from(self.msg));
        ResponseMessage::new(self.response_type, Value::Object(data), request_id)
    }
}

/// A command handler.
///
/// `handle` must resolve to exactly one reply. Domain failures (nothing to
/// act on) are `Ok(RouteReply::error(..))`; platform failures may be returned
/// as `Err` and are turned into an ERROR reply by the dispatcher.
#[async_trait]
pub trait CommandRoute: Send + Sync + 'static {
    /// Shape of the command's `data`
    type Request: DeserializeOwned + Debug + Send;

    /// Route metadata.
    fn metadata() -> RouteMetadata;

    /// Carry out the command against the live browser state.
    async fn handle(req: Self::Request, browser: &dyn Browser) -> ExtensionResult<RouteReply>;
}
