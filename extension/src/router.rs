//! Command routing and dispatch.
//!
//! Routes are registered by their wire `type`. [`CommandDispatcher::dispatch`]
//! always produces exactly one [`ResponseMessage`] for an accepted command,
//! whatever happens inside the route.

use crate::{
    browser::Browser,
    error::{ExtensionError, ExtensionResult},
    route_trait::{CommandRoute, RouteMetadata, RouteReply},
};
use async_trait::async_trait;
use flts_native_messaging::{CommandMessage, RequestType, ResponseMessage};
use std::{collections::HashMap, sync::Arc};

/// Reply for a command whose `type` has no route.
pub const UNKNOWN_REQUEST_TYPE: &str = "Request type could not be determined";

/// Type-erased route so different request types share one table.
#[async_trait]
pub trait RouteDispatcher: Send + Sync {
    /// Decode `data` and run the route.
    async fn dispatch(
        &self,
        data: serde_json::Value,
        browser: &dyn Browser,
    ) -> ExtensionResult<RouteReply>;

    /// Get route metadata.
    fn metadata(&self) -> RouteMetadata;
}

/// Concrete route dispatcher implementation.
pub struct ConcreteRouteDispatcher<R: CommandRoute> {
    _phantom: std::marker::PhantomData<R>,
}

impl<R: CommandRoute> ConcreteRouteDispatcher<R> {
    /// Dispatcher for route `R`.
    pub fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<R: CommandRoute> Default for ConcreteRouteDispatcher<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: CommandRoute> RouteDispatcher for ConcreteRouteDispatcher<R> {
    async fn dispatch(
        &self,
        data: serde_json::Value,
        browser: &dyn Browser,
    ) -> ExtensionResult<RouteReply> {
        let request: R::Request =
            serde_json::from_value(data).map_err(|e| ExtensionError::invalid_data(e.to_string()))?;

        tracing::debug!(
            route = R::metadata().route_id,
            request = ?request,
            "Dispatching to route handler"
        );

        R::handle(request, browser).await
    }

    fn metadata(&self) -> RouteMetadata {
        R::metadata()
    }
}

/// Routes accepted commands to their handlers.
pub struct CommandDispatcher {
    routes: HashMap<RequestType, Box<dyn RouteDispatcher>>,
    browser: Arc<dyn Browser>,
}

impl CommandDispatcher {
    /// Dispatcher with no routes.
    pub fn new(browser: Arc<dyn Browser>) -> Self {
        Self {
            routes: HashMap::new(),
            browser,
        }
    }

    /// Dispatcher with every built-in route.
    pub fn with_default_routes(browser: Arc<dyn Browser>) -> Self {
        let mut dispatcher = Self::new(browser);
        dispatcher.register_all_routes();
        dispatcher
    }

    /// Register a route handler.
    pub fn register_route<R: CommandRoute>(&mut self) {
        let metadata = R::metadata();

        tracing::debug!(
            route_id = metadata.route_id,
            request_type = metadata.request_type.code(),
            "Registering route handler"
        );

        self.routes
            .insert(metadata.request_type, Box::new(ConcreteRouteDispatcher::<R>::new()));
    }

    /// Register all built-in routes.
    pub fn register_all_routes(&mut self) {
        self.register_route::<crate::routes::rename_tab::RenameTabRoute>();
        self.register_route::<crate::routes::close_tabs::CloseTabsRoute>();
    }

    /// True when `command` names a registered route.
    pub fn can_route(&self, command: &CommandMessage) -> bool {
        command
            .request_type()
            .map_or(false, |t| self.routes.contains_key(&t))
    }

    /// Run `command` and build its single response.
    pub async fn dispatch(&self, command: CommandMessage) -> ResponseMessage {
        let CommandMessage {
            command_type,
            data,
            request_id,
        } = command;

        let route = RequestType::from_value(&command_type).and_then(|t| self.routes.get(&t));
        let dispatcher = match route {
            Some(d) => d,
            None => {
                tracing::warn!(
                    request_id = %request_id,
                    command_type = %command_type,
                    "Request type could not be determined"
                );
                return ResponseMessage::error(UNKNOWN_REQUEST_TYPE, request_id);
            }
        };

        let route = dispatcher.metadata().route_id;
        tracing::info!(request_id = %request_id, route, "Processing command");

        let reply = match dispatcher.dispatch(data, self.browser.as_ref()).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    request_id = %request_id,
                    route,
                    error = %e,
                    code = e.error_code(),
                    "Command failed"
                );
                RouteReply::error(e.to_string())
            }
        };

        tracing::info!(
            request_id = %request_id,
            route,
            response_type = ?reply.response_type,
            "Command completed"
        );

        reply.into_response(request_id)
    }

    /// Metadata of every registered route, ordered by wire `type`.
    pub fn get_routes(&self) -> Vec<RouteMetadata> {
        let mut routes: Vec<_> = self.routes.values().map(|d| d.metadata()).collect();
        routes.sort_by_key(|m| m.request_type.code());
        routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_browser::InMemoryBrowser;
    use flts_native_messaging::ResponseType;
    use serde_json::json;

    fn dispatcher() -> (Arc<InMemoryBrowser>, CommandDispatcher) {
        let browser = Arc::new(InMemoryBrowser::new());
        browser.open_tab(1, "Draft", None);
        let dispatcher = CommandDispatcher::with_default_routes(browser.clone());
        (browser, dispatcher)
    }

    #[test]
    fn test_router_creation() {
        let router = CommandDispatcher::new(Arc::new(InMemoryBrowser::new()));
        assert!(router.get_routes().is_empty());
    }

    #[test]
    fn test_all_routes_registration() {
        let (_, router) = dispatcher();
        let routes = router.get_routes();
        let types: Vec<_> = routes.iter().map(|m| m.request_type).collect();
        assert_eq!(types, vec![RequestType::RenameTab, RequestType::CloseTabs]);
        assert!(routes.iter().all(|m| !m.description.is_empty()));
        assert_eq!(routes[0].route_id, "rename_tab");
    }

    #[tokio::test]
    async fn test_unknown_type_is_error() {
        let (_, router) = dispatcher();
        for command_type in [json!(2), json!(99), json!("0"), json!(null)] {
            let command = CommandMessage {
                command_type,
                data: json!({}),
                request_id: json!("req-x"),
            };
            assert!(!router.can_route(&command));

            let response = router.dispatch(command).await;
            assert_eq!(response.response_type, ResponseType::Error);
            assert_eq!(response.msg(), Some(UNKNOWN_REQUEST_TYPE));
            assert_eq!(response.request_id, json!("req-x"));
        }
    }

    #[tokio::test]
    async fn test_invalid_data_still_answers() {
        let (_, router) = dispatcher();
        let command = CommandMessage::new(RequestType::RenameTab, json!({"current_name": 5}), 11);

        let response = router.dispatch(command).await;
        assert_eq!(response.response_type, ResponseType::Error);
        assert!(response.msg().unwrap().starts_with("Invalid request data"));
        assert_eq!(response.request_id, json!(11));
    }

    #[tokio::test]
    async fn test_rename_dispatch() {
        let (browser, router) = dispatcher();
        let command = CommandMessage::new(
            RequestType::RenameTab,
            json!({"current_name": "Draft", "new_name": "Final"}),
            json!({"opaque": [1, 2]}),
        );

        let response = router.dispatch(command).await;
        assert!(response.is_successful());
        assert_eq!(response.request_id, json!({"opaque": [1, 2]}));
        assert_eq!(browser.titles(), vec!["Final".to_string()]);
    }
}
