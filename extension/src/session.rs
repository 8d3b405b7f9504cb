//! Connection session.
//!
//! A [`Session`] owns the single connection slot. It opens the port, pumps
//! inbound messages through the [`CommandDispatcher`], sends each response
//! back and mirrors everything into the [`UiReflector`].

use crate::error::{ExtensionError, ExtensionResult};
use crate::router::CommandDispatcher;
use crate::transport::{NativePlatform, Port, PortEvent, HOST_EXITED};
use crate::ui::{UiReflector, UiState};
use flts_native_messaging::{InboundMessage, ResponseMessage};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Local log line for commands with no route.
const UNKNOWN_TYPE_NOTE: &str = "Request type could not be determined.";

struct ActiveConnection {
    generation: u64,
    port: Arc<dyn Port>,
}

struct SessionInner {
    platform: Arc<dyn NativePlatform>,
    host_name: String,
    dispatcher: Arc<CommandDispatcher>,
    ui: Arc<dyn UiReflector>,
    connection: Mutex<Option<ActiveConnection>>,
    generation: AtomicU64,
    connected: watch::Sender<bool>,
}

/// Extension-side session with at most one native connection.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// New, disconnected session.
    pub fn new(
        platform: Arc<dyn NativePlatform>,
        host_name: impl Into<String>,
        dispatcher: Arc<CommandDispatcher>,
        ui: Arc<dyn UiReflector>,
    ) -> Self {
        ui.set_state(UiState::Disconnected);
        let (connected, _) = watch::channel(false);
        Self {
            inner: Arc::new(SessionInner {
                platform,
                host_name: host_name.into(),
                dispatcher,
                ui,
                connection: Mutex::new(None),
                generation: AtomicU64::new(0),
                connected,
            }),
        }
    }

    /// Host name this session connects to.
    pub fn host_name(&self) -> &str {
        &self.inner.host_name
    }

    /// True while a connection is held.
    pub fn is_connected(&self) -> bool {
        self.inner.connection.lock().is_some()
    }

    /// Open the port, replacing any existing connection.
    ///
    /// The UI switches to connected immediately; a failed attempt is reported
    /// the same way as a later disconnect.
    pub async fn connect(&self) {
        let inner = &self.inner;
        inner.ui.append_message(&format!(
            "Connecting to native messaging host {}",
            inner.host_name
        ));

        let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if inner.connection.lock().take().is_some() {
            tracing::debug!(generation, "Replacing existing connection");
        }
        inner.ui.set_state(UiState::Connected);

        match inner.platform.connect_native(&inner.host_name).await {
            Ok(conn) => {
                *inner.connection.lock() = Some(ActiveConnection {
                    generation,
                    port: conn.port,
                });
                inner.connected.send_replace(true);
                tracing::info!(host = %inner.host_name, generation, "Connected to native host");

                let session = self.clone();
                tokio::spawn(session.pump(generation, conn.events));
            }
            Err(e) => {
                tracing::warn!(host = %inner.host_name, error = %e, "Connection attempt failed");
                self.on_disconnected(generation, &e.to_string());
            }
        }
    }

    /// Wait until the session holds no connection.
    pub async fn wait_for_disconnect(&self) {
        let mut rx = self.inner.connected.subscribe();
        let _ = rx.wait_for(|connected| !*connected).await;
    }

    async fn pump(self, generation: u64, mut events: mpsc::UnboundedReceiver<PortEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                PortEvent::Message(message) => self.handle_inbound(message),
                PortEvent::Disconnected(reason) => {
                    self.on_disconnected(generation, &reason);
                    return;
                }
            }
        }
        self.on_disconnected(generation, HOST_EXITED);
    }

    /// Decode one inbound payload and, for a command, dispatch it on its own
    /// task. The task sends exactly one response.
    pub fn handle_inbound(&self, message: Value) {
        let raw = message.to_string();

        let command = match InboundMessage::decode(message) {
            InboundMessage::Text(text) => {
                self.inner.ui.append_message(&text);
                return;
            }
            InboundMessage::Ignored(reason) => {
                tracing::debug!(?reason, "Ignoring inbound message");
                return;
            }
            InboundMessage::Command(command) => command,
        };

        self.inner.ui.append_message(&raw);

        let session = self.clone();
        tokio::spawn(async move {
            let routable = session.inner.dispatcher.can_route(&command);
            let request_id = command.request_id.clone();
            let response = session.inner.dispatcher.dispatch(command).await;

            if let Err(e) = session.send(&response).await {
                tracing::warn!(request_id = %request_id, error = %e, "Response dropped");
            }
            if !routable {
                session.inner.ui.append_message(UNKNOWN_TYPE_NOTE);
            }
        });
    }

    /// Send a response on the current connection.
    ///
    /// With no connection the response is dropped and
    /// [`ExtensionError::NotConnected`] is returned.
    pub async fn send(&self, response: &ResponseMessage) -> ExtensionResult<()> {
        let port = self
            .inner
            .connection
            .lock()
            .as_ref()
            .map(|c| Arc::clone(&c.port));
        let Some(port) = port else {
            return Err(ExtensionError::NotConnected);
        };

        let value = serde_json::to_value(response)?;
        port.post_message(&value).await?;
        self.inner
            .ui
            .append_message(&format!("Sent message: {}", value));
        Ok(())
    }

    fn on_disconnected(&self, generation: u64, reason: &str) {
        let inner = &self.inner;
        {
            let mut slot = inner.connection.lock();
            match slot.as_ref() {
                Some(active) if active.generation != generation => {
                    tracing::debug!(generation, "Stale connection closed");
                    return;
                }
                Some(_) => *slot = None,
                None if inner.generation.load(Ordering::SeqCst) != generation => {
                    tracing::debug!(generation, "Stale connection closed");
                    return;
                }
                None => {}
            }
        }

        tracing::warn!(host = %inner.host_name, reason, "Disconnected from native host");
        inner.ui.append_message(&format!("Failed to connect: {}", reason));
        inner.ui.set_state(UiState::Disconnected);
        inner.connected.send_replace(false);
    }
}
