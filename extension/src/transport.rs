//! Native messaging port.
//!
//! [`NativePlatform::connect_native`] opens a port to a named host and hands
//! back the sending half plus a stream of [`PortEvent`]s. The stream always
//! ends with a [`PortEvent::Disconnected`] or by closing.

use crate::error::{ExtensionError, ExtensionResult};
use async_trait::async_trait;
use flts_native_messaging::NativeMessagingProtocol;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;

/// Reason reported when the host process goes away.
pub const HOST_EXITED: &str = "Native host has exited.";

/// Something that happened on a port.
#[derive(Debug, Clone, PartialEq)]
pub enum PortEvent {
    /// A message from the native peer
    Message(Value),
    /// The port closed; carries the platform-supplied reason
    Disconnected(String),
}

/// Sending half of a port.
#[async_trait]
pub trait Port: Send + Sync {
    /// Deliver one message to the native peer.
    async fn post_message(&self, message: &Value) -> ExtensionResult<()>;
}

/// An open port.
pub struct PortConnection {
    /// Sending half
    pub port: Arc<dyn Port>,
    /// Inbound events
    pub events: mpsc::UnboundedReceiver<PortEvent>,
}

/// Opens ports to native hosts.
#[async_trait]
pub trait NativePlatform: Send + Sync {
    /// Connect to the host registered as `host_name`.
    async fn connect_native(&self, host_name: &str) -> ExtensionResult<PortConnection>;
}

// ---------------------------------------------------------------------------
// Child process platform
// ---------------------------------------------------------------------------

/// Registration of one native messaging host executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostManifest {
    /// Host name, e.g. `com.flts.chrome.bridge`
    pub name: String,
    /// Executable to spawn
    pub path: PathBuf,
    /// Extra arguments
    #[serde(default)]
    pub args: Vec<String>,
}

/// Spawns registered host executables and talks to them over their stdio,
/// the same way the browser does.
pub struct ProcessPlatform {
    hosts: HashMap<String, HostManifest>,
    protocol: NativeMessagingProtocol,
}

impl ProcessPlatform {
    /// Platform knowing the given hosts.
    pub fn new(
        hosts: impl IntoIterator<Item = HostManifest>,
        protocol: NativeMessagingProtocol,
    ) -> Self {
        Self {
            hosts: hosts.into_iter().map(|h| (h.name.clone(), h)).collect(),
            protocol,
        }
    }

    /// True if `host_name` is registered.
    pub fn has_host(&self, host_name: &str) -> bool {
        self.hosts.contains_key(host_name)
    }
}

struct ProcessPort {
    stdin: tokio::sync::Mutex<ChildStdin>,
    protocol: NativeMessagingProtocol,
    // Held so the host is killed when the port is dropped.
    _child: Mutex<Child>,
}

#[async_trait]
impl Port for ProcessPort {
    async fn post_message(&self, message: &Value) -> ExtensionResult<()> {
        let mut stdin = self.stdin.lock().await;
        self.protocol.write_message(&mut *stdin, message).await?;
        Ok(())
    }
}

#[async_trait]
impl NativePlatform for ProcessPlatform {
    async fn connect_native(&self, host_name: &str) -> ExtensionResult<PortConnection> {
        let manifest = self
            .hosts
            .get(host_name)
            .ok_or_else(|| ExtensionError::HostNotFound(host_name.to_string()))?;

        tracing::info!(host = host_name, path = %manifest.path.display(), "Spawning native host");

        let mut child = Command::new(&manifest.path)
            .args(&manifest.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| std::io::Error::other("host stdin not captured"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("host stdout not captured"))?;

        let (tx, events) = mpsc::unbounded_channel();
        let protocol = self.protocol.clone();
        tokio::spawn(async move {
            let reason = loop {
                match protocol.read_message(&mut stdout).await {
                    Ok(Some(message)) => {
                        if tx.send(PortEvent::Message(message)).is_err() {
                            return;
                        }
                    }
                    Ok(None) => break HOST_EXITED.to_string(),
                    Err(e) if e.is_disconnect() => break HOST_EXITED.to_string(),
                    Err(e) => {
                        tracing::error!(error = %e, "Bad frame from native host");
                        break format!(
                            "Error when communicating with the native messaging host: {}",
                            e
                        );
                    }
                }
            };
            let _ = tx.send(PortEvent::Disconnected(reason));
        });

        let port = ProcessPort {
            stdin: tokio::sync::Mutex::new(stdin),
            protocol: self.protocol.clone(),
            _child: Mutex::new(child),
        };

        Ok(PortConnection {
            port: Arc::new(port),
            events,
        })
    }
}

// ---------------------------------------------------------------------------
// In-process platform
// ---------------------------------------------------------------------------

/// Test-side end of an in-process port.
pub struct MemoryPeer {
    /// Host name the extension asked for
    pub host_name: String,
    inbound: mpsc::UnboundedSender<PortEvent>,
    outbound: mpsc::UnboundedReceiver<Value>,
}

impl MemoryPeer {
    /// Deliver a message to the extension. Returns false once the extension
    /// has dropped the port.
    pub fn send(&self, message: Value) -> bool {
        self.inbound.send(PortEvent::Message(message)).is_ok()
    }

    /// Close the port with `reason`.
    pub fn disconnect(&self, reason: &str) {
        let _ = self.inbound.send(PortEvent::Disconnected(reason.to_string()));
    }

    /// Next message posted by the extension.
    pub async fn recv(&mut self) -> Option<Value> {
        self.outbound.recv().await
    }

    /// Next posted message, if one is already queued.
    pub fn try_recv(&mut self) -> Option<Value> {
        self.outbound.try_recv().ok()
    }
}

struct MemoryPort {
    outbound: mpsc::UnboundedSender<Value>,
}

#[async_trait]
impl Port for MemoryPort {
    async fn post_message(&self, message: &Value) -> ExtensionResult<()> {
        self.outbound
            .send(message.clone())
            .map_err(|_| ExtensionError::NotConnected)
    }
}

/// Platform whose ports are channel pairs; each connection is handed to the
/// test as a [`MemoryPeer`].
pub struct MemoryPlatform {
    peers: mpsc::UnboundedSender<MemoryPeer>,
    refuse: Option<String>,
}

impl MemoryPlatform {
    /// Platform plus the receiver of its peers.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MemoryPeer>) {
        let (peers, rx) = mpsc::unbounded_channel();
        (Self { peers, refuse: None }, rx)
    }

    /// Platform on which every connection attempt fails with `reason`.
    pub fn refusing(reason: &str) -> Self {
        let (peers, _) = mpsc::unbounded_channel();
        Self {
            peers,
            refuse: Some(reason.to_string()),
        }
    }
}

#[async_trait]
impl NativePlatform for MemoryPlatform {
    async fn connect_native(&self, host_name: &str) -> ExtensionResult<PortConnection> {
        if let Some(reason) = &self.refuse {
            return Err(ExtensionError::HostNotFound(reason.clone()));
        }

        let (inbound, events) = mpsc::unbounded_channel();
        let (outbound_tx, outbound) = mpsc::unbounded_channel();

        self.peers
            .send(MemoryPeer {
                host_name: host_name.to_string(),
                inbound,
                outbound,
            })
            .map_err(|_| ExtensionError::HostNotFound(host_name.to_string()))?;

        Ok(PortConnection {
            port: Arc::new(MemoryPort { outbound: outbound_tx }),
            events,
        })
    }
}
