//! TCP to native messaging relay.
//!
//! FLTS opens one TCP connection per request and writes a single JSON
//! object. The host forwards it to the browser as a frame on stdout and parks
//! the connection until a frame with the same `requestId` comes back on
//! stdin. EXIT requests are answered by the host itself.

use crate::config::HostConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::pending::PendingClients;
use flts_native_messaging::{
    correlation_key, NativeMessagingProtocol, RequestType, ResponseMessage, SOURCE_FLTS,
};
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

/// Reply sent to the client that asked the bridge to exit.
pub const EXIT_MESSAGE: &str = "Bridge about to close";

/// Why [`BridgeHost::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// A client sent an EXIT request
    ExitRequested,
    /// The browser closed stdin
    BrowserClosed,
    /// stdin carried something that is not a valid frame
    InputFailed(String),
}

type BoxedWriter = Box<dyn AsyncWrite + Unpin + Send>;

struct Relay {
    protocol: NativeMessagingProtocol,
    pending: PendingClients,
    stdout: tokio::sync::Mutex<BoxedWriter>,
    shutdown: watch::Sender<Option<ShutdownReason>>,
    max_request_size: usize,
    log_messages: bool,
}

impl Relay {
    fn request_shutdown(&self, reason: ShutdownReason) {
        self.shutdown.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        });
    }

    async fn forward(&self, payload: &[u8]) -> BridgeResult<()> {
        let mut stdout = self.stdout.lock().await;
        self.protocol.write_frame(&mut *stdout, payload).await?;
        Ok(())
    }

    fn deliver(&self, frame: Vec<u8>) {
        let request_id = match serde_json::from_slice::<Value>(&frame) {
            Ok(value) => value.get("requestId").cloned().unwrap_or(Value::Null),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping unparseable browser response");
                return;
            }
        };
        if self.log_messages {
            tracing::debug!(
                request_id = %request_id,
                response = %String::from_utf8_lossy(&frame),
                "Browser response"
            );
        }

        let key = correlation_key(&request_id);
        if self.pending.deliver(&key, frame) {
            tracing::debug!(request_id = %key, "Response relayed to client");
        } else {
            tracing::warn!(request_id = %key, "No client waiting for response, dropped");
        }
    }
}

/// The bridge host: a TCP listener on one side, the browser's pipe on the
/// other.
pub struct BridgeHost {
    config: HostConfig,
    protocol: NativeMessagingProtocol,
}

impl BridgeHost {
    /// Create a host from a validated configuration.
    pub fn new(config: HostConfig) -> BridgeResult<Self> {
        config.validate()?;
        let protocol = NativeMessagingProtocol::new(config.native_messaging.clone());
        Ok(Self { config, protocol })
    }

    /// Host configuration.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Bind the configured listener address.
    pub async fn bind(&self) -> BridgeResult<TcpListener> {
        let address = self.config.listen_address()?;
        TcpListener::bind(&address)
            .await
            .map_err(|source| BridgeError::Bind { address, source })
    }

    /// Relay between `listener` and the browser pipe until an EXIT request,
    /// the end of `stdin`, or a broken frame on `stdin`.
    ///
    /// Clients still parked at shutdown are closed without an answer.
    pub async fn run<R, W>(
        &self,
        listener: TcpListener,
        stdin: R,
        stdout: W,
    ) -> BridgeResult<ShutdownReason>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (shutdown, mut shutdown_rx) = watch::channel(None);
        let relay = Arc::new(Relay {
            protocol: self.protocol.clone(),
            pending: PendingClients::new(),
            stdout: tokio::sync::Mutex::new(Box::new(stdout) as BoxedWriter),
            shutdown,
            max_request_size: self.config.max_request_size,
            log_messages: self.config.native_messaging.enable_logging,
        });

        let reader = tokio::spawn(relay_browser_responses(Arc::clone(&relay), stdin));
        tracing::info!(address = ?listener.local_addr().ok(), "Bridge accepting clients");

        let reason = loop {
            tokio::select! {
                reason = wait_for_shutdown(&mut shutdown_rx) => break reason,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tokio::spawn(handle_client(Arc::clone(&relay), stream, peer));
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to accept client"),
                },
            }
        };

        drop(listener);
        reader.abort();
        let released = relay.pending.drain();
        tracing::info!(?reason, released, "Bridge shutting down");
        Ok(reason)
    }
}

async fn wait_for_shutdown(rx: &mut watch::Receiver<Option<ShutdownReason>>) -> ShutdownReason {
    match rx.wait_for(Option::is_some).await {
        Ok(reason) => (*reason).clone().unwrap_or(ShutdownReason::BrowserClosed),
        Err(_) => ShutdownReason::BrowserClosed,
    }
}

async fn relay_browser_responses<R>(relay: Arc<Relay>, mut stdin: R)
where
    R: AsyncRead + Unpin,
{
    let reason = loop {
        match relay.protocol.read_frame(&mut stdin).await {
            Ok(Some(frame)) => relay.deliver(frame),
            Ok(None) => {
                tracing::info!("Browser closed stdin");
                break ShutdownReason::BrowserClosed;
            }
            Err(e) => {
                tracing::error!(error = %e, code = e.error_code(), "Failed to read from browser");
                break ShutdownReason::InputFailed(e.to_string());
            }
        }
    };
    relay.request_shutdown(reason);
}

async fn handle_client(relay: Arc<Relay>, mut stream: TcpStream, peer: SocketAddr) {
    if let Err(e) = serve_client(&relay, &mut stream).await {
        tracing::warn!(%peer, error = %e, code = e.error_code(), "Client request failed");
    }
}

async fn serve_client(relay: &Relay, stream: &mut TcpStream) -> BridgeResult<()> {
    let Some(request) = read_json_value(stream, relay.max_request_size).await? else {
        tracing::debug!("Client closed without sending a request");
        return Ok(());
    };

    let source = request.get("source").and_then(Value::as_str);
    if source != Some(SOURCE_FLTS) {
        tracing::warn!(?source, "Ignoring request from unknown source");
        return Ok(());
    }

    let request_id = request.get("requestId").cloned().unwrap_or(Value::Null);
    let request_type = request.get("type").and_then(RequestType::from_value);
    tracing::info!(request_id = %request_id, ?request_type, "Client request");

    if request_type == Some(RequestType::Exit) {
        let reply = ResponseMessage::success(EXIT_MESSAGE, Map::new(), request_id);
        let written = write_and_close(stream, &serde_json::to_vec(&reply)?).await;
        relay.request_shutdown(ShutdownReason::ExitRequested);
        return written;
    }

    let key = correlation_key(&request_id);
    let answer = relay.pending.park(key.clone());
    if let Err(e) = relay.forward(&serde_json::to_vec(&request)?).await {
        relay.pending.cancel(&key);
        return Err(e);
    }

    match answer.await {
        Ok(response) => write_and_close(stream, &response).await,
        Err(_) => {
            tracing::debug!(request_id = %key, "Client released without a response");
            Ok(())
        }
    }
}

async fn write_and_close(stream: &mut TcpStream, bytes: &[u8]) -> BridgeResult<()> {
    stream.write_all(bytes).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Read until `reader` holds one complete JSON value.
///
/// Returns `Ok(None)` when the peer closes without sending anything.
pub async fn read_json_value<R>(reader: &mut R, max_size: usize) -> BridgeResult<Option<Value>>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            if buffer.iter().all(u8::is_ascii_whitespace) {
                return Ok(None);
            }
            return Err(BridgeError::InvalidRequest(
                "connection closed before a complete JSON value".to_string(),
            ));
        }

        buffer.extend_from_slice(&chunk[..n]);
        if buffer.len() > max_size {
            return Err(BridgeError::RequestTooLarge {
                length: buffer.len(),
                max: max_size,
            });
        }

        match serde_json::from_slice::<Value>(&buffer) {
            Ok(value) => return Ok(Some(value)),
            Err(e) if e.is_eof() => continue,
            Err(e) => return Err(e.into()),
        }
    }
}
