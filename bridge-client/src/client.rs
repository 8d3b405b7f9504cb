//! TCP client for the bridge host.

use crate::error::{ClientError, ClientResult};
use crate::requests;
use flts_native_messaging::{BridgeRequest, ResponseMessage};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Response relayed by the bridge host.
pub type BridgeResponse = ResponseMessage;

/// Default host the bridge listens on.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default time to wait for the browser's answer.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends one request per connection to the bridge host.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    host: String,
    port: u16,
    timeout: Duration,
}

impl BridgeClient {
    /// Client for the bridge on `127.0.0.1:port`.
    pub fn new(port: u16) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use a different host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Use a different response timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bridge port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Response timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send `request` and wait for the relayed response.
    ///
    /// The whole exchange, connect included, is bounded by the timeout.
    pub async fn send_request(&self, request: &BridgeRequest) -> ClientResult<BridgeResponse> {
        tracing::debug!(
            request_id = %request.request_id,
            request_type = request.request_type,
            port = self.port,
            "Sending bridge request"
        );

        let response = tokio::time::timeout(self.timeout, self.exchange(request))
            .await
            .map_err(|_| ClientError::Timeout(self.timeout))??;

        tracing::debug!(
            request_id = %response.request_id,
            success = response.is_successful(),
            "Bridge response"
        );
        Ok(response)
    }

    async fn exchange(&self, request: &BridgeRequest) -> ClientResult<BridgeResponse> {
        let address = format!("{}:{}", self.host, self.port);
        let mut stream = TcpStream::connect(&address)
            .await
            .map_err(|source| ClientError::Connect { address, source })?;

        stream.write_all(&serde_json::to_vec(request)?).await?;
        stream.shutdown().await?;

        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).await?;
        if buffer.iter().all(u8::is_ascii_whitespace) {
            return Err(ClientError::NoResponse);
        }
        Ok(serde_json::from_slice(&buffer)?)
    }

    /// Rename the first tab titled `current_name`.
    pub async fn rename_tab(
        &self,
        current_name: &str,
        new_name: &str,
    ) -> ClientResult<BridgeResponse> {
        self.send_request(&requests::rename_tab(current_name, new_name)).await
    }

    /// Close the listed tabs.
    pub async fn close_tabs(&self, tab_ids: &[i64]) -> ClientResult<BridgeResponse> {
        self.send_request(&requests::close_tabs(tab_ids)).await
    }

    /// Ask the bridge to shut down.
    pub async fn exit(&self) -> ClientResult<BridgeResponse> {
        self.send_request(&requests::exit()).await
    }
}
