//! Chrome native messaging frame codec.
//!
//! Every message is a 4-byte length header in the platform's native byte
//! order followed by that many bytes of UTF-8 JSON. The same codec is used
//! by the bridge host on stdin/stdout and by the extension side on the pipes
//! of the host process it spawns.

use crate::config::NativeMessagingConfig;
use crate::error::{ProtocolError, ProtocolResult};
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Length-prefixed JSON framing with a configured size limit.
#[derive(Debug, Clone)]
pub struct NativeMessagingProtocol {
    config: NativeMessagingConfig,
}

impl NativeMessagingProtocol {
    /// Create a new protocol handler.
    pub fn new(config: NativeMessagingConfig) -> Self {
        Self { config }
    }

    /// Read one raw frame.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly before a header, which
    /// is how the peer signals that it is going away.
    pub async fn read_frame<R>(&self, reader: &mut R) -> ProtocolResult<Option<Vec<u8>>>
    where
        R: AsyncRead + Unpin,
    {
        let mut length_bytes = [0u8; 4];
        let mut filled = 0;
        while filled < length_bytes.len() {
            let n = reader.read(&mut length_bytes[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    tracing::debug!("Native messaging stream closed");
                    return Ok(None);
                }
                return Err(ProtocolError::protocol(format!(
                    "Stream closed after {} of 4 header bytes",
                    filled
                )));
            }
            filled += n;
        }

        let message_length = u32::from_ne_bytes(length_bytes) as usize;
        self.check_length(message_length)?;

        let mut message_bytes = vec![0u8; message_length];
        reader
            .read_exact(&mut message_bytes)
            .await
            .map_err(|e| {
                ProtocolError::protocol(format!("Failed to read message payload: {}", e))
            })?;

        tracing::trace!(length = message_length, "Read native message frame");
        Ok(Some(message_bytes))
    }

    /// Read one frame and parse it as JSON.
    pub async fn read_message<R>(&self, reader: &mut R) -> ProtocolResult<Option<Value>>
    where
        R: AsyncRead + Unpin,
    {
        match self.read_frame(reader).await? {
            Some(bytes) => Ok(Some(decode_payload(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Write one raw frame and flush.
    pub async fn write_frame<W>(&self, writer: &mut W, payload: &[u8]) -> ProtocolResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        self.check_length(payload.len())?;

        let length = payload.len() as u32;
        writer
            .write_all(&length.to_ne_bytes())
            .await
            .map_err(ProtocolError::Io)?;
        writer.write_all(payload).await.map_err(ProtocolError::Io)?;
        writer.flush().await.map_err(ProtocolError::Io)?;

        tracing::trace!(length = payload.len(), "Wrote native message frame");

        Ok(())
    }

    /// Serialize `message` as JSON and write it as one frame.
    pub async fn write_message<W, T>(&self, writer: &mut W, message: &T) -> ProtocolResult<()>
    where
        W: AsyncWrite + Unpin,
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_vec(message)?;
        self.write_frame(writer, &json).await
    }

    fn check_length(&self, length: usize) -> ProtocolResult<()> {
        if length == 0 {
            return Err(ProtocolError::protocol("Message length cannot be zero"));
        }
        if length > self.config.max_message_size {
            return Err(ProtocolError::MessageTooLarge {
                length,
                max: self.config.max_message_size,
            });
        }
        Ok(())
    }
}

impl Default for NativeMessagingProtocol {
    fn default() -> Self {
        Self::new(NativeMessagingConfig::default())
    }
}

/// Build a complete frame in memory.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_ne_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Parse one frame from an in-memory buffer.
pub fn decode_frame(data: &[u8]) -> ProtocolResult<Value> {
    if data.len() < 4 {
        return Err(ProtocolError::protocol("Data too short for length header"));
    }

    let mut length_bytes = [0u8; 4];
    length_bytes.copy_from_slice(&data[..4]);
    let message_length = u32::from_ne_bytes(length_bytes) as usize;

    if data.len() < 4 + message_length {
        return Err(ProtocolError::protocol("Data too short for message payload"));
    }

    decode_payload(&data[4..4 + message_length])
}

fn decode_payload(bytes: &[u8]) -> ProtocolResult<Value> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ProtocolError::protocol(format!("Invalid UTF-8 in message: {}", e)))?;
    Ok(serde_json::from_str(text)?)
}
