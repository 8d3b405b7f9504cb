//! FLTS Chrome bridge wire layer.
//!
//! Shared by the three programs that make up the bridge:
//! - the extension side, which answers commands using the browser's tab APIs
//! - the bridge host, which Chrome spawns and which relays commands from TCP
//! - the FLTS client, which sends commands to the bridge host
//!
//! # Usage
//!
//! ```rust,no_run
//! use flts_native_messaging::{InboundMessage, NativeMessagingProtocol};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let protocol = NativeMessagingProtocol::default();
//! let mut stdin = tokio::io::stdin();
//! while let Some(value) = protocol.read_message(&mut stdin).await? {
//!     if let InboundMessage::Command(cmd) = InboundMessage::decode(value) {
//!         println!("command {:?}", cmd.request_type());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
mod error;
mod message;
mod protocol;

pub use config::NativeMessagingConfig;
pub use error::{ProtocolError, ProtocolResult};
pub use message::{
    correlation_key, integral_value, BridgeRequest, CommandMessage, IgnoredReason, InboundMessage,
    RequestType, ResponseMessage, ResponseType, DEFAULT_HOST_NAME, SOURCE_CHROME, SOURCE_FLTS,
};
pub use protocol::{decode_frame, encode_frame, NativeMessagingProtocol};
