//! FLTS side of the Chrome bridge.
//!
//! Sends rename and close commands to the bridge host over its local TCP
//! port, one request per connection, and returns the browser's answer.
//!
//! # Usage
//!
//! ```rust,no_run
//! use flts_bridge_client::BridgeClient;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = BridgeClient::new(9413);
//! let response = client.rename_tab("WhatsApp", "We have updated the title!!").await?;
//! if response.is_successful() {
//!     let tab_id = response.data["tabId"].as_i64().unwrap_or_default();
//!     client.close_tabs(&[tab_id]).await?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod client;
mod error;
pub mod requests;

pub use client::{BridgeClient, BridgeResponse, DEFAULT_HOST, DEFAULT_TIMEOUT};
pub use error::{ClientError, ClientResult};
