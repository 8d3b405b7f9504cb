//! FLTS Chrome bridge host.
//!
//! Chrome starts this process as a native messaging host for the FLTS
//! extension. It listens on a local TCP port, forwards each FLTS request to
//! the extension over stdout and relays the extension's answer from stdin
//! back to the client that asked.
//!
//! # Usage
//!
//! ```rust,no_run
//! use flts_chrome_bridge::{BridgeHost, HostConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let host = BridgeHost::new(HostConfig::with_port(9413))?;
//! let listener = host.bind().await?;
//! let reason = host.run(listener, tokio::io::stdin(), tokio::io::stdout()).await?;
//! println!("stopped: {:?}", reason);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
mod error;
mod host;
mod pending;

pub use config::HostConfig;
pub use error::{BridgeError, BridgeResult};
pub use host::{read_json_value, BridgeHost, ShutdownReason, EXIT_MESSAGE};
pub use pending::PendingClients;
