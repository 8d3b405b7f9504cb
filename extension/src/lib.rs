//! Extension side of the FLTS Chrome bridge.
//!
//! Receives commands from the native host over a native messaging port,
//! carries them out with the browser's tab APIs and answers each accepted
//! command with exactly one response.
//!
//! # Architecture
//!
//! - [`Session`] owns the connection slot and the inbound pump
//! - [`CommandDispatcher`] routes commands by wire `type` to a [`CommandRoute`]
//! - [`Browser`] abstracts the tab APIs; [`InMemoryBrowser`] implements it
//! - [`UiReflector`] receives log lines and the connected/disconnected state
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use flts_extension::{CommandDispatcher, InMemoryBrowser, LogPanel, MemoryPlatform, Session};
//!
//! # async fn run() {
//! let browser = Arc::new(InMemoryBrowser::new());
//! let dispatcher = Arc::new(CommandDispatcher::with_default_routes(browser));
//! let (platform, _peers) = MemoryPlatform::new();
//! let session = Session::new(
//!     Arc::new(platform),
//!     flts_native_messaging::DEFAULT_HOST_NAME,
//!     dispatcher,
//!     Arc::new(LogPanel::new()),
//! );
//! session.connect().await;
//! session.wait_for_disconnect().await;
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod browser;
mod config;
mod error;
mod memory_browser;
pub mod route_trait;
mod router;
pub mod routes;
mod session;
pub mod transport;
mod ui;

pub use browser::{Browser, Tab, TabId, TabQuery, Window, WindowId};
pub use config::ExtensionConfig;
pub use error::{BrowserError, BrowserResult, ExtensionError, ExtensionResult};
pub use memory_browser::InMemoryBrowser;
pub use route_trait::{CommandRoute, RouteMetadata, RouteReply};
pub use router::{CommandDispatcher, UNKNOWN_REQUEST_TYPE};
pub use session::Session;
pub use transport::{
    HostManifest, MemoryPeer, MemoryPlatform, NativePlatform, Port, PortEvent, ProcessPlatform,
};
pub use ui::{escape_html, ControlVisibility, LogEntry, LogPanel, UiReflector, UiState};
