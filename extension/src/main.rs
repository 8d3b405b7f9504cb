//! Extension simulator.
//!
//! Plays the browser side of the bridge: loads a window/tab fixture into the
//! in-memory browser, spawns the native host exactly as the browser would and
//! answers its commands until the host goes away.

use anyhow::Context;
use clap::Parser;
use flts_extension::{
    CommandDispatcher, ExtensionConfig, InMemoryBrowser, LogPanel, ProcessPlatform, Session,
};
use flts_native_messaging::NativeMessagingProtocol;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line arguments for the extension simulator
#[derive(Parser, Debug)]
#[command(name = "flts-extension", version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML or JSON)
    #[arg(short, long, env = "FLTS_EXTENSION_CONFIG")]
    config: Option<PathBuf>,

    /// Native host executable, registered under the configured host name
    #[arg(long)]
    host_path: Option<PathBuf>,

    /// JSON fixture with the initial windows and tabs
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Log filter (e.g. info, flts_extension=debug)
    #[arg(short, long, default_value = "info", env = "RUST_LOG")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&args.log_level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &args.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            ExtensionConfig::from_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?
        }
        None => ExtensionConfig::default(),
    };
    if let Some(path) = args.host_path {
        config.register_host(path);
    }
    if args.fixture.is_some() {
        config.fixture = args.fixture;
    }
    config.validate()?;

    let browser = match &config.fixture {
        Some(path) => InMemoryBrowser::from_fixture_file(path)
            .with_context(|| format!("failed to load fixture {}", path.display()))?,
        None => InMemoryBrowser::new(),
    };
    let browser = Arc::new(browser);
    tracing::info!(tabs = ?browser.titles(), "Browser ready");

    let platform = ProcessPlatform::new(
        config.hosts.clone(),
        NativeMessagingProtocol::new(config.native_messaging.clone()),
    );
    let dispatcher = Arc::new(CommandDispatcher::with_default_routes(browser.clone()));
    for route in dispatcher.get_routes() {
        tracing::debug!(
            request_type = route.request_type.code(),
            route_id = route.route_id,
            "{}",
            route.description
        );
    }

    let panel = Arc::new(LogPanel::new());
    let session = Session::new(
        Arc::new(platform),
        config.host_name.clone(),
        dispatcher,
        panel.clone(),
    );

    tracing::info!(host = session.host_name(), "Starting extension session");
    session.connect().await;
    session.wait_for_disconnect().await;

    tracing::info!(
        tabs = ?browser.titles(),
        log_lines = panel.entries().len(),
        "Session ended"
    );
    Ok(())
}
