//! Native messaging host binary entry point.
//!
//! Chrome launches this binary for the FLTS extension and talks to it over
//! stdin/stdout. FLTS talks to it over a local TCP port.

use anyhow::Context;
use clap::Parser;
use flts_chrome_bridge::{
    config::{DEFAULT_CONFIG_FILE, LEGACY_CONFIG_FILE},
    BridgeHost, HostConfig,
};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command line arguments for the bridge host
#[derive(Parser, Debug)]
#[command(name = "flts-chrome-bridge", version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML or JSON)
    #[arg(short, long, env = "FLTS_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// TCP port FLTS connects to
    #[arg(short, long, env = "FLTS_BRIDGE_PORT")]
    port: Option<u16>,

    /// Address to bind the listener to
    #[arg(long)]
    bind_address: Option<String>,

    /// Log file (stdout is reserved for the browser)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log to stderr instead of a file
    #[arg(long)]
    log_stderr: bool,

    /// Log filter (e.g. info, flts_chrome_bridge=debug)
    #[arg(short, long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Caller origin, passed by Chrome
    #[arg(hide = true)]
    origin: Option<String>,

    /// Parent window handle, passed by Chrome on Windows
    #[arg(long, hide = true)]
    parent_window: Option<i64>,
}

fn load_config(args: &Args) -> anyhow::Result<HostConfig> {
    let mut config = match &args.config {
        Some(path) => HostConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            HostConfig::from_file(DEFAULT_CONFIG_FILE)
                .with_context(|| format!("failed to load {}", DEFAULT_CONFIG_FILE))?
        }
        // Installs from before the TOML config only carry the port.
        None if Path::new(LEGACY_CONFIG_FILE).exists() => {
            HostConfig::from_legacy_file(LEGACY_CONFIG_FILE)
                .with_context(|| format!("failed to load {}", LEGACY_CONFIG_FILE))?
        }
        None => HostConfig::default(),
    };

    if args.port.is_some() {
        config.port = args.port;
    }
    if let Some(address) = &args.bind_address {
        config.bind_address = address.clone();
    }
    if args.log_file.is_some() {
        config.log_file = args.log_file.clone();
    }
    if args.log_stderr {
        config.log_file = None;
    }
    Ok(config)
}

fn init_logging(config: &HostConfig, level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::new(level);
    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_logging(&config, &args.log_level)?;

    tracing::info!(
        origin = ?args.origin,
        parent_window = ?args.parent_window,
        "FLTS Chrome bridge starting"
    );

    let host = BridgeHost::new(config).context("invalid configuration")?;
    let listener = match host.bind().await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Server bind error");
            return Err(e.into());
        }
    };

    let reason = host
        .run(listener, tokio::io::stdin(), tokio::io::stdout())
        .await?;
    tracing::info!(?reason, "FLTS Chrome bridge stopped");

    // The blocking stdin reader would keep the runtime alive after an EXIT.
    std::process::exit(0);
}
