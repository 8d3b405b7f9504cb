//! Command line client for the FLTS Chrome bridge.

use clap::{Parser, Subcommand};
use flts_bridge_client::{requests, BridgeClient, DEFAULT_HOST};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line arguments for the bridge client
#[derive(Parser, Debug)]
#[command(name = "flts-bridge-client", version, about, long_about = None)]
struct Args {
    /// Bridge port
    #[arg(short, long, env = "FLTS_BRIDGE_PORT")]
    port: u16,

    /// Bridge host
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Seconds to wait for the browser's answer
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Log filter
    #[arg(short, long, default_value = "warn", env = "RUST_LOG")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rename the first tab with a matching title
    Rename {
        /// Current tab title (exact match)
        #[arg(long)]
        current: String,
        /// New tab title
        #[arg(long)]
        new: String,
    },
    /// Close tabs by id
    Close {
        /// Tab ids
        #[arg(required = true)]
        tab_ids: Vec<i64>,
    },
    /// Shut the bridge down
    Exit,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&args.log_level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client = BridgeClient::new(args.port)
        .with_host(args.host)
        .with_timeout(Duration::from_secs(args.timeout_secs));

    let request = match &args.command {
        Command::Rename { current, new } => requests::rename_tab(current, new),
        Command::Close { tab_ids } => requests::close_tabs(tab_ids),
        Command::Exit => requests::exit(),
    };

    let response = client.send_request(&request).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(if response.is_successful() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
