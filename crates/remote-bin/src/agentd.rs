//! The power-command agent daemon.
//!
//! Runs on the desktop being controlled. Binds all interfaces and serves
//! the four agent routes until interrupted; `--test-mode` (or
//! `TEST_MODE=true`) simulates commands instead of executing them.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use remote_agent::AgentConfig;

/// Run the power-command agent on this machine.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Listen port (overrides the PORT environment variable)
    #[arg(short, long)]
    port: Option<u16>,

    /// Simulate commands instead of executing them (overrides TEST_MODE)
    #[arg(long)]
    test_mode: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let mut config = AgentConfig::load()?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.test_mode {
        config.test_mode = true;
    }

    let handle = remote_agent::serve(config).await?;
    info!("press ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    handle.shutdown().await;
    Ok(())
}
