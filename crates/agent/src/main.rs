mod cli;
mod logging;
mod shutdown;

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use crate::cli::Cli;
use crate::shutdown::{ShutdownController, ShutdownEvent, spawn_shutdown_signal_handler};

const SHUTDOWN_DRAIN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let config = cli.into_config()?;
    info!(server = %config.server_url, rate_limit = config.rate_limit, "starting agent");

    let http = reqwest::Client::new();
    let handle = agent_engine::start_agent(config, http);

    let shutdown = Arc::new(ShutdownController::new());
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::unbounded_channel::<ShutdownEvent>();
    spawn_shutdown_signal_handler(shutdown.clone(), shutdown_tx);

    match shutdown_rx.recv().await {
        Some(ShutdownEvent::Graceful) | None => {
            info!("shutdown requested, draining in-flight work");
            handle.request_stop();
            match tokio::time::timeout(SHUTDOWN_DRAIN_TIMEOUT, handle.wait()).await {
                Ok(result) => result?,
                Err(_) => {
                    tracing::warn!("shutdown drain timed out after {SHUTDOWN_DRAIN_TIMEOUT:?}, exiting anyway");
                    std::process::exit(1);
                }
            }
        }
        Some(ShutdownEvent::Immediate) => {
            tracing::warn!("forced shutdown requested, exiting immediately");
            std::process::exit(130);
        }
    }

    Ok(())
}
