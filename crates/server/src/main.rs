use std::sync::Arc;

use clap::Parser;
use tracing::info;

use server::config::Cli;
use server::state::AppState;
use server::{app, logging};

use metrics_core as _;
use serde as _;
use thiserror as _;
use tower_http as _;
use tracing_subscriber as _;
#[cfg(test)]
use tower as _;

const SHUTDOWN_DRAIN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);
    let config = cli.into_config();

    info!(address = %config.address, "starting server");
    let store = server_storage::build_store(config.backend, config.restore)
        .await
        .map_err(|e| anyhow::anyhow!("failed to initialize storage: {e}"))?;

    let state = Arc::new(AppState { store: store.clone(), key: config.key });
    let router = app::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.address)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {e}", config.address))?;

    let result = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("closing storage backend");
    if let Err(err) = tokio::time::timeout(SHUTDOWN_DRAIN_TIMEOUT, store.close()).await {
        tracing::warn!("storage close timed out after {SHUTDOWN_DRAIN_TIMEOUT:?}: {err}");
    }

    result.map_err(|e| anyhow::anyhow!("server error: {e}"))?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sig = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        sig.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
