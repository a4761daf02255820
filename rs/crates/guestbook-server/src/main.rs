use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use guestbook_server::{router, AppState, Args, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from(Args::parse());

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let listen = config.listen;
    let tick = config.tick_interval;
    let state = Arc::new(AppState::new(config));
    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to bind {}", listen))?;

    info!("guest book listening on http://{}", listener.local_addr()?);
    info!(tick_ms = tick.as_millis() as u64, "visitor counter cadence");
    info!("entries are kept in memory only and are lost on restart");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .context("server error")?;

    info!("guest book stopped");
    Ok(())
}

async fn shutdown_signal(state: Arc<AppState>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(?err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!(sessions = state.sessions.len(), "shutting down");
    // Live streams never end on their own; close them so the drain can finish.
    state.shutdown();
}
