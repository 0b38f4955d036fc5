//! # Vaultstore Server - Main Entry Point
//!
//! **Responsibility**: Initializes and runs the Axum web server, the
//! indexing worker pool, and graceful shutdown.

use std::{net::SocketAddr, time::Duration};

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vaultstore_server::{config::AppConfig, error::AppError, get_router, state::AppState};

#[tokio::main]
async fn main() -> Result<(), AppError> {
  let config = AppConfig::load().expect("failed to load configuration");

  tracing_subscriber::registry()
    .with(tracing_subscriber::fmt::layer())
    .with(tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())))
    .init();

  let state = AppState::try_new(config.clone()).await?;
  let worker_handles = state.start_background_tasks();

  let app = get_router(state.clone()).await?;

  let addr = SocketAddr::from((
    config.server.host.parse::<std::net::IpAddr>().unwrap_or_else(|_| [0, 0, 0, 0].into()),
    config.server.port,
  ));
  info!("vaultstore server listening on {addr}");
  info!("health check available at http://{addr}/healthz");

  let listener = TcpListener::bind(addr).await?;

  let (shutdown_tx, mut shutdown_rx) = tokio::sync::broadcast::channel(1);
  tokio::spawn(async move {
    tokio::signal::ctrl_c().await.expect("failed to install CTRL+C signal handler");
    info!("shutdown signal received, initiating graceful shutdown");
    let _ = shutdown_tx.send(());
  });

  let http_server = axum::serve(listener, app.into_make_service()).with_graceful_shutdown(async move {
    let _ = shutdown_rx.recv().await;
  });

  if let Err(e) = http_server.await {
    error!("HTTP server error: {e}");
  } else {
    info!("HTTP server stopped gracefully");
  }

  if let Some(indexing) = state.indexing() {
    indexing.stop();
  }
  if tokio::time::timeout(Duration::from_secs(30), futures::future::join_all(worker_handles)).await.is_err() {
    error!("indexing workers did not stop within the 30s shutdown grace period");
  }

  Ok(())
}
