//! Liveness/readiness surface (§6).

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
  pub status: &'static str,
  pub version: &'static str,
  pub storage: &'static str,
  pub vector_enabled: bool,
  pub ai_enabled: bool,
  pub uptime_secs: i64,
}

/// Liveness check: round-trips the object store and (if enabled) the
/// vector index with a cheap read, rather than assuming process-up means
/// healthy.
pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
  let uptime_secs = (chrono::Utc::now() - state.started_at()).num_seconds();

  let storage_ok = state.object_store().list_buckets().await.is_ok();
  let vector_ok = match state.vector_index() {
    Ok(index) => index.get("__healthz__").await.is_ok(),
    Err(_) => true,
  };

  Json(HealthResponse {
    status: if storage_ok && vector_ok { "healthy" } else { "unhealthy" },
    version: env!("CARGO_PKG_VERSION"),
    storage: "filesystem",
    vector_enabled: state.vector_index().is_ok(),
    ai_enabled: state.ai_enabled(),
    uptime_secs,
  })
}
