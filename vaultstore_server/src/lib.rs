//! # vaultstore_server
//!
//! **Responsibility**: HTTP surface and process wiring. Owns the S3-style
//! bucket/object API, the JSON vector/RAG/indexing API, application state
//! construction, and the router assembly consumed by `main`.

pub mod config;
pub mod error;
pub mod handlers;
pub mod indexing;
pub mod ingestion;
pub mod middleware;
pub mod rag;
pub mod state;
pub mod storage;
pub mod vector;

use axum::{
  middleware::from_fn_with_state,
  routing::{delete, get, post, put},
  Router,
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::{error::AppError, state::AppState};

/// Assembles the full router: S3-style bucket/object routes under the auth
/// layer, the JSON vector/RAG/indexing API, and an unauthenticated health
/// check — one merged `Router` built from per-concern sub-routers, state
/// injected once at the end.
pub async fn get_router(state: AppState) -> Result<Router, AppError> {
  let s3_router = Router::new()
    .route("/", get(handlers::s3::list_all_buckets))
    .route("/{bucket}", put(handlers::s3::create_bucket).delete(handlers::s3::delete_bucket).get(handlers::s3::list_objects))
    .route(
      "/{bucket}/{*key}",
      put(handlers::s3::put_object).get(handlers::s3::get_object).head(handlers::s3::head_object).delete(handlers::s3::delete_object),
    )
    .layer(from_fn_with_state(state.clone(), middleware::require_signature));

  let api_router = Router::new()
    .route("/api/v1/vectors/embeddings", post(handlers::vectors::store_embedding))
    .route("/api/v1/vectors/search", post(handlers::vectors::search))
    .route("/api/v1/vectors/search/text", post(handlers::vectors::search_text))
    .route("/api/v1/vectors/by-parent/{object_id}", delete(handlers::vectors::delete_by_parent))
    .route("/api/v1/chat/completions", post(handlers::rag::chat_completions))
    .route("/api/v1/chat/search/context", post(handlers::rag::search_context))
    .route("/api/v1/indexing/jobs/{job_id}", get(handlers::indexing::get_job))
    .route("/api/v1/indexing/jobs", get(handlers::indexing::list_jobs_by_object))
    .route("/api/v1/indexing/stats", get(handlers::indexing::stats))
    .route("/api/v1/indexing/health", get(handlers::indexing::health));

  let health_router = Router::new().route("/healthz", get(handlers::health::healthz));

  let trace_layer = TraceLayer::new_for_http()
    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
    .on_request(DefaultOnRequest::new().level(Level::INFO))
    .on_response(DefaultOnResponse::new().level(Level::INFO));

  Ok(
    Router::new()
      .merge(health_router)
      .merge(api_router)
      .merge(s3_router)
      .layer(trace_layer)
      .with_state(state),
  )
}
