//! Indexing job inspection JSON HTTP surface (§6).

use axum::{
  extract::{Path, Query, State},
  response::IntoResponse,
  Json,
};
use serde::Deserialize;
use vaultstore_core::models::{Job, JobId};

use crate::{error::AppError, state::AppState};

pub async fn get_job(State(state): State<AppState>, Path(job_id): Path<String>) -> Result<impl IntoResponse, AppError> {
  let indexing = state.indexing().ok_or(vaultstore_core::error::CoreError::ProviderUnavailable("indexing pipeline disabled".to_string()))?;
  let job = indexing.status(&JobId(job_id))?;
  Ok(Json(job))
}

#[derive(Debug, Deserialize)]
pub struct JobsByObjectQuery {
  pub object_id: String,
}

pub async fn list_jobs_by_object(
  State(state): State<AppState>,
  Query(query): Query<JobsByObjectQuery>,
) -> Result<impl IntoResponse, AppError> {
  let indexing = state.indexing().ok_or(vaultstore_core::error::CoreError::ProviderUnavailable("indexing pipeline disabled".to_string()))?;
  let jobs: Vec<Job> = indexing.jobs_by_object(&query.object_id);
  Ok(Json(jobs))
}

pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
  let indexing = state.indexing().ok_or(vaultstore_core::error::CoreError::ProviderUnavailable("indexing pipeline disabled".to_string()))?;
  Ok(Json(indexing.stats()))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
  match state.indexing() {
    Some(indexing) => Json(serde_json::json!({ "enabled": true, "stats": indexing.stats() })),
    None => Json(serde_json::json!({ "enabled": false })),
  }
}
