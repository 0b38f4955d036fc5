//! Vector JSON HTTP surface (§6).

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vaultstore_ai::EmbeddingProvider;
use vaultstore_core::models::{ScoredVector, VectorRecord};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct StoreEmbeddingRequest {
  pub id: String,
  pub embedding: Vec<f64>,
  #[serde(default)]
  pub metadata: Value,
}

#[derive(Debug, Serialize)]
pub struct StoreEmbeddingResponse {
  pub message: String,
  pub id: String,
  pub dimensions: usize,
}

pub async fn store_embedding(
  State(state): State<AppState>,
  Json(request): Json<StoreEmbeddingRequest>,
) -> Result<impl IntoResponse, AppError> {
  let vector_index = state.vector_index()?;
  let dimensions = request.embedding.len();
  vector_index
    .store(VectorRecord { id: request.id.clone(), embedding: request.embedding, metadata: request.metadata })
    .await?;

  Ok((
    StatusCode::CREATED,
    Json(StoreEmbeddingResponse { message: "stored".to_string(), id: request.id, dimensions }),
  ))
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
  pub query: Vec<f64>,
  pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ScoredVectorOut {
  pub vector: VectorRecord,
  pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
  pub results: Vec<ScoredVectorOut>,
  pub count: usize,
  pub top_k: usize,
  pub query_dimensions: usize,
}

fn render_results(results: Vec<ScoredVector>, top_k: usize, query_dimensions: usize) -> SearchResponse {
  let count = results.len();
  SearchResponse {
    results: results.into_iter().map(|sv| ScoredVectorOut { vector: sv.vector, score: sv.score }).collect(),
    count,
    top_k,
    query_dimensions,
  }
}

pub async fn search(State(state): State<AppState>, Json(request): Json<SearchRequest>) -> Result<impl IntoResponse, AppError> {
  let vector_index = state.vector_index()?;
  let top_k = request.top_k.filter(|k| *k > 0).unwrap_or(state.config().rag.default_top_k);
  let query_dimensions = request.query.len();

  let results = vector_index.search(&request.query, top_k).await?;
  Ok(Json(render_results(results, top_k, query_dimensions)))
}

#[derive(Debug, Deserialize)]
pub struct SearchTextRequest {
  pub query: String,
  pub top_k: Option<usize>,
}

pub async fn search_text(
  State(state): State<AppState>,
  Json(request): Json<SearchTextRequest>,
) -> Result<impl IntoResponse, AppError> {
  let vector_index = state.vector_index()?;
  let ai = state.ai()?;
  let top_k = request.top_k.filter(|k| *k > 0).unwrap_or(state.config().rag.default_top_k);

  let embedding = ai.embed(&request.query, state.config().ai.timeout()).await?;
  let query_dimensions = embedding.len();

  let results = vector_index.search(&embedding, top_k).await?;
  Ok(Json(render_results(results, top_k, query_dimensions)))
}

pub async fn delete_by_parent(
  State(state): State<AppState>,
  axum::extract::Path(object_id): axum::extract::Path<String>,
) -> Result<impl IntoResponse, AppError> {
  let vector_index = state.vector_index()?;
  vector_index.delete(&object_id).await?;
  Ok(StatusCode::NO_CONTENT)
}
