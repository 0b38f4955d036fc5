//! RAG JSON HTTP surface (§6): chat completions and standalone context search.

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, rag::ChatParams, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ChatCompletionRequest {
  pub query: String,
  pub max_tokens: Option<u32>,
  pub temperature: Option<f32>,
  pub top_k: Option<usize>,
}

pub async fn chat_completions(
  State(state): State<AppState>,
  Json(request): Json<ChatCompletionRequest>,
) -> Result<impl IntoResponse, AppError> {
  let rag = state.rag()?;
  let response = rag
    .chat(
      &request.query,
      ChatParams { max_tokens: request.max_tokens, temperature: request.temperature, top_k: request.top_k },
    )
    .await?;
  Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct SearchContextRequest {
  pub query: String,
  pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchContextResponse {
  pub documents: Vec<vaultstore_core::models::ContextDocument>,
  pub count: usize,
}

pub async fn search_context(
  State(state): State<AppState>,
  Json(request): Json<SearchContextRequest>,
) -> Result<impl IntoResponse, AppError> {
  let rag = state.rag()?;
  let top_k = request.top_k.filter(|k| *k > 0).unwrap_or(state.config().rag.default_top_k);
  let documents = rag.search_context(&request.query, top_k).await?;
  let count = documents.len();
  Ok(Json(SearchContextResponse { documents, count }))
}
