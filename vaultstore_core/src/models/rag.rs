use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query-time projection of a vector surfaced as retrieval context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextDocument {
  pub id: String,
  pub content: String,
  pub metadata: Value,
  pub score: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub source: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub chunk_index: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
  pub prompt_tokens: u32,
  pub completion_tokens: u32,
  pub total_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
  pub index: u32,
  pub message: ChatMessageOut,
  pub finish_reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageOut {
  pub role: String,
  pub content: String,
}

/// Chat-completion-shaped response envelope returned by the RAG
/// orchestrator, per §4.5 step 6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
  pub id: String,
  pub object: String,
  pub created: i64,
  pub model: String,
  pub choices: Vec<ChatChoice>,
  pub usage: TokenUsage,
  pub context: ContextBundle,
  pub process_time_ms: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextBundle {
  pub documents: Vec<ContextDocument>,
}
