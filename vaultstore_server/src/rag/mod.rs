//! RAG Orchestrator (§4.5): query -> embed -> vector search -> context
//! assembly -> generate -> chat-completion-shaped response.

use std::{sync::Arc, time::Instant};

use chrono::Utc;
use uuid::Uuid;
use vaultstore_ai::{AiProvider, EmbeddingProvider, GenerationProvider, Message};
use vaultstore_core::{
  error::CoreError,
  models::{ChatChoice, ChatMessageOut, ChatResponse, ContextBundle, ContextDocument, TokenUsage},
};

use crate::{config::RagConfig, vector::VectorIndex};

pub struct RagOrchestrator {
  ai: Arc<AiProvider>,
  vector_index: Arc<dyn VectorIndex>,
  config: RagConfig,
}

#[derive(Debug, Clone, Default)]
pub struct ChatParams {
  pub max_tokens: Option<u32>,
  pub temperature: Option<f32>,
  pub top_k: Option<usize>,
}

impl RagOrchestrator {
  pub fn new(ai: Arc<AiProvider>, vector_index: Arc<dyn VectorIndex>, config: RagConfig) -> Self {
    Self { ai, vector_index, config }
  }

  /// Step 2: embed the query, search, drop anything below
  /// `min_relevance_score`, project to context documents.
  pub async fn search_context(&self, query: &str, top_k: usize) -> Result<Vec<ContextDocument>, CoreError> {
    let embedding = self.ai.embed(query, self.config_timeout()).await?;
    let scored = self.vector_index.search(&embedding, top_k).await?;

    Ok(
      scored
        .into_iter()
        .filter(|sv| sv.score >= self.config.min_relevance_score)
        .map(|sv| {
          let content = sv.vector.metadata.get("content").and_then(|v| v.as_str()).unwrap_or("").to_string();
          let source = sv.vector.metadata.get("source").and_then(|v| v.as_str()).map(|s| s.to_string());
          let chunk_index = sv.vector.metadata.get("chunk_index").and_then(|v| v.as_i64());
          ContextDocument { id: sv.vector.id, content, metadata: sv.vector.metadata, score: sv.score, source, chunk_index }
        })
        .collect(),
    )
  }

  /// Step 3: `"## Context Information\n### Document 1\n..."`. Omitted
  /// entirely when no documents survive the relevance filter.
  fn build_context_string(documents: &[ContextDocument]) -> String {
    if documents.is_empty() {
      return String::new();
    }
    let mut out = String::from("## Context Information\n");
    for (i, doc) in documents.iter().enumerate() {
      out.push_str(&format!("### Document {}\n", i + 1));
      if let Some(source) = &doc.source {
        out.push_str(&format!("Source: {source}\n"));
      }
      out.push_str(&doc.content);
      out.push('\n');
    }
    out
  }

  /// Step 4: `"{system_prompt}\n{context}\n\n## Question\n{query}\n\n## Answer"`.
  fn build_prompt(&self, context: &str, query: &str) -> String {
    format!("{}\n{}\n\n## Question\n{}\n\n## Answer", self.config.system_prompt, context, query)
  }

  fn config_timeout(&self) -> std::time::Duration {
    std::time::Duration::from_secs(30)
  }

  /// Full algorithm from §4.5. Fails the whole call on any step failure —
  /// RAG never partially answers.
  pub async fn chat(&self, query: &str, params: ChatParams) -> Result<ChatResponse, CoreError> {
    let started = Instant::now();

    let top_k = params.top_k.filter(|k| *k > 0).unwrap_or(self.config.default_top_k);
    let max_tokens = params.max_tokens.filter(|m| *m > 0).unwrap_or(self.config.default_max_tokens);
    let temperature = params.temperature.filter(|t| *t > 0.0).unwrap_or(self.config.default_temperature);

    let documents = self.search_context(query, top_k).await?;
    let context = Self::build_context_string(&documents);
    let prompt = self.build_prompt(&context, query);

    let messages = vec![Message::user(prompt)];
    let generated = self.ai.generate(&messages, max_tokens, temperature, self.config_timeout()).await?;

    Ok(ChatResponse {
      id: format!("chatcmpl-{}", Uuid::new_v4()),
      object: "chat.completion".to_string(),
      created: Utc::now().timestamp(),
      model: generated.model.clone(),
      choices: vec![ChatChoice {
        index: 0,
        message: ChatMessageOut { role: "assistant".to_string(), content: generated.text },
        finish_reason: "stop".to_string(),
      }],
      usage: TokenUsage {
        prompt_tokens: generated.usage.prompt_tokens,
        completion_tokens: generated.usage.completion_tokens,
        total_tokens: generated.usage.total_tokens,
      },
      context: ContextBundle { documents },
      process_time_ms: started.elapsed().as_millis(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn build_context_string_is_empty_when_no_documents() {
    assert_eq!(RagOrchestrator::build_context_string(&[]), "");
  }

  #[test]
  fn build_context_string_numbers_documents() {
    let docs = vec![
      ContextDocument {
        id: "a".to_string(),
        content: "first".to_string(),
        metadata: serde_json::json!({}),
        score: 0.9,
        source: Some("doc.txt".to_string()),
        chunk_index: None,
      },
      ContextDocument {
        id: "b".to_string(),
        content: "second".to_string(),
        metadata: serde_json::json!({}),
        score: 0.8,
        source: None,
        chunk_index: None,
      },
    ];
    let context = RagOrchestrator::build_context_string(&docs);
    assert!(context.starts_with("## Context Information\n"));
    assert!(context.contains("### Document 1\nSource: doc.txt\nfirst\n"));
    assert!(context.contains("### Document 2\nsecond\n"));
  }
}
