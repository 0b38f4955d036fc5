use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use vaultstore_core::error::CoreError;

use crate::{validate_text, EmbeddingProvider, GenerationProvider, GenerationResult, Message, TokenUsage};

/// Adapter for an OpenAI-shaped hosted chat+embeddings API.
pub struct CloudAAdapter {
  base_url: String,
  api_key: String,
  embed_model: String,
  chat_model: String,
  client: Client,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
  model: &'a str,
  messages: Vec<ChatMessage>,
  max_tokens: u32,
  temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
  role: String,
  content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
  model: String,
  choices: Vec<Choice>,
  usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
  message: ChatMessage,
}

#[derive(Deserialize)]
struct Usage {
  prompt_tokens: u32,
  completion_tokens: u32,
  total_tokens: u32,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
  model: &'a str,
  input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
  data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
  embedding: Vec<f64>,
}

impl CloudAAdapter {
  pub fn new(
    api_key: impl Into<String>,
    embed_model: impl Into<String>,
    chat_model: impl Into<String>,
    base_url: Option<String>,
  ) -> Self {
    Self {
      base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
      api_key: api_key.into(),
      embed_model: embed_model.into(),
      chat_model: chat_model.into(),
      client: Client::new(),
    }
  }
}

#[async_trait]
impl EmbeddingProvider for CloudAAdapter {
  async fn embed(&self, text: &str, timeout: Duration) -> Result<Vec<f64>, CoreError> {
    validate_text(text)?;

    let response = self
      .client
      .post(format!("{}/embeddings", self.base_url))
      .header("Authorization", format!("Bearer {}", self.api_key))
      .json(&EmbeddingRequest { model: &self.embed_model, input: text })
      .timeout(timeout)
      .send()
      .await
      .map_err(|e| CoreError::ProviderUnavailable(e.to_string()))?;

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      return Err(CoreError::ProviderUnavailable(format!(
        "cloud-A embedding provider returned {status}: {body}"
      )));
    }

    let body: EmbeddingResponse = response
      .json()
      .await
      .map_err(|e| CoreError::ProviderUnavailable(format!("invalid embedding response: {e}")))?;

    let embedding = body
      .data
      .into_iter()
      .next()
      .map(|d| d.embedding)
      .ok_or_else(|| CoreError::ProviderUnavailable("empty".to_string()))?;

    if embedding.is_empty() {
      return Err(CoreError::ProviderUnavailable("empty".to_string()));
    }
    Ok(embedding)
  }
}

#[async_trait]
impl GenerationProvider for CloudAAdapter {
  async fn generate(
    &self,
    messages: &[Message],
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
  ) -> Result<GenerationResult, CoreError> {
    let request = ChatCompletionRequest {
      model: &self.chat_model,
      messages: messages
        .iter()
        .map(|m| ChatMessage { role: m.role.as_str().to_string(), content: m.content.clone() })
        .collect(),
      max_tokens,
      temperature,
    };

    let response = self
      .client
      .post(format!("{}/chat/completions", self.base_url))
      .header("Authorization", format!("Bearer {}", self.api_key))
      .json(&request)
      .timeout(timeout)
      .send()
      .await
      .map_err(|e| CoreError::ProviderUnavailable(e.to_string()))?;

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      return Err(CoreError::ProviderUnavailable(format!(
        "cloud-A generation provider returned {status}: {body}"
      )));
    }

    let mut body: ChatCompletionResponse = response
      .json()
      .await
      .map_err(|e| CoreError::ProviderUnavailable(format!("invalid chat response: {e}")))?;

    let choice = body
      .choices
      .pop()
      .ok_or_else(|| CoreError::ProviderUnavailable("empty".to_string()))?;

    if choice.message.content.is_empty() {
      return Err(CoreError::ProviderUnavailable("empty".to_string()));
    }

    let usage = body.usage.map(|u| TokenUsage {
      prompt_tokens: u.prompt_tokens,
      completion_tokens: u.completion_tokens,
      total_tokens: u.total_tokens,
    });

    Ok(GenerationResult {
      text: choice.message.content,
      model: body.model,
      usage: usage.unwrap_or_default(),
    })
  }
}
