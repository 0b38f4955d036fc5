use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use vaultstore_core::error::CoreError;

use crate::{
  estimate_tokens, flatten_messages, validate_text, EmbeddingProvider, GenerationProvider,
  GenerationResult, Message, TokenUsage,
};

/// Adapter for a self-hosted model server reachable over HTTP (grounded on
/// the local-daemon shape: a chat endpoint and a separate embeddings
/// endpoint, both accepting a bare `model` + prompt/messages body).
pub struct LocalSelfHostedAdapter {
  base_url: String,
  embed_model: String,
  chat_model: String,
  client: Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
  model: &'a str,
  messages: Vec<ChatMessage>,
  stream: bool,
  options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
  temperature: f32,
  num_predict: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
  role: String,
  content: String,
}

#[derive(Deserialize)]
struct ChatResponseBody {
  message: ChatMessage,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
  model: &'a str,
  prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponseBody {
  embedding: Vec<f64>,
}

impl LocalSelfHostedAdapter {
  pub fn new(base_url: impl Into<String>, embed_model: impl Into<String>, chat_model: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into(),
      embed_model: embed_model.into(),
      chat_model: chat_model.into(),
      client: Client::new(),
    }
  }

  pub fn new_default_local(embed_model: impl Into<String>, chat_model: impl Into<String>) -> Self {
    Self::new("http://localhost:11434", embed_model, chat_model)
  }
}

#[async_trait]
impl EmbeddingProvider for LocalSelfHostedAdapter {
  async fn embed(&self, text: &str, timeout: Duration) -> Result<Vec<f64>, CoreError> {
    validate_text(text)?;

    let url = format!("{}/api/embeddings", self.base_url);
    let response = self
      .client
      .post(url)
      .json(&EmbedRequest { model: &self.embed_model, prompt: text })
      .timeout(timeout)
      .send()
      .await
      .map_err(|e| CoreError::ProviderUnavailable(e.to_string()))?;

    if !response.status().is_success() {
      let status = response.status();
      return Err(CoreError::ProviderUnavailable(format!(
        "local embedding provider returned status {status}"
      )));
    }

    let body: EmbedResponseBody = response
      .json()
      .await
      .map_err(|e| CoreError::ProviderUnavailable(format!("invalid embedding response: {e}")))?;

    if body.embedding.is_empty() {
      return Err(CoreError::ProviderUnavailable("empty".to_string()));
    }
    Ok(body.embedding)
  }
}

#[async_trait]
impl GenerationProvider for LocalSelfHostedAdapter {
  async fn generate(
    &self,
    messages: &[Message],
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
  ) -> Result<GenerationResult, CoreError> {
    let url = format!("{}/api/chat", self.base_url);
    let request = ChatRequest {
      model: &self.chat_model,
      messages: messages
        .iter()
        .map(|m| ChatMessage { role: m.role.as_str().to_string(), content: m.content.clone() })
        .collect(),
      stream: false,
      options: ChatOptions { temperature, num_predict: max_tokens },
    };

    let response = self
      .client
      .post(url)
      .json(&request)
      .timeout(timeout)
      .send()
      .await
      .map_err(|e| CoreError::ProviderUnavailable(e.to_string()))?;

    if !response.status().is_success() {
      let status = response.status();
      return Err(CoreError::ProviderUnavailable(format!(
        "local generation provider returned status {status}"
      )));
    }

    let body: ChatResponseBody = response
      .json()
      .await
      .map_err(|e| CoreError::ProviderUnavailable(format!("invalid chat response: {e}")))?;

    if body.message.content.is_empty() {
      return Err(CoreError::ProviderUnavailable("empty".to_string()));
    }

    let prompt_text = flatten_messages(messages);
    Ok(GenerationResult {
      usage: TokenUsage {
        prompt_tokens: estimate_tokens(&prompt_text),
        completion_tokens: estimate_tokens(&body.message.content),
        total_tokens: estimate_tokens(&prompt_text) + estimate_tokens(&body.message.content),
      },
      text: body.message.content,
      model: self.chat_model.clone(),
    })
  }
}
