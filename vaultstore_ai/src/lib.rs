//! # vaultstore_ai
//!
//! **Responsibility**: Stateless adapters to external embedding and
//! generation model providers. Provider selection is a small sum type
//! (`AiProvider`) rather than a trait object wired through a DI container —
//! the unimplemented variant surfaces `NotImplemented` at call time, never
//! at construction time.

pub mod adapters;

use std::time::Duration;

use async_trait::async_trait;
use vaultstore_core::error::CoreError;

pub use adapters::{cloud_a::CloudAAdapter, cloud_b::CloudBAdapter, local::LocalSelfHostedAdapter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  System,
  User,
  Assistant,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Role::System => "system",
      Role::User => "user",
      Role::Assistant => "assistant",
    }
  }
}

#[derive(Debug, Clone)]
pub struct Message {
  pub role: Role,
  pub content: String,
}

impl Message {
  pub fn system(content: impl Into<String>) -> Self {
    Self { role: Role::System, content: content.into() }
  }
  pub fn user(content: impl Into<String>) -> Self {
    Self { role: Role::User, content: content.into() }
  }
}

#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
  pub prompt_tokens: u32,
  pub completion_tokens: u32,
  pub total_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
  pub text: String,
  pub model: String,
  pub usage: TokenUsage,
}

/// Adapter contract for text -> embedding (§4.2).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
  async fn embed(&self, text: &str, timeout: Duration) -> Result<Vec<f64>, CoreError>;
}

/// Adapter contract for messages -> generated text (§4.3).
#[async_trait]
pub trait GenerationProvider: Send + Sync {
  async fn generate(
    &self,
    messages: &[Message],
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
  ) -> Result<GenerationResult, CoreError>;
}

/// Validates a non-empty prompt before any network call, per §4.2.
pub fn validate_text(text: &str) -> Result<(), CoreError> {
  if text.trim().is_empty() {
    return Err(CoreError::InvalidParameter {
      name: "text".to_string(),
      reason: "must not be empty".to_string(),
    });
  }
  Ok(())
}

/// Flattens a message sequence the way a single-prompt provider expects:
/// `"{Role}: {content}\n\n"` per message, trailing `"Assistant: "`.
pub fn flatten_messages(messages: &[Message]) -> String {
  let mut out = String::new();
  for m in messages {
    let role_label = match m.role {
      Role::System => "System",
      Role::User => "User",
      Role::Assistant => "Assistant",
    };
    out.push_str(&format!("{role_label}: {}\n\n", m.content));
  }
  out.push_str("Assistant: ");
  out
}

/// Estimated token usage for providers that don't report real counts:
/// `bytes / 4`, per §4.3.
pub fn estimate_tokens(text: &str) -> u32 {
  (text.len() as u32 / 4).max(1)
}

/// The three recognized provider tags, dispatched as a sum type rather than
/// a trait object so that wiring an unimplemented provider never panics —
/// only calling it does.
pub enum AiProvider {
  LocalSelfHosted(LocalSelfHostedAdapter),
  CloudA(CloudAAdapter),
  CloudB(CloudBAdapter),
}

#[async_trait]
impl EmbeddingProvider for AiProvider {
  async fn embed(&self, text: &str, timeout: Duration) -> Result<Vec<f64>, CoreError> {
    match self {
      AiProvider::LocalSelfHosted(a) => a.embed(text, timeout).await,
      AiProvider::CloudA(a) => a.embed(text, timeout).await,
      AiProvider::CloudB(a) => a.embed(text, timeout).await,
    }
  }
}

#[async_trait]
impl GenerationProvider for AiProvider {
  async fn generate(
    &self,
    messages: &[Message],
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
  ) -> Result<GenerationResult, CoreError> {
    match self {
      AiProvider::LocalSelfHosted(a) => a.generate(messages, max_tokens, temperature, timeout).await,
      AiProvider::CloudA(a) => a.generate(messages, max_tokens, temperature, timeout).await,
      AiProvider::CloudB(a) => a.generate(messages, max_tokens, temperature, timeout).await,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flatten_messages_ends_with_assistant_prompt() {
    let msgs = vec![Message::system("be terse"), Message::user("hi")];
    let flat = flatten_messages(&msgs);
    assert!(flat.starts_with("System: be terse\n\n"));
    assert!(flat.contains("User: hi\n\n"));
    assert!(flat.ends_with("Assistant: "));
  }

  #[test]
  fn estimate_tokens_is_at_least_one() {
    assert_eq!(estimate_tokens(""), 1);
    assert_eq!(estimate_tokens("abcd"), 1);
    assert_eq!(estimate_tokens(&"a".repeat(40)), 10);
  }

  #[test]
  fn validate_text_rejects_blank() {
    assert!(validate_text("   ").is_err());
    assert!(validate_text("hi").is_ok());
  }
}
