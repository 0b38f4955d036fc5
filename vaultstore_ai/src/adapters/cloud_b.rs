use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;
use vaultstore_core::error::CoreError;

use crate::{EmbeddingProvider, GenerationProvider, GenerationResult, Message};

/// Placeholder for a second hosted provider tag. Wiring `ai.provider:
/// cloud-B` never fails at startup — only calling `embed`/`generate` does,
/// per the redesign flag in §9: unimplemented variants surface
/// `NotImplemented` at call time, not at wiring time.
pub struct CloudBAdapter;

impl CloudBAdapter {
  pub fn new() -> Self {
    Self
  }
}

impl Default for CloudBAdapter {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl EmbeddingProvider for CloudBAdapter {
  async fn embed(&self, _text: &str, _timeout: Duration) -> Result<Vec<f64>, CoreError> {
    warn!("cloud-B provider not implemented, using default");
    Err(CoreError::NotImplemented("cloud-B embedding provider".to_string()))
  }
}

#[async_trait]
impl GenerationProvider for CloudBAdapter {
  async fn generate(
    &self,
    _messages: &[Message],
    _max_tokens: u32,
    _temperature: f32,
    _timeout: Duration,
  ) -> Result<GenerationResult, CoreError> {
    warn!("cloud-B provider not implemented, using default");
    Err(CoreError::NotImplemented("cloud-B generation provider".to_string()))
  }
}
