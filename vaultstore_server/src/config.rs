//! # Configuration
//!
//! **Responsibility**: Single source of truth for server configuration.
//! **Principle**: layered loading (env override -> file search -> defaults),
//! scoped to the fields this system actually needs.

use std::{env, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub server: ServerConfig,
  pub storage: StorageConfig,
  pub auth: AuthConfig,
  pub vector: VectorConfig,
  pub ai: AiConfig,
  pub indexing: IndexingConfig,
  pub rag: RagConfig,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      server: ServerConfig::default(),
      storage: StorageConfig::default(),
      auth: AuthConfig::default(),
      vector: VectorConfig::default(),
      ai: AiConfig::default(),
      indexing: IndexingConfig::default(),
      rag: RagConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host: String,
  pub port: u16,
  pub read_timeout_secs: u64,
  pub write_timeout_secs: u64,
  pub idle_timeout_secs: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host: "0.0.0.0".to_string(),
      port: 9000,
      read_timeout_secs: 30,
      write_timeout_secs: 30,
      idle_timeout_secs: 60,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
  Filesystem,
  Memory,
  S3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
  pub driver: StorageDriver,
  pub base_path: PathBuf,
}

impl Default for StorageConfig {
  fn default() -> Self {
    Self { driver: StorageDriver::Filesystem, base_path: PathBuf::from("./data/objects") }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthDriver {
  Signature,
  Jwt,
  None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
  pub enabled: bool,
  pub driver: AuthDriver,
  pub default_access_key: String,
  pub default_secret_key: String,
}

impl Default for AuthConfig {
  fn default() -> Self {
    Self {
      enabled: false,
      driver: AuthDriver::None,
      default_access_key: "vaultstore".to_string(),
      default_secret_key: "change-me".to_string(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
  pub enabled: bool,
  pub db_path: PathBuf,
  pub dimension: usize,
}

impl Default for VectorConfig {
  fn default() -> Self {
    Self { enabled: true, db_path: PathBuf::from("./data/vector.db"), dimension: 384 }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AiProviderTag {
  LocalSelfHosted,
  CloudA,
  CloudB,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
  pub enabled: bool,
  pub provider: AiProviderTag,
  pub base_url: Option<String>,
  pub api_key: Option<String>,
  pub embed_model: String,
  pub chat_model: String,
  pub timeout_secs: u64,
}

impl AiConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

impl Default for AiConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      provider: AiProviderTag::LocalSelfHosted,
      base_url: None,
      api_key: None,
      embed_model: "nomic-embed-text".to_string(),
      chat_model: "llama3.2".to_string(),
      timeout_secs: 30,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
  pub enabled: bool,
  pub workers: usize,
  pub queue_size: usize,
  pub max_retries: u32,
  pub retry_delay_secs: u64,
  pub cleanup_after_secs: u64,
  pub status_enabled: bool,
}

impl IndexingConfig {
  pub fn retry_delay(&self) -> Duration {
    Duration::from_secs(self.retry_delay_secs)
  }
  pub fn cleanup_after(&self) -> chrono::Duration {
    chrono::Duration::seconds(self.cleanup_after_secs as i64)
  }
}

impl Default for IndexingConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      workers: 3,
      queue_size: 1000,
      max_retries: 3,
      retry_delay_secs: 5,
      cleanup_after_secs: 7 * 24 * 3600,
      status_enabled: true,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
  pub default_top_k: usize,
  pub default_max_tokens: u32,
  pub default_temperature: f32,
  pub context_window_size: usize,
  pub min_relevance_score: f64,
  pub system_prompt: String,
}

impl Default for RagConfig {
  fn default() -> Self {
    Self {
      default_top_k: 5,
      default_max_tokens: 512,
      default_temperature: 0.7,
      context_window_size: 5,
      min_relevance_score: 0.0,
      system_prompt:
        "You are a helpful assistant. Answer the question using only the provided context. \
         If the context is insufficient, say so explicitly."
          .to_string(),
    }
  }
}

impl AppConfig {
  /// Layered load: `VAULTSTORE_CONFIG` env var override, then a small fixed
  /// search list, then built-in defaults. Individual scalar env vars may
  /// still override fields after the base is loaded.
  pub fn load() -> Result<Self, AppError> {
    let mut config = if let Ok(path) = env::var("VAULTSTORE_CONFIG") {
      Self::from_file(&path)?
    } else {
      Self::search_default_locations()?.unwrap_or_default()
    };

    config.apply_env_overrides();
    Ok(config)
  }

  fn search_default_locations() -> Result<Option<Self>, AppError> {
    let candidates = [
      PathBuf::from("./vaultstore.yml"),
      PathBuf::from("./config/vaultstore.yml"),
      PathBuf::from("/etc/vaultstore/vaultstore.yml"),
    ];
    for path in candidates {
      if path.exists() {
        return Ok(Some(Self::from_file(path.to_string_lossy().as_ref())?));
      }
    }
    Ok(None)
  }

  pub fn from_file(path: &str) -> Result<Self, AppError> {
    let content = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|e| AppError::Config(format!("{path}: {e}")))
  }

  fn apply_env_overrides(&mut self) {
    if let Ok(port) = env::var("VAULTSTORE_PORT") {
      if let Ok(port) = port.parse() {
        self.server.port = port;
      }
    }
    if let Ok(provider) = env::var("VAULTSTORE_AI_PROVIDER") {
      self.ai.provider = match provider.as_str() {
        "cloud-a" => AiProviderTag::CloudA,
        "cloud-b" => AiProviderTag::CloudB,
        _ => AiProviderTag::LocalSelfHosted,
      };
    }
    if let Ok(key) = env::var("VAULTSTORE_AI_API_KEY") {
      self.ai.api_key = Some(key);
    }
    if let Ok(dim) = env::var("VAULTSTORE_VECTOR_DIMENSION") {
      if let Ok(dim) = dim.parse() {
        self.vector.dimension = dim;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_documented_values() {
    let config = AppConfig::default();
    assert_eq!(config.vector.dimension, 384);
    assert_eq!(config.indexing.workers, 3);
    assert_eq!(config.indexing.queue_size, 1000);
    assert_eq!(config.indexing.max_retries, 3);
  }
}
