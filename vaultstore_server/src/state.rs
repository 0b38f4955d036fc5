//! Application state container: a cheaply-cloneable handle wrapping an
//! `Arc` over the actually-shared internals, plus an async constructor
//! that performs all collaborator wiring up front.

use std::sync::Arc;

use vaultstore_ai::{
  adapters::{cloud_a::CloudAAdapter, cloud_b::CloudBAdapter, local::LocalSelfHostedAdapter},
  AiProvider,
};
use vaultstore_core::error::CoreError;

use crate::{
  config::{AiProviderTag, AppConfig, AuthDriver, StorageDriver},
  error::AppError,
  indexing::IndexingPipeline,
  ingestion::IngestionHook,
  rag::RagOrchestrator,
  storage::{FilesystemObjectStore, ObjectStore},
  vector::{SqliteVectorIndex, VectorIndex, VectorIndexMode},
};

#[derive(Clone)]
pub struct AppState {
  inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
  pub config: AppConfig,
  pub object_store: Arc<dyn ObjectStore>,
  pub vector_index: Option<Arc<dyn VectorIndex>>,
  pub ai: Option<Arc<AiProvider>>,
  pub indexing: Option<Arc<IndexingPipeline>>,
  pub ingestion_hook: Option<Arc<IngestionHook>>,
  pub rag: Option<Arc<RagOrchestrator>>,
  pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
  pub fn config(&self) -> &AppConfig {
    &self.inner.config
  }

  pub fn object_store(&self) -> &Arc<dyn ObjectStore> {
    &self.inner.object_store
  }

  pub fn vector_index(&self) -> Result<&Arc<dyn VectorIndex>, CoreError> {
    self.inner.vector_index.as_ref().ok_or_else(|| CoreError::ProviderUnavailable("vector index disabled".to_string()))
  }

  pub fn indexing(&self) -> Option<&Arc<IndexingPipeline>> {
    self.inner.indexing.as_ref()
  }

  pub fn ingestion_hook(&self) -> Option<&Arc<IngestionHook>> {
    self.inner.ingestion_hook.as_ref()
  }

  pub fn rag(&self) -> Result<&Arc<RagOrchestrator>, CoreError> {
    self.inner.rag.as_ref().ok_or_else(|| CoreError::ProviderUnavailable("RAG orchestrator disabled".to_string()))
  }

  pub fn ai(&self) -> Result<&Arc<AiProvider>, CoreError> {
    self.inner.ai.as_ref().ok_or_else(|| CoreError::ProviderUnavailable("AI provider disabled".to_string()))
  }

  pub fn ai_enabled(&self) -> bool {
    self.inner.ai.is_some()
  }

  pub fn started_at(&self) -> chrono::DateTime<chrono::Utc> {
    self.inner.started_at
  }

  /// Wires every collaborator from config: object store, (optional) vector
  /// index + AI provider + indexing pipeline + ingestion hook + RAG
  /// orchestrator. Only `StorageDriver::Filesystem` is implemented; other
  /// drivers fail fast at startup rather than silently falling back.
  pub async fn try_new(config: AppConfig) -> Result<Self, AppError> {
    let object_store: Arc<dyn ObjectStore> = match config.storage.driver {
      StorageDriver::Filesystem => Arc::new(FilesystemObjectStore::new(&config.storage.base_path)?),
      StorageDriver::Memory => {
        return Err(AppError::Config("storage.driver = memory is not implemented".to_string()));
      }
      StorageDriver::S3 => {
        return Err(AppError::Config("storage.driver = s3 is not implemented".to_string()));
      }
    };

    if config.auth.enabled && config.auth.driver == AuthDriver::Jwt {
      return Err(AppError::Config("auth.driver = jwt is not implemented".to_string()));
    }

    let (vector_index, ai, indexing, ingestion_hook, rag) = if config.vector.enabled {
      let vector_index: Arc<dyn VectorIndex> = Arc::new(
        SqliteVectorIndex::connect(
          config.vector.db_path.to_string_lossy().as_ref(),
          config.vector.dimension,
          VectorIndexMode::Accelerated,
        )
        .await?,
      );

      let ai = if config.ai.enabled { Some(Arc::new(build_ai_provider(&config))) } else { None };

      let (indexing, ingestion_hook) = if let Some(ai) = ai.clone() {
        let pipeline = Arc::new(IndexingPipeline::new(config.indexing.clone(), ai, Arc::clone(&vector_index)));
        let hook = Arc::new(IngestionHook::new(Arc::clone(&pipeline)));
        (Some(pipeline), Some(hook))
      } else {
        (None, None)
      };

      let rag = ai.clone().map(|ai| Arc::new(RagOrchestrator::new(ai, Arc::clone(&vector_index), config.rag.clone())));

      (Some(vector_index), ai, indexing, ingestion_hook, rag)
    } else {
      (None, None, None, None, None)
    };

    Ok(Self {
      inner: Arc::new(AppStateInner {
        config,
        object_store,
        vector_index,
        ai,
        indexing,
        ingestion_hook,
        rag,
        started_at: chrono::Utc::now(),
      }),
    })
  }

  /// Starts the indexing worker pool + cleanup task, if indexing is wired.
  pub fn start_background_tasks(&self) -> Vec<tokio::task::JoinHandle<()>> {
    match &self.inner.indexing {
      Some(pipeline) => pipeline.start(),
      None => Vec::new(),
    }
  }
}

fn build_ai_provider(config: &AppConfig) -> AiProvider {
  match config.ai.provider {
    AiProviderTag::LocalSelfHosted => {
      let base_url = config.ai.base_url.clone().unwrap_or_else(|| "http://localhost:11434".to_string());
      AiProvider::LocalSelfHosted(LocalSelfHostedAdapter::new(
        base_url,
        config.ai.embed_model.clone(),
        config.ai.chat_model.clone(),
      ))
    }
    AiProviderTag::CloudA => AiProvider::CloudA(CloudAAdapter::new(
      config.ai.api_key.clone().unwrap_or_default(),
      config.ai.embed_model.clone(),
      config.ai.chat_model.clone(),
      config.ai.base_url.clone(),
    )),
    AiProviderTag::CloudB => AiProvider::CloudB(CloudBAdapter::new()),
  }
}
