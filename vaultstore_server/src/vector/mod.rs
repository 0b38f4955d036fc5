//! Vector Index (§4.1): persistent store mapping vector-id -> (embedding,
//! metadata), with similarity search. Two storage modes per §4.1 — see
//! [`sqlite`] — selected once at startup; behavior is identical from the
//! caller's perspective either way.

pub mod sqlite;

use async_trait::async_trait;
use vaultstore_core::{error::CoreError, models::ScoredVector, models::VectorRecord};

pub use sqlite::{SqliteVectorIndex, VectorIndexMode};

#[async_trait]
pub trait VectorIndex: Send + Sync {
  /// Upserts by `id`. Must be durable before returning `Ok`.
  async fn store(&self, record: VectorRecord) -> Result<(), CoreError>;

  /// At most `top_k` results, `score` descending, ties by insertion order.
  async fn search(&self, query: &[f64], top_k: usize) -> Result<Vec<ScoredVector>, CoreError>;

  /// Also removes chunk-children (`"{id}_chunk_*"`) — delete-by-parent.
  async fn delete(&self, id: &str) -> Result<(), CoreError>;

  async fn get(&self, id: &str) -> Result<Option<VectorRecord>, CoreError>;

  fn configured_dimension(&self) -> usize;
}
