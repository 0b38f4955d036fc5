use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use tracing::warn;
use vaultstore_core::{
  error::CoreError,
  models::vector::{cosine_score, is_own_or_chunk_of},
  models::{ScoredVector, VectorRecord},
};

use super::VectorIndex;

/// Storage-mode selection from §4.1. Chosen once at startup; accelerated
/// search that hits a missing ANN operator degrades to exact for that call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorIndexMode {
  Accelerated,
  Exact,
}

/// SQLite-backed vector index. Embeddings are persisted as JSON arrays of
/// doubles (portability over density, per §4.1) in a single `vectors` table;
/// accelerated mode layers an ANN `ORDER BY` on top of the same table and
/// falls back to an in-process scan when the operator isn't available.
pub struct SqliteVectorIndex {
  pool: SqlitePool,
  configured_dimension: usize,
  mode: VectorIndexMode,
  accelerated_unavailable: AtomicBool,
}

impl SqliteVectorIndex {
  pub async fn connect(db_path: &str, configured_dimension: usize, mode: VectorIndexMode) -> Result<Self, CoreError> {
    vaultstore_core::models::vector::validate_configured_dimension(configured_dimension)?;

    let url = format!("sqlite://{db_path}?mode=rwc");
    let pool = SqlitePoolOptions::new()
      .max_connections(8)
      .connect(&url)
      .await
      .map_err(|e| CoreError::InternalError(format!("failed to open vector db: {e}")))?;

    sqlx::query(
      "CREATE TABLE IF NOT EXISTS vectors (\
         id TEXT PRIMARY KEY, \
         embedding TEXT NOT NULL, \
         metadata TEXT NOT NULL, \
         dimensions INTEGER NOT NULL, \
         rowid_seq INTEGER)",
    )
    .execute(&pool)
    .await
    .map_err(|e| CoreError::InternalError(format!("failed to create vectors table: {e}")))?;

    Ok(Self { pool, configured_dimension, mode, accelerated_unavailable: AtomicBool::new(false) })
  }

  fn decode_metadata(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::json!({ "raw": raw }))
  }

  fn decode_embedding(raw: &str) -> Option<Vec<f64>> {
    serde_json::from_str(raw).ok()
  }

  async fn next_seq(&self) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COALESCE(MAX(rowid_seq), 0) + 1 AS next FROM vectors")
      .fetch_one(&self.pool)
      .await?;
    Ok(row.get("next"))
  }

  /// Attempts the ANN `distance_cosine` SQL operator. Absent in a stock
  /// SQLite build, so this only succeeds when a vector extension is loaded.
  async fn accelerated_search(&self, query_json: &str, top_k: i64) -> Result<Vec<(String, String, String)>, sqlx::Error> {
    let rows = sqlx::query(
      "SELECT id, embedding, metadata FROM vectors WHERE dimensions = ?1 \
       ORDER BY distance_cosine(embedding, ?2) ASC LIMIT ?3",
    )
    .bind(self.configured_dimension as i64)
    .bind(query_json)
    .bind(top_k)
    .fetch_all(&self.pool)
    .await?;

    Ok(
      rows
        .into_iter()
        .map(|r| (r.get::<String, _>("id"), r.get::<String, _>("embedding"), r.get::<String, _>("metadata")))
        .collect(),
    )
  }

  async fn exact_search(&self, query: &[f64], top_k: usize) -> Result<Vec<ScoredVector>, CoreError> {
    let rows = sqlx::query("SELECT id, embedding, metadata, rowid_seq FROM vectors WHERE dimensions = ?1 ORDER BY rowid_seq ASC")
      .bind(self.configured_dimension as i64)
      .fetch_all(&self.pool)
      .await
      .map_err(|e| CoreError::InternalError(format!("vector scan failed: {e}")))?;

    let mut scored: Vec<(usize, ScoredVector)> = Vec::with_capacity(rows.len());
    for (insertion_order, row) in rows.iter().enumerate() {
      let id: String = row.get("id");
      let embedding_raw: String = row.get("embedding");
      let metadata_raw: String = row.get("metadata");

      let Some(embedding) = Self::decode_embedding(&embedding_raw) else {
        warn!(id = %id, "skipping vector with unreadable embedding");
        continue;
      };
      let score = cosine_score(query, &embedding);
      let metadata = Self::decode_metadata(&metadata_raw);
      scored.push((insertion_order, ScoredVector { vector: VectorRecord { id, embedding, metadata }, score }));
    }

    scored.sort_by(|a, b| {
      b.1.score
        .partial_cmp(&a.1.score)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then(a.0.cmp(&b.0))
    });
    scored.truncate(top_k);
    Ok(scored.into_iter().map(|(_, sv)| sv).collect())
  }
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
  async fn store(&self, record: VectorRecord) -> Result<(), CoreError> {
    record.validate(self.configured_dimension)?;

    let embedding_json = serde_json::to_string(&record.embedding)
      .map_err(|e| CoreError::InternalError(format!("serialize embedding: {e}")))?;
    let metadata_json = serde_json::to_string(&record.metadata)
      .map_err(|e| CoreError::InternalError(format!("serialize metadata: {e}")))?;
    let seq = self.next_seq().await.map_err(|e| CoreError::InternalError(format!("vector db error: {e}")))?;

    sqlx::query(
      "INSERT INTO vectors (id, embedding, metadata, dimensions, rowid_seq) VALUES (?1, ?2, ?3, ?4, ?5) \
       ON CONFLICT(id) DO UPDATE SET embedding = excluded.embedding, metadata = excluded.metadata, \
       dimensions = excluded.dimensions",
    )
    .bind(&record.id)
    .bind(&embedding_json)
    .bind(&metadata_json)
    .bind(self.configured_dimension as i64)
    .bind(seq)
    .execute(&self.pool)
    .await
    .map_err(|e| CoreError::InternalError(format!("vector store failed: {e}")))?;

    Ok(())
  }

  async fn search(&self, query: &[f64], top_k: usize) -> Result<Vec<ScoredVector>, CoreError> {
    if top_k == 0 {
      return Err(CoreError::InvalidParameter {
        name: "top_k".to_string(),
        reason: "must be greater than 0".to_string(),
      });
    }
    if query.len() != self.configured_dimension {
      return Err(CoreError::DimensionMismatch { expected: self.configured_dimension, got: query.len() });
    }

    if self.mode == VectorIndexMode::Accelerated && !self.accelerated_unavailable.load(Ordering::Relaxed) {
      let query_json = serde_json::to_string(query).map_err(|e| CoreError::InternalError(format!("serialize query: {e}")))?;
      match self.accelerated_search(&query_json, top_k as i64).await {
        Ok(rows) => {
          return Ok(
            rows
              .into_iter()
              .map(|(id, embedding_raw, metadata_raw)| {
                let embedding = Self::decode_embedding(&embedding_raw).unwrap_or_default();
                let score = cosine_score(query, &embedding);
                ScoredVector { vector: VectorRecord { id, embedding, metadata: Self::decode_metadata(&metadata_raw) }, score }
              })
              .collect(),
          );
        }
        Err(e) => {
          warn!(error = %e, "accelerated vector search unavailable, falling back to exact scan");
          self.accelerated_unavailable.store(true, Ordering::Relaxed);
        }
      }
    }

    self.exact_search(query, top_k).await
  }

  async fn delete(&self, id: &str) -> Result<(), CoreError> {
    let rows = sqlx::query("SELECT id FROM vectors")
      .fetch_all(&self.pool)
      .await
      .map_err(|e| CoreError::InternalError(format!("vector scan failed: {e}")))?;

    let victims: Vec<String> = rows
      .into_iter()
      .map(|r| r.get::<String, _>("id"))
      .filter(|candidate| is_own_or_chunk_of(candidate, id))
      .collect();

    if victims.is_empty() {
      return Err(CoreError::ObjectNotFound { bucket: "vectors".to_string(), key: id.to_string() });
    }

    let mut tx = self.pool.begin().await.map_err(|e| CoreError::InternalError(format!("vector db error: {e}")))?;
    for victim in victims {
      sqlx::query("DELETE FROM vectors WHERE id = ?1")
        .bind(victim)
        .execute(&mut *tx)
        .await
        .map_err(|e| CoreError::InternalError(format!("vector delete failed: {e}")))?;
    }
    tx.commit().await.map_err(|e| CoreError::InternalError(format!("vector db error: {e}")))?;
    Ok(())
  }

  async fn get(&self, id: &str) -> Result<Option<VectorRecord>, CoreError> {
    let row = sqlx::query("SELECT embedding, metadata FROM vectors WHERE id = ?1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| CoreError::InternalError(format!("vector lookup failed: {e}")))?;

    let Some(row) = row else { return Ok(None) };
    let embedding_raw: String = row.get("embedding");
    let metadata_raw: String = row.get("metadata");
    let Some(embedding) = Self::decode_embedding(&embedding_raw) else {
      warn!(id, "vector has unreadable embedding");
      return Ok(None);
    };
    Ok(Some(VectorRecord { id: id.to_string(), embedding, metadata: Self::decode_metadata(&metadata_raw) }))
  }

  fn configured_dimension(&self) -> usize {
    self.configured_dimension
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  async fn index() -> SqliteVectorIndex {
    let dir = tempdir().unwrap();
    let path = dir.keep().join("vector.db");
    SqliteVectorIndex::connect(path.to_str().unwrap(), 3, VectorIndexMode::Exact).await.unwrap()
  }

  #[tokio::test]
  async fn store_then_get_round_trips() {
    let idx = index().await;
    let record = VectorRecord { id: "a".to_string(), embedding: vec![1.0, 0.0, 0.0], metadata: serde_json::json!({}) };
    idx.store(record.clone()).await.unwrap();
    let got = idx.get("a").await.unwrap().unwrap();
    assert_eq!(got.embedding, record.embedding);
  }

  #[tokio::test]
  async fn store_same_id_replaces() {
    let idx = index().await;
    idx.store(VectorRecord { id: "a".to_string(), embedding: vec![1.0, 0.0, 0.0], metadata: serde_json::json!({}) })
      .await
      .unwrap();
    idx.store(VectorRecord { id: "a".to_string(), embedding: vec![0.0, 1.0, 0.0], metadata: serde_json::json!({}) })
      .await
      .unwrap();
    let got = idx.get("a").await.unwrap().unwrap();
    assert_eq!(got.embedding, vec![0.0, 1.0, 0.0]);
  }

  #[tokio::test]
  async fn search_orders_by_score_descending() {
    let idx = index().await;
    idx.store(VectorRecord { id: "close".to_string(), embedding: vec![1.0, 0.0, 0.0], metadata: serde_json::json!({}) })
      .await
      .unwrap();
    idx.store(VectorRecord { id: "far".to_string(), embedding: vec![0.0, 1.0, 0.0], metadata: serde_json::json!({}) })
      .await
      .unwrap();

    let results = idx.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
    assert_eq!(results[0].vector.id, "close");
    assert!(results[0].score >= results[1].score);
  }

  #[tokio::test]
  async fn search_respects_top_k() {
    let idx = index().await;
    for i in 0..5 {
      idx.store(VectorRecord {
        id: format!("v{i}"),
        embedding: vec![1.0, i as f64, 0.0],
        metadata: serde_json::json!({}),
      })
      .await
      .unwrap();
    }
    let results = idx.search(&[1.0, 0.0, 0.0], 3).await.unwrap();
    assert_eq!(results.len(), 3);
  }

  #[tokio::test]
  async fn delete_removes_chunk_children() {
    let idx = index().await;
    idx.store(VectorRecord { id: "doc".to_string(), embedding: vec![1.0, 0.0, 0.0], metadata: serde_json::json!({}) })
      .await
      .unwrap();
    idx.store(VectorRecord {
      id: "doc_chunk_0".to_string(),
      embedding: vec![1.0, 0.0, 0.0],
      metadata: serde_json::json!({}),
    })
    .await
    .unwrap();

    idx.delete("doc").await.unwrap();
    assert!(idx.get("doc").await.unwrap().is_none());
    assert!(idx.get("doc_chunk_0").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn dimension_mismatch_rejected() {
    let idx = index().await;
    let result = idx
      .store(VectorRecord { id: "a".to_string(), embedding: vec![1.0, 0.0], metadata: serde_json::json!({}) })
      .await;
    assert!(matches!(result, Err(CoreError::DimensionMismatch { expected: 3, got: 2 })));
  }

  #[tokio::test]
  async fn search_with_mismatched_query_dimension_is_rejected() {
    let idx = index().await;
    let result = idx.search(&[1.0, 0.0], 1).await;
    assert!(matches!(result, Err(CoreError::DimensionMismatch { expected: 3, got: 2 })));
  }
}
