//! Ingestion Hook (§4.6): invoked synchronously by the object store after a
//! successful Put. Decides whether an uploaded object should be chunked and
//! embedded, and submits the indexing job without ever blocking the PUT
//! response on AI capacity.

use std::{collections::BTreeMap, sync::Arc};

use tracing::warn;
use vaultstore_core::{chunking::is_text_eligible, error::CoreError};

use crate::indexing::IndexingPipeline;

pub struct IngestionHook {
  pipeline: Arc<IndexingPipeline>,
}

impl IngestionHook {
  pub fn new(pipeline: Arc<IndexingPipeline>) -> Self {
    Self { pipeline }
  }

  /// Best-effort UTF-8 decode (invalid sequences replaced), submits a job
  /// named `"{bucket}/{key}"`, and swallows `QueueFull` — ingestion never
  /// blocks on AI capacity. Buckets may opt out via `indexing-enabled` user
  /// metadata on the bucket (checked by the caller before invoking this).
  pub async fn on_object_put(&self, bucket: &str, key: &str, bytes: &[u8], content_type: &str) {
    if !is_text_eligible(content_type) {
      return;
    }

    let text = String::from_utf8_lossy(bytes).into_owned();
    let object_id = format!("{bucket}/{key}");
    let mut metadata = BTreeMap::new();
    metadata.insert("source".to_string(), key.to_string());
    metadata.insert("bucket".to_string(), bucket.to_string());
    metadata.insert("content_type".to_string(), content_type.to_string());

    match self.pipeline.submit(object_id.clone(), text, metadata).await {
      Ok(_) => {}
      Err(CoreError::QueueFull) => {
        warn!(object_id, "indexing queue full, dropping ingestion job");
      }
      Err(e) => {
        warn!(object_id, error = %e, "failed to submit indexing job");
      }
    }
  }
}

/// Bucket-level opt-out: a bucket whose `user_metadata["indexing-enabled"]`
/// is exactly `"false"` never triggers ingestion, regardless of
/// content-type eligibility.
pub fn bucket_indexing_enabled(bucket_metadata: &BTreeMap<String, String>) -> bool {
  bucket_metadata.get("indexing-enabled").map(|v| v != "false").unwrap_or(true)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bucket_opt_out_defaults_to_enabled() {
    assert!(bucket_indexing_enabled(&BTreeMap::new()));
    let mut meta = BTreeMap::new();
    meta.insert("indexing-enabled".to_string(), "false".to_string());
    assert!(!bucket_indexing_enabled(&meta));
  }
}
