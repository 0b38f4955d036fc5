//! Object storage contract (§4.7). Out-of-core per §1 — specified only as
//! a collaborator interface insofar as it triggers indexing — but
//! implemented in full here since the ingestion hook needs a real backend
//! to exercise against in tests.

pub mod filesystem;

use std::collections::BTreeMap;

use async_trait::async_trait;
use vaultstore_core::{error::CoreError, models::object::Bucket, models::ObjectMeta};

pub use filesystem::FilesystemObjectStore;

#[derive(Debug, Clone, Default)]
pub struct ListObjectsParams {
  pub prefix: String,
  pub delimiter: Option<String>,
  pub marker: Option<String>,
  pub max_keys: usize,
}

#[derive(Debug, Clone)]
pub struct ListObjectsResult {
  pub contents: Vec<ObjectMeta>,
  pub common_prefixes: Vec<String>,
  pub is_truncated: bool,
  pub next_marker: Option<String>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
  async fn create_bucket(&self, name: &str) -> Result<(), CoreError>;
  async fn delete_bucket(&self, name: &str) -> Result<(), CoreError>;
  async fn list_buckets(&self) -> Result<Vec<Bucket>, CoreError>;
  async fn get_bucket(&self, name: &str) -> Result<Bucket, CoreError>;

  async fn put_object(
    &self,
    bucket: &str,
    key: &str,
    bytes: Vec<u8>,
    content_type: String,
    user_metadata: BTreeMap<String, String>,
  ) -> Result<ObjectMeta, CoreError>;

  async fn get_object(&self, bucket: &str, key: &str) -> Result<(Vec<u8>, ObjectMeta), CoreError>;
  async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMeta, CoreError>;
  async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), CoreError>;
  async fn list_objects(&self, bucket: &str, params: ListObjectsParams) -> Result<ListObjectsResult, CoreError>;
}
