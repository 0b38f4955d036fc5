use std::{collections::BTreeMap, path::PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use vaultstore_core::{
  error::CoreError,
  models::object::{compute_etag, validate_bucket_name, validate_object_key, validate_user_metadata, Bucket},
  models::ObjectMeta,
};

use super::{ListObjectsParams, ListObjectsResult, ObjectStore};

/// Maximum `max_keys` accepted by `list_objects`, per §4.7.
pub const MAX_LIST_KEYS: usize = 1000;

/// Filesystem-backed object store. Persisted layout, per §6:
/// `{base}/{bucket}/{key}` for bytes, `{base}/{bucket}/.metadata/{key}.json`
/// for object metadata, `{base}/{bucket}/.metadata/bucket.json` for the
/// bucket record.
pub struct FilesystemObjectStore {
  base: PathBuf,
}

impl FilesystemObjectStore {
  pub fn new(base: impl Into<PathBuf>) -> Result<Self, CoreError> {
    let base = base.into();
    std::fs::create_dir_all(&base)
      .map_err(|e| CoreError::InternalError(format!("failed to create storage root: {e}")))?;
    Ok(Self { base })
  }

  fn bucket_dir(&self, bucket: &str) -> PathBuf {
    self.base.join(bucket)
  }

  fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
    self.bucket_dir(bucket).join(key)
  }

  fn object_meta_path(&self, bucket: &str, key: &str) -> PathBuf {
    self.bucket_dir(bucket).join(".metadata").join(format!("{key}.json"))
  }

  fn bucket_meta_path(&self, bucket: &str) -> PathBuf {
    self.bucket_dir(bucket).join(".metadata").join("bucket.json")
  }

  async fn bucket_exists(&self, bucket: &str) -> bool {
    fs::metadata(self.bucket_meta_path(bucket)).await.is_ok()
  }

  async fn load_bucket(&self, bucket: &str) -> Result<Bucket, CoreError> {
    let path = self.bucket_meta_path(bucket);
    let content = fs::read(&path)
      .await
      .map_err(|_| CoreError::BucketNotFound(bucket.to_string()))?;
    serde_json::from_slice(&content)
      .map_err(|e| CoreError::InternalError(format!("corrupt bucket metadata: {e}")))
  }

  /// Walks the bucket's `.metadata` tree collecting every object key —
  /// used by `list_objects` and the empty-bucket check on delete.
  async fn all_keys(&self, bucket: &str) -> Result<Vec<String>, CoreError> {
    let meta_root = self.bucket_dir(bucket).join(".metadata");
    let mut keys = Vec::new();
    let mut stack = vec![meta_root.clone()];
    while let Some(dir) = stack.pop() {
      let mut entries = match fs::read_dir(&dir).await {
        Ok(e) => e,
        Err(_) => continue,
      };
      while let Some(entry) = entries.next_entry().await.map_err(CoreError::from_io)? {
        let path = entry.path();
        if path == self.bucket_meta_path(bucket) {
          continue;
        }
        if entry.file_type().await.map_err(CoreError::from_io)?.is_dir() {
          stack.push(path);
        } else if let Some(rel) = path.strip_prefix(&meta_root).ok().and_then(|p| p.to_str()) {
          if let Some(key) = rel.strip_suffix(".json") {
            keys.push(key.to_string());
          }
        }
      }
    }
    keys.sort();
    Ok(keys)
  }
}

impl CoreError {
  fn from_io(e: std::io::Error) -> CoreError {
    CoreError::InternalError(format!("io error: {e}"))
  }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
  async fn create_bucket(&self, name: &str) -> Result<(), CoreError> {
    validate_bucket_name(name)?;
    if self.bucket_exists(name).await {
      return Err(CoreError::BucketAlreadyExists(name.to_string()));
    }
    let meta_dir = self.bucket_dir(name).join(".metadata");
    fs::create_dir_all(&meta_dir).await.map_err(CoreError::from_io)?;
    let bucket = Bucket { name: name.to_string(), created_at: Utc::now(), user_metadata: BTreeMap::new() };
    let bytes = serde_json::to_vec_pretty(&bucket)
      .map_err(|e| CoreError::InternalError(format!("serialize bucket metadata: {e}")))?;
    fs::write(self.bucket_meta_path(name), bytes).await.map_err(CoreError::from_io)?;
    Ok(())
  }

  async fn delete_bucket(&self, name: &str) -> Result<(), CoreError> {
    if !self.bucket_exists(name).await {
      return Err(CoreError::BucketNotFound(name.to_string()));
    }
    if !self.all_keys(name).await?.is_empty() {
      return Err(CoreError::BucketNotEmpty(name.to_string()));
    }
    fs::remove_dir_all(self.bucket_dir(name)).await.map_err(CoreError::from_io)?;
    Ok(())
  }

  async fn list_buckets(&self) -> Result<Vec<Bucket>, CoreError> {
    let mut buckets = Vec::new();
    let mut entries = match fs::read_dir(&self.base).await {
      Ok(e) => e,
      Err(_) => return Ok(buckets),
    };
    while let Some(entry) = entries.next_entry().await.map_err(CoreError::from_io)? {
      if entry.file_type().await.map_err(CoreError::from_io)?.is_dir() {
        if let Some(name) = entry.file_name().to_str() {
          if let Ok(bucket) = self.load_bucket(name).await {
            buckets.push(bucket);
          }
        }
      }
    }
    buckets.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(buckets)
  }

  async fn get_bucket(&self, name: &str) -> Result<Bucket, CoreError> {
    self.load_bucket(name).await
  }

  async fn put_object(
    &self,
    bucket: &str,
    key: &str,
    bytes: Vec<u8>,
    content_type: String,
    user_metadata: BTreeMap<String, String>,
  ) -> Result<ObjectMeta, CoreError> {
    if !self.bucket_exists(bucket).await {
      return Err(CoreError::BucketNotFound(bucket.to_string()));
    }
    validate_object_key(key)?;
    validate_user_metadata(&user_metadata)?;

    let etag = compute_etag(&bytes);
    let size = bytes.len() as u64;

    let object_path = self.object_path(bucket, key);
    if let Some(parent) = object_path.parent() {
      fs::create_dir_all(parent).await.map_err(CoreError::from_io)?;
    }
    fs::write(&object_path, &bytes).await.map_err(CoreError::from_io)?;

    let meta = ObjectMeta {
      bucket: bucket.to_string(),
      key: key.to_string(),
      content_type,
      user_metadata,
      etag,
      last_modified: Utc::now(),
      size,
    };

    let meta_path = self.object_meta_path(bucket, key);
    if let Some(parent) = meta_path.parent() {
      fs::create_dir_all(parent).await.map_err(CoreError::from_io)?;
    }
    let meta_bytes = serde_json::to_vec(&meta)
      .map_err(|e| CoreError::InternalError(format!("serialize object metadata: {e}")))?;
    fs::write(&meta_path, meta_bytes).await.map_err(CoreError::from_io)?;

    Ok(meta)
  }

  async fn get_object(&self, bucket: &str, key: &str) -> Result<(Vec<u8>, ObjectMeta), CoreError> {
    let meta = self.head_object(bucket, key).await?;
    let bytes = fs::read(self.object_path(bucket, key)).await.map_err(|_| CoreError::ObjectNotFound {
      bucket: bucket.to_string(),
      key: key.to_string(),
    })?;
    Ok((bytes, meta))
  }

  async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMeta, CoreError> {
    let meta_path = self.object_meta_path(bucket, key);
    let content = fs::read(&meta_path).await.map_err(|_| CoreError::ObjectNotFound {
      bucket: bucket.to_string(),
      key: key.to_string(),
    })?;
    serde_json::from_slice(&content).map_err(|e| CoreError::InternalError(format!("corrupt object metadata: {e}")))
  }

  async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), CoreError> {
    let object_path = self.object_path(bucket, key);
    let meta_path = self.object_meta_path(bucket, key);
    let _ = fs::remove_file(&object_path).await;
    fs::remove_file(&meta_path).await.map_err(|_| CoreError::ObjectNotFound {
      bucket: bucket.to_string(),
      key: key.to_string(),
    })?;
    Ok(())
  }

  async fn list_objects(&self, bucket: &str, params: ListObjectsParams) -> Result<ListObjectsResult, CoreError> {
    if !self.bucket_exists(bucket).await {
      return Err(CoreError::BucketNotFound(bucket.to_string()));
    }
    let max_keys = params.max_keys.clamp(1, MAX_LIST_KEYS);

    let mut keys: Vec<String> = self
      .all_keys(bucket)
      .await?
      .into_iter()
      .filter(|k| k.starts_with(&params.prefix))
      .collect();
    keys.sort();

    if let Some(marker) = &params.marker {
      keys.retain(|k| k.as_str() > marker.as_str());
    }

    let mut contents = Vec::new();
    let mut common_prefixes = std::collections::BTreeSet::new();

    for key in &keys {
      if let Some(delim) = &params.delimiter {
        let remainder = &key[params.prefix.len()..];
        if let Some(idx) = remainder.find(delim.as_str()) {
          let prefix = format!("{}{}{}", params.prefix, &remainder[..idx], delim);
          common_prefixes.insert(prefix);
          continue;
        }
      }
      if contents.len() + common_prefixes.len() >= max_keys {
        break;
      }
      if let Ok(meta) = self.head_object(bucket, key).await {
        contents.push(meta);
      }
    }

    let total_considered = contents.len() + common_prefixes.len();
    let is_truncated = keys.len() > total_considered;
    let next_marker = if is_truncated { contents.last().map(|m| m.key.clone()) } else { None };

    Ok(ListObjectsResult {
      contents,
      common_prefixes: common_prefixes.into_iter().collect(),
      is_truncated,
      next_marker,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn store() -> FilesystemObjectStore {
    let dir = tempfile::tempdir().unwrap();
    FilesystemObjectStore::new(dir.keep()).unwrap()
  }

  #[tokio::test]
  async fn bucket_lifecycle() {
    let store = store().await;
    store.create_bucket("my-bucket").await.unwrap();
    assert!(matches!(
      store.create_bucket("my-bucket").await,
      Err(CoreError::BucketAlreadyExists(_))
    ));

    store
      .put_object("my-bucket", "k", b"hello".to_vec(), "text/plain".to_string(), BTreeMap::new())
      .await
      .unwrap();

    assert!(matches!(
      store.delete_bucket("my-bucket").await,
      Err(CoreError::BucketNotEmpty(_))
    ));

    store.delete_object("my-bucket", "k").await.unwrap();
    store.delete_bucket("my-bucket").await.unwrap();
  }

  #[tokio::test]
  async fn put_then_get_round_trips_bytes_and_etag() {
    let store = store().await;
    store.create_bucket("b").await.unwrap();
    let meta = store
      .put_object("b", "k", b"hello".to_vec(), "text/plain".to_string(), BTreeMap::new())
      .await
      .unwrap();
    assert_eq!(meta.etag, "\"5d41402abc4b2a76b9719d911017c592\"");

    let (bytes, meta2) = store.get_object("b", "k").await.unwrap();
    assert_eq!(bytes, b"hello");
    assert_eq!(meta2.etag, meta.etag);
  }

  #[tokio::test]
  async fn list_objects_sorted_and_paginated_strictly_greater_than_marker() {
    let store = store().await;
    store.create_bucket("b").await.unwrap();
    for k in ["a", "b", "c", "d"] {
      store
        .put_object("b", k, b"x".to_vec(), "text/plain".to_string(), BTreeMap::new())
        .await
        .unwrap();
    }
    let result = store
      .list_objects("b", ListObjectsParams { marker: Some("b".to_string()), max_keys: 10, ..Default::default() })
      .await
      .unwrap();
    let keys: Vec<_> = result.contents.iter().map(|o| o.key.clone()).collect();
    assert_eq!(keys, vec!["c".to_string(), "d".to_string()]);
  }

  #[tokio::test]
  async fn delimiter_rolls_up_common_prefixes() {
    let store = store().await;
    store.create_bucket("b").await.unwrap();
    for k in ["docs/a.txt", "docs/b.txt", "readme.md"] {
      store
        .put_object("b", k, b"x".to_vec(), "text/plain".to_string(), BTreeMap::new())
        .await
        .unwrap();
    }
    let result = store
      .list_objects(
        "b",
        ListObjectsParams { delimiter: Some("/".to_string()), max_keys: 10, ..Default::default() },
      )
      .await
      .unwrap();
    assert_eq!(result.common_prefixes, vec!["docs/".to_string()]);
    assert_eq!(result.contents.iter().map(|o| o.key.clone()).collect::<Vec<_>>(), vec!["readme.md".to_string()]);
  }
}
