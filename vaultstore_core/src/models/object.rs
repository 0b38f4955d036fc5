use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum number of user-metadata entries on a single object.
pub const MAX_USER_METADATA_ENTRIES: usize = 10;
/// Maximum length of a user-metadata key, in characters.
pub const MAX_USER_METADATA_KEY_LEN: usize = 128;
/// Maximum length of a user-metadata value, in characters.
pub const MAX_USER_METADATA_VALUE_LEN: usize = 256;
/// Maximum length of an object key, in bytes.
pub const MAX_KEY_LEN: usize = 1024;

/// A bucket: a named container of objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
  pub name: String,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub user_metadata: BTreeMap<String, String>,
}

/// An object stored under `(bucket, key)`.
///
/// `bytes` is kept out of this struct deliberately — object bodies are
/// streamed to/from the storage backend separately so that listing and
/// metadata operations never need to hold a full object body in memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectMeta {
  pub bucket: String,
  pub key: String,
  pub content_type: String,
  #[serde(default)]
  pub user_metadata: BTreeMap<String, String>,
  pub etag: String,
  pub last_modified: DateTime<Utc>,
  pub size: u64,
}

impl ObjectMeta {
  /// Conventional `object_id` used to correlate an object with the vectors
  /// derived from it: `"{bucket}/{key}"`.
  pub fn object_id(&self) -> String {
    format!("{}/{}", self.bucket, self.key)
  }
}

/// Validates a bucket name against `^[a-z0-9][a-z0-9-]{1,61}[a-z0-9]$` with
/// no `--` substring.
pub fn validate_bucket_name(name: &str) -> Result<(), CoreError> {
  let bytes = name.as_bytes();
  let len_ok = bytes.len() >= 3 && bytes.len() <= 63;
  let chars_ok = bytes
    .iter()
    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-');
  let ends_ok = bytes
    .first()
    .is_some_and(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    && bytes
      .last()
      .is_some_and(|b| b.is_ascii_lowercase() || b.is_ascii_digit());
  let no_double_dash = !name.contains("--");

  if len_ok && chars_ok && ends_ok && no_double_dash {
    Ok(())
  } else {
    Err(CoreError::InvalidBucketName(name.to_string()))
  }
}

/// Validates an object key: non-empty, `<= MAX_KEY_LEN` bytes, no NUL byte.
pub fn validate_object_key(key: &str) -> Result<(), CoreError> {
  if key.is_empty() || key.len() > MAX_KEY_LEN || key.contains('\0') {
    return Err(CoreError::InvalidObjectName(key.to_string()));
  }
  Ok(())
}

/// Validates user metadata against the limits documented in §3.
pub fn validate_user_metadata(meta: &BTreeMap<String, String>) -> Result<(), CoreError> {
  if meta.len() > MAX_USER_METADATA_ENTRIES {
    return Err(CoreError::InvalidParameter {
      name: "user_metadata".to_string(),
      reason: format!("at most {MAX_USER_METADATA_ENTRIES} entries allowed"),
    });
  }
  for (k, v) in meta {
    if k.len() > MAX_USER_METADATA_KEY_LEN {
      return Err(CoreError::InvalidParameter {
        name: "user_metadata".to_string(),
        reason: format!("key '{k}' exceeds {MAX_USER_METADATA_KEY_LEN} chars"),
      });
    }
    if v.len() > MAX_USER_METADATA_VALUE_LEN {
      return Err(CoreError::InvalidParameter {
        name: "user_metadata".to_string(),
        reason: format!("value for key '{k}' exceeds {MAX_USER_METADATA_VALUE_LEN} chars"),
      });
    }
  }
  Ok(())
}

/// Computes the quoted, lowercase hex ETag for a byte slice (MD5).
pub fn compute_etag(bytes: &[u8]) -> String {
  use md5::Digest;
  let mut hasher = md5::Md5::new();
  hasher.update(bytes);
  format!("\"{:x}\"", hasher.finalize())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_valid_bucket_names() {
    assert!(validate_bucket_name("my-bucket").is_ok());
    assert!(validate_bucket_name("b00").is_ok());
  }

  #[test]
  fn rejects_double_dash() {
    assert!(validate_bucket_name("my--bucket").is_err());
  }

  #[test]
  fn rejects_bad_edges() {
    assert!(validate_bucket_name("-bucket").is_err());
    assert!(validate_bucket_name("bucket-").is_err());
    assert!(validate_bucket_name("Bucket").is_err());
  }

  #[test]
  fn etag_matches_known_md5() {
    assert_eq!(compute_etag(b"hello"), "\"5d41402abc4b2a76b9719d911017c592\"");
  }

  #[test]
  fn object_id_joins_bucket_and_key() {
    let meta = ObjectMeta {
      bucket: "b".to_string(),
      key: "doc.txt".to_string(),
      content_type: "text/plain".to_string(),
      user_metadata: Default::default(),
      etag: "\"x\"".to_string(),
      last_modified: Utc::now(),
      size: 0,
    };
    assert_eq!(meta.object_id(), "b/doc.txt");
  }
}
