use std::collections::BTreeMap;

use thiserror::Error;

/// Domain error taxonomy shared by every component in the data plane.
///
/// This type is intentionally free of any HTTP/axum dependency — the server
/// crate maps each variant onto a status code and a wire body at the
/// boundary. Keeping the mapping one-directional (`CoreError` -> transport)
/// means the vector index, indexing pipeline, and RAG orchestrator can be
/// exercised in tests without pulling in axum at all.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum CoreError {
  #[error("bucket already exists: {0}")]
  BucketAlreadyExists(String),

  #[error("bucket not found: {0}")]
  BucketNotFound(String),

  #[error("bucket not empty: {0}")]
  BucketNotEmpty(String),

  #[error("object not found: {bucket}/{key}")]
  ObjectNotFound { bucket: String, key: String },

  #[error("invalid bucket name: {0}")]
  InvalidBucketName(String),

  #[error("invalid object name: {0}")]
  InvalidObjectName(String),

  #[error("invalid parameter {name}: {reason}")]
  InvalidParameter { name: String, reason: String },

  #[error("dimension mismatch: expected {expected}, got {got}")]
  DimensionMismatch { expected: usize, got: usize },

  #[error("invalid vector: {0}")]
  InvalidVector(String),

  #[error("embedding/generation provider unavailable: {0}")]
  ProviderUnavailable(String),

  #[error("embedding/generation provider timed out after {0:?}")]
  ProviderTimeout(std::time::Duration),

  #[error("indexing queue is full")]
  QueueFull,

  #[error("not implemented: {0}")]
  NotImplemented(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("invalid signature")]
  InvalidSignature,

  #[error("internal error: {0}")]
  InternalError(String),
}

impl CoreError {
  /// Stable short code for the variant, used in S3 `<Code>` bodies and
  /// JSON `error.code` fields.
  pub fn code(&self) -> &'static str {
    match self {
      CoreError::BucketAlreadyExists(_) => "BucketAlreadyExists",
      CoreError::BucketNotFound(_) => "BucketNotFound",
      CoreError::BucketNotEmpty(_) => "BucketNotEmpty",
      CoreError::ObjectNotFound { .. } => "ObjectNotFound",
      CoreError::InvalidBucketName(_) => "InvalidBucketName",
      CoreError::InvalidObjectName(_) => "InvalidObjectName",
      CoreError::InvalidParameter { .. } => "InvalidParameter",
      CoreError::DimensionMismatch { .. } => "DimensionMismatch",
      CoreError::InvalidVector(_) => "InvalidVector",
      CoreError::ProviderUnavailable(_) => "ProviderUnavailable",
      CoreError::ProviderTimeout(_) => "ProviderTimeout",
      CoreError::QueueFull => "QueueFull",
      CoreError::NotImplemented(_) => "NotImplemented",
      CoreError::Unauthorized(_) => "Unauthorized",
      CoreError::InvalidSignature => "InvalidSignature",
      CoreError::InternalError(_) => "InternalError",
    }
  }

  /// Extra key/value context useful for log correlation; most variants
  /// carry none.
  pub fn context(&self) -> BTreeMap<String, String> {
    let mut ctx = BTreeMap::new();
    match self {
      CoreError::ObjectNotFound { bucket, key } => {
        ctx.insert("bucket".to_string(), bucket.clone());
        ctx.insert("key".to_string(), key.clone());
      }
      CoreError::DimensionMismatch { expected, got } => {
        ctx.insert("expected".to_string(), expected.to_string());
        ctx.insert("got".to_string(), got.to_string());
      }
      _ => {}
    }
    ctx
  }
}
