use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// Minimum and maximum allowed embedding dimensionality.
pub const MIN_DIMENSION: usize = 3;
pub const MAX_DIMENSION: usize = 1536;

/// A single stored vector record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
  pub id: String,
  pub embedding: Vec<f64>,
  #[serde(default)]
  pub metadata: Value,
}

impl VectorRecord {
  /// Validates the invariants from §4.1: non-empty id, matching dimension,
  /// all-finite components.
  pub fn validate(&self, configured_d: usize) -> Result<(), CoreError> {
    if self.id.is_empty() {
      return Err(CoreError::InvalidVector("id must not be empty".to_string()));
    }
    if self.embedding.len() != configured_d {
      return Err(CoreError::DimensionMismatch {
        expected: configured_d,
        got: self.embedding.len(),
      });
    }
    if self.embedding.iter().any(|v| !v.is_finite()) {
      return Err(CoreError::InvalidVector(
        "embedding contains NaN or infinite component".to_string(),
      ));
    }
    Ok(())
  }
}

/// A `(vector, score)` pair returned from `search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredVector {
  pub vector: VectorRecord,
  pub score: f64,
}

/// Validates that a requested embedding dimension is within the accepted
/// range before an index is constructed.
pub fn validate_configured_dimension(d: usize) -> Result<(), CoreError> {
  if (MIN_DIMENSION..=MAX_DIMENSION).contains(&d) {
    Ok(())
  } else {
    Err(CoreError::InvalidParameter {
      name: "dimension".to_string(),
      reason: format!("must be between {MIN_DIMENSION} and {MAX_DIMENSION}"),
    })
  }
}

/// Cosine similarity between two equal-length vectors, clamped to `[0, 1]`
/// as a similarity score (negative cosine values are floored to 0 — the
/// ranking function only needs to separate "similar" from "dissimilar").
pub fn cosine_score(a: &[f64], b: &[f64]) -> f64 {
  let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
  let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
  let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
  if norm_a == 0.0 || norm_b == 0.0 {
    return 0.0;
  }
  let cos = (dot / (norm_a * norm_b)).clamp(-1.0, 1.0);
  cos.max(0.0)
}

/// Returns true when `id` names the given parent (delete-by-parent
/// semantics: `id == parent` or `id` starts with `"{parent}_chunk_"`).
pub fn is_own_or_chunk_of(id: &str, parent: &str) -> bool {
  id == parent || id.starts_with(&format!("{parent}_chunk_"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn identical_vectors_score_near_one() {
    let v = vec![1.0, 0.0, 0.0];
    assert!((cosine_score(&v, &v) - 1.0).abs() < 1e-9);
  }

  #[test]
  fn zero_norm_is_zero_not_nan() {
    let zero = vec![0.0, 0.0, 0.0];
    let other = vec![1.0, 2.0, 3.0];
    assert_eq!(cosine_score(&zero, &other), 0.0);
  }

  #[test]
  fn orthogonal_vectors_score_zero() {
    assert_eq!(cosine_score(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
  }

  #[test]
  fn validate_rejects_nan() {
    let v = VectorRecord {
      id: "a".to_string(),
      embedding: vec![1.0, f64::NAN, 0.0],
      metadata: Value::Null,
    };
    assert!(matches!(v.validate(3), Err(CoreError::InvalidVector(_))));
  }

  #[test]
  fn validate_rejects_dimension_mismatch() {
    let v = VectorRecord {
      id: "a".to_string(),
      embedding: vec![1.0, 0.0],
      metadata: Value::Null,
    };
    assert!(matches!(
      v.validate(3),
      Err(CoreError::DimensionMismatch { expected: 3, got: 2 })
    ));
  }

  #[test]
  fn chunk_matching() {
    assert!(is_own_or_chunk_of("b/doc.txt", "b/doc.txt"));
    assert!(is_own_or_chunk_of("b/doc.txt_chunk_0", "b/doc.txt"));
    assert!(!is_own_or_chunk_of("b/other.txt", "b/doc.txt"));
  }
}
