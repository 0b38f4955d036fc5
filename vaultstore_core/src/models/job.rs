use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies an indexing job. Carries the object reference embedded in
/// its textual form so log lines naming only the id remain debuggable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
  pub fn new(object_id: &str, seq: u64) -> Self {
    JobId(format!("job-{seq}-{object_id}"))
  }
}

impl std::fmt::Display for JobId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
  Pending,
  Processing,
  Completed,
  Failed,
}

impl JobStatus {
  pub fn is_terminal(self) -> bool {
    matches!(self, JobStatus::Completed | JobStatus::Failed)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
  pub id: JobId,
  pub object_id: String,
  pub text: String,
  #[serde(default)]
  pub metadata: BTreeMap<String, String>,
  pub status: JobStatus,
  pub created_at: DateTime<Utc>,
  pub started_at: Option<DateTime<Utc>>,
  pub completed_at: Option<DateTime<Utc>>,
  pub error: Option<String>,
  pub retries: u32,
}

impl Job {
  pub fn new(id: JobId, object_id: String, text: String, metadata: BTreeMap<String, String>) -> Self {
    Self {
      id,
      object_id,
      text,
      metadata,
      status: JobStatus::Pending,
      created_at: Utc::now(),
      started_at: None,
      completed_at: None,
      error: None,
      retries: 0,
    }
  }
}

/// Point-in-time counters exposed by `GET /api/v1/indexing/stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexingStats {
  pub total: u64,
  pub pending: u64,
  pub processing: u64,
  pub completed: u64,
  pub failed: u64,
  pub queue_length: u64,
  pub workers_active: u64,
  pub last_processed: Option<DateTime<Utc>>,
}
