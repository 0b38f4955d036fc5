//! Indexing Pipeline (§4.4): bounded queue + worker pool connecting object
//! ingestion to embedding generation. A fixed-size worker pool drains a
//! bounded `mpsc` channel of job ids under a `tokio::select!` against a
//! shared cancellation token, backed by a shared job table rather than
//! per-message acks.

use std::{collections::BTreeMap, sync::atomic::{AtomicU64, Ordering}, sync::Arc, time::Duration};

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use vaultstore_ai::{AiProvider, EmbeddingProvider};
use vaultstore_core::{
  chunking::{chunk_id, chunk_text, SINGLE_CHUNK_THRESHOLD},
  error::CoreError,
  models::{IndexingStats, Job, JobId, JobStatus, VectorRecord},
};

use crate::{config::IndexingConfig, vector::VectorIndex};

/// Shared job table: readers snapshot by copy, mutators take the exclusive
/// lock only around the mutation itself (§5, "Shared state and mutation").
type JobTable = Arc<RwLock<std::collections::HashMap<JobId, Job>>>;

pub struct IndexingPipeline {
  config: IndexingConfig,
  ai: Arc<AiProvider>,
  vector_index: Arc<dyn VectorIndex>,
  jobs: JobTable,
  tx: mpsc::Sender<JobId>,
  rx: parking_lot::Mutex<Option<mpsc::Receiver<JobId>>>,
  seq: AtomicU64,
  workers_active: Arc<AtomicU64>,
  cancel: CancellationToken,
}

impl IndexingPipeline {
  pub fn new(config: IndexingConfig, ai: Arc<AiProvider>, vector_index: Arc<dyn VectorIndex>) -> Self {
    let (tx, rx) = mpsc::channel(config.queue_size);
    Self {
      config,
      ai,
      vector_index,
      jobs: Arc::new(RwLock::new(std::collections::HashMap::new())),
      tx,
      rx: parking_lot::Mutex::new(Some(rx)),
      seq: AtomicU64::new(0),
      workers_active: Arc::new(AtomicU64::new(0)),
      cancel: CancellationToken::new(),
    }
  }

  /// Creates a Job, enqueues it, returns immediately. When disabled, runs
  /// synchronously and returns a completed (or failed) job. Never blocks:
  /// a full queue yields `QueueFull` without touching the job table.
  pub async fn submit(&self, object_id: String, text: String, metadata: BTreeMap<String, String>) -> Result<Job, CoreError> {
    let seq = self.seq.fetch_add(1, Ordering::Relaxed);
    let job_id = JobId::new(&object_id, seq);
    let mut job = Job::new(job_id.clone(), object_id, text, metadata);

    if !self.config.enabled {
      job.status = JobStatus::Processing;
      job.started_at = Some(Utc::now());
      match process_document(&self.ai, self.vector_index.as_ref(), &job).await {
        Ok(()) => {
          job.status = JobStatus::Completed;
          job.completed_at = Some(Utc::now());
        }
        Err(e) => {
          job.status = JobStatus::Failed;
          job.completed_at = Some(Utc::now());
          job.error = Some(e.to_string());
        }
      }
      self.jobs.write().insert(job.id.clone(), job.clone());
      return Ok(job);
    }

    self.jobs.write().insert(job.id.clone(), job.clone());

    if self.tx.try_send(job_id.clone()).is_err() {
      self.jobs.write().remove(&job_id);
      return Err(CoreError::QueueFull);
    }

    Ok(job)
  }

  pub fn status(&self, job_id: &JobId) -> Result<Job, CoreError> {
    self
      .jobs
      .read()
      .get(job_id)
      .cloned()
      .ok_or_else(|| CoreError::ObjectNotFound { bucket: "jobs".to_string(), key: job_id.to_string() })
  }

  pub fn jobs_by_object(&self, object_id: &str) -> Vec<Job> {
    self.jobs.read().values().filter(|j| j.object_id == object_id).cloned().collect()
  }

  pub fn stats(&self) -> IndexingStats {
    let jobs = self.jobs.read();
    let mut stats = IndexingStats { queue_length: (self.config.queue_size - self.tx.capacity()) as u64, ..Default::default() };
    stats.workers_active = self.workers_active.load(Ordering::Relaxed);
    for job in jobs.values() {
      stats.total += 1;
      match job.status {
        JobStatus::Pending => stats.pending += 1,
        JobStatus::Processing => stats.processing += 1,
        JobStatus::Completed => {
          stats.completed += 1;
          stats.last_processed = match stats.last_processed {
            Some(prev) if job.completed_at.map(|t| t > prev).unwrap_or(false) => job.completed_at,
            Some(prev) => Some(prev),
            None => job.completed_at,
          };
        }
        JobStatus::Failed => stats.failed += 1,
      }
    }
    stats
  }

  /// Spawns `W` workers plus one hourly cleanup task. Returns their handles;
  /// `stop()` cancels the shared token and the caller awaits the handles.
  pub fn start(self: &Arc<Self>) -> Vec<tokio::task::JoinHandle<()>> {
    let mut handles = Vec::with_capacity(self.config.workers + 1);
    let rx = self.rx.lock().take().expect("start() called more than once");
    let rx = Arc::new(tokio::sync::Mutex::new(rx));

    for worker_id in 0..self.config.workers {
      let pipeline = Arc::clone(self);
      let rx = Arc::clone(&rx);
      handles.push(tokio::spawn(async move {
        pipeline.run_worker(worker_id, rx).await;
      }));
    }

    let pipeline = Arc::clone(self);
    handles.push(tokio::spawn(async move {
      pipeline.run_cleanup_loop().await;
    }));

    handles
  }

  pub fn stop(&self) {
    self.cancel.cancel();
  }

  async fn run_worker(self: Arc<Self>, worker_id: usize, rx: Arc<tokio::sync::Mutex<mpsc::Receiver<JobId>>>) {
    info!(worker_id, "indexing worker started");
    loop {
      let next = tokio::select! {
        _ = self.cancel.cancelled() => None,
        job_id = async { rx.lock().await.recv().await } => job_id,
      };

      let Some(job_id) = next else {
        info!(worker_id, "indexing worker stopping");
        return;
      };

      self.workers_active.fetch_add(1, Ordering::Relaxed);
      self.process_one(&job_id).await;
      self.workers_active.fetch_sub(1, Ordering::Relaxed);
    }
  }

  async fn process_one(&self, job_id: &JobId) {
    let Some(mut job) = self.jobs.read().get(job_id).cloned() else { return };

    job.status = JobStatus::Processing;
    job.started_at = Some(Utc::now());
    self.jobs.write().insert(job_id.clone(), job.clone());

    match process_document(&self.ai, self.vector_index.as_ref(), &job).await {
      Ok(()) => {
        job.status = JobStatus::Completed;
        job.completed_at = Some(Utc::now());
        job.error = None;
        self.jobs.write().insert(job_id.clone(), job);
      }
      Err(e) => {
        job.retries += 1;
        job.error = Some(e.to_string());
        warn!(job_id = %job_id, retries = job.retries, error = %e, "indexing job failed");

        if job.retries < self.config.max_retries {
          job.status = JobStatus::Pending;
          self.jobs.write().insert(job_id.clone(), job.clone());
          self.reenqueue_after_delay(job_id.clone());
        } else {
          job.status = JobStatus::Failed;
          job.completed_at = Some(Utc::now());
          self.jobs.write().insert(job_id.clone(), job);
        }
      }
    }
  }

  fn reenqueue_after_delay(&self, job_id: JobId) {
    let tx = self.tx.clone();
    let jobs = Arc::clone(&self.jobs);
    let delay = self.config.retry_delay();
    tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      if tx.try_send(job_id.clone()).is_err() {
        if let Some(job) = jobs.write().get_mut(&job_id) {
          job.status = JobStatus::Failed;
          job.completed_at = Some(Utc::now());
          job.error = Some("queue closed or full during retry re-enqueue".to_string());
        }
      }
    });
  }

  async fn run_cleanup_loop(self: Arc<Self>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(3600));
    loop {
      tokio::select! {
        _ = self.cancel.cancelled() => return,
        _ = ticker.tick() => self.run_cleanup_once(),
      }
    }
  }

  fn run_cleanup_once(&self) {
    let cutoff = Utc::now() - self.config.cleanup_after();
    let mut jobs = self.jobs.write();
    let before = jobs.len();
    jobs.retain(|_, job| !(job.status.is_terminal() && job.created_at < cutoff));
    let removed = before - jobs.len();
    if removed > 0 {
      info!(removed, "cleaned up terminal indexing jobs");
    }
  }
}

/// Document processing performed on behalf of a worker (§4.4). Chunking
/// threshold and window size live in `vaultstore_core::chunking`. Per-chunk
/// failure policy is strict: any chunk failure fails the whole job (§9).
async fn process_document(ai: &AiProvider, vector_index: &dyn VectorIndex, job: &Job) -> Result<(), CoreError> {
  let timeout = Duration::from_secs(30);
  let model = ai_embed_model_name(ai);

  if job.text.len() <= SINGLE_CHUNK_THRESHOLD {
    let embedding = ai.embed(&job.text, timeout).await?;
    let metadata = serde_json::json!({
      "content": job.text,
      "source": job.metadata.get("source"),
      "parent_object": job.object_id,
      "ai_model": model,
      "ai_processed_at": Utc::now(),
    });
    vector_index.store(VectorRecord { id: job.object_id.clone(), embedding, metadata }).await?;
    return Ok(());
  }

  let chunks = chunk_text(&job.text);
  let total = chunks.len();
  for (i, chunk) in chunks.into_iter().enumerate() {
    let embedding = ai.embed(&chunk, timeout).await?;
    let metadata = serde_json::json!({
      "content": chunk,
      "source": job.metadata.get("source"),
      "chunk_index": i,
      "total_chunks": total,
      "parent_object": job.object_id,
      "ai_model": model,
      "ai_processed_at": Utc::now(),
    });
    let id = chunk_id(&job.object_id, i);
    vector_index.store(VectorRecord { id, embedding, metadata }).await?;
  }

  Ok(())
}

fn ai_embed_model_name(ai: &AiProvider) -> &'static str {
  match ai {
    AiProvider::LocalSelfHosted(_) => "local-self-hosted",
    AiProvider::CloudA(_) => "cloud-a",
    AiProvider::CloudB(_) => "cloud-b",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::vector::{SqliteVectorIndex, VectorIndexMode};
  use vaultstore_ai::adapters::local::LocalSelfHostedAdapter;

  fn disabled_config() -> IndexingConfig {
    IndexingConfig {
      enabled: false,
      workers: 1,
      queue_size: 10,
      max_retries: 1,
      retry_delay_secs: 0,
      cleanup_after_secs: 3600,
      status_enabled: true,
    }
  }

  async fn vector_index() -> Arc<dyn VectorIndex> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.keep().join("vector.db");
    Arc::new(SqliteVectorIndex::connect(path.to_str().unwrap(), 3, VectorIndexMode::Exact).await.unwrap())
  }

  #[tokio::test]
  async fn submit_with_indexing_disabled_runs_synchronously_and_fails_without_a_reachable_provider() {
    let ai = Arc::new(AiProvider::LocalSelfHosted(LocalSelfHostedAdapter::new_default_local("embed-model", "chat-model")));
    let vi = vector_index().await;
    let pipeline = IndexingPipeline::new(disabled_config(), ai, vi);

    let job = pipeline.submit("b/k".to_string(), "short text".to_string(), BTreeMap::new()).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
  }

  #[test]
  fn stats_default_to_zero() {
    let stats = IndexingStats::default();
    assert_eq!(stats.total, 0);
  }

  fn backpressure_config() -> IndexingConfig {
    IndexingConfig {
      enabled: true,
      workers: 1,
      queue_size: 2,
      max_retries: 1,
      retry_delay_secs: 0,
      cleanup_after_secs: 3600,
      status_enabled: true,
    }
  }

  #[tokio::test]
  async fn submit_rejects_with_queue_full_once_the_bounded_channel_is_saturated() {
    let ai = Arc::new(AiProvider::LocalSelfHosted(LocalSelfHostedAdapter::new_default_local("embed-model", "chat-model")));
    let vi = vector_index().await;
    let pipeline = IndexingPipeline::new(backpressure_config(), ai, vi);

    let mut accepted = 0;
    let mut rejected = 0;
    for i in 0..5 {
      match pipeline.submit(format!("b/k{i}"), "short text".to_string(), BTreeMap::new()).await {
        Ok(_) => accepted += 1,
        Err(CoreError::QueueFull) => rejected += 1,
        Err(e) => panic!("unexpected error: {e}"),
      }
    }

    assert_eq!(accepted, 2, "only queue_size submissions should be accepted before workers drain any");
    assert_eq!(rejected, 3);
  }
}
