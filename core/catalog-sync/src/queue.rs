//! In-process import queue and worker pool.
//!
//! The sync engine pushes [`ImportJob`]s into an [`ImportQueue`]; an
//! [`ImportWorkerPool`] drains it with a fixed number of concurrent workers.
//! Delivery is at-least-once: a failed job is retried up to
//! `max_attempts` times with linear backoff. Ordering between jobs is not
//! preserved.

use crate::entry::ImportJob;
use crate::error::{SyncError, SyncResult};
use crate::traits::WorkQueue;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Configuration for the import queue and its workers.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Jobs buffered before `enqueue_bulk` waits for workers.
    pub capacity: usize,
    /// Number of concurrent workers.
    pub workers: usize,
    /// Attempts per job, including the first.
    pub max_attempts: u32,
    /// Backoff before retry `n` is `n * retry_backoff_ms`.
    pub retry_backoff_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            workers: 4,
            max_attempts: 3,
            retry_backoff_ms: 500,
        }
    }
}

/// Handles one import job.
#[async_trait]
pub trait JobProcessor: Send + Sync {
    async fn process(&self, job: &ImportJob, ctx: &JobContext) -> SyncResult<()>;
}

/// Per-attempt job information handed to the processor.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub name: String,
    pub attempt: u32,
}

impl JobContext {
    /// Records job progress. Informational only.
    pub fn progress(&self, percent: u8) {
        debug!(job = %self.name, attempt = self.attempt, percent, "Job progress");
    }
}

/// Sending half of the import queue. Cheap to clone.
#[derive(Clone)]
pub struct ImportQueue {
    tx: mpsc::Sender<ImportJob>,
}

impl ImportQueue {
    /// Creates a bounded queue and the receiver to hand to a worker pool.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<ImportJob>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl WorkQueue for ImportQueue {
    async fn enqueue_bulk(&self, jobs: Vec<ImportJob>) -> SyncResult<usize> {
        let count = jobs.len();
        for job in jobs {
            self.tx
                .send(job)
                .await
                .map_err(|_| SyncError::Queue("import workers have shut down".into()))?;
        }
        debug!(count, "Enqueued import jobs");
        Ok(count)
    }
}

/// Point-in-time job counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub completed: u64,
    pub failed: u64,
    pub retried: u64,
}

#[derive(Default)]
struct Counters {
    completed: AtomicU64,
    failed: AtomicU64,
    retried: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> QueueStats {
        QueueStats {
            completed: self.completed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            retried: self.retried.load(Ordering::SeqCst),
        }
    }
}

/// A fixed set of workers draining one import queue.
pub struct ImportWorkerPool {
    handles: Vec<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl ImportWorkerPool {
    /// Spawns `config.workers` workers on the current runtime.
    pub fn spawn(
        rx: mpsc::Receiver<ImportJob>,
        processor: Arc<dyn JobProcessor>,
        config: &QueueConfig,
    ) -> Self {
        let rx = Arc::new(Mutex::new(rx));
        let counters = Arc::new(Counters::default());
        let workers = config.workers.max(1);
        let handles = (0..workers)
            .map(|worker| {
                let rx = rx.clone();
                let processor = processor.clone();
                let counters = counters.clone();
                let config = config.clone();
                tokio::spawn(async move {
                    run_worker(worker, rx, processor, counters, config).await;
                })
            })
            .collect();
        info!(workers, "Import workers started");
        Self { handles, counters }
    }

    pub fn stats(&self) -> QueueStats {
        self.counters.snapshot()
    }

    /// Waits for the workers to exit. They exit once every [`ImportQueue`]
    /// handle is dropped and the queue is drained.
    pub async fn join(self) -> QueueStats {
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!("Import worker panicked: {e}");
            }
        }
        let stats = self.counters.snapshot();
        info!(
            completed = stats.completed,
            failed = stats.failed,
            retried = stats.retried,
            "Import workers stopped"
        );
        stats
    }
}

async fn run_worker(
    worker: usize,
    rx: Arc<Mutex<mpsc::Receiver<ImportJob>>>,
    processor: Arc<dyn JobProcessor>,
    counters: Arc<Counters>,
    config: QueueConfig,
) {
    loop {
        let job = { rx.lock().await.recv().await };
        let Some(job) = job else {
            debug!(worker, "Import queue closed");
            break;
        };

        let max_attempts = config.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            let ctx = JobContext {
                name: job.name.clone(),
                attempt,
            };
            ctx.progress(0);
            match processor.process(&job, &ctx).await {
                Ok(()) => {
                    counters.completed.fetch_add(1, Ordering::SeqCst);
                    break;
                }
                Err(e) if attempt < max_attempts && e.is_retryable() => {
                    counters.retried.fetch_add(1, Ordering::SeqCst);
                    warn!(job = %job.name, attempt, "Import job failed, retrying: {e}");
                    let backoff = config.retry_backoff_ms.saturating_mul(u64::from(attempt));
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::SeqCst);
                    error!(job = %job.name, attempt, "Import job failed: {e}");
                    break;
                }
            }
        }
    }
}
