use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::{Job, JobFailure, JobId, JobKind, JobOutput, QueueError};
use crate::config::Config;

pub type JobResult = Result<JobOutput, JobFailure>;

/// Runs one job attempt. Errors are reported as [`JobFailure`] so the queue
/// can decide whether to retry.
#[async_trait]
pub trait JobExecutor: Send + Sync + 'static {
    async fn execute(&self, job: &Job) -> JobResult;
}

#[derive(Debug, Clone)]
pub struct QueueSettings {
    pub workers: usize,
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl QueueSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            workers: config.worker_count.max(1),
            max_attempts: config.job_max_attempts.max(1),
            backoff: config.job_backoff,
        }
    }

    /// Delay before attempt `attempt + 1`. A server hint wins over the
    /// exponential schedule.
    fn delay_after(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        hint.unwrap_or_else(|| self.backoff * 2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

struct Entry {
    priority: u8,
    seq: u64,
    attempt: u32,
    job: Job,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // BinaryHeap pops the greatest entry: lowest priority number, then oldest.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct Inner {
    settings: QueueSettings,
    pending: Mutex<BinaryHeap<Entry>>,
    active: Mutex<HashMap<JobId, watch::Sender<Option<JobResult>>>>,
    seq: AtomicU64,
    closed: AtomicBool,
    wakeup: Notify,
    shutdown: watch::Sender<bool>,
}

/// In-process priority queue drained by a pool of worker tasks.
/// Cloning shares the same queue.
#[derive(Clone)]
pub struct JobQueue {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobQueue")
            .field("pending", &self.pending_len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl JobQueue {
    pub fn new(settings: QueueSettings) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                settings,
                pending: Mutex::new(BinaryHeap::new()),
                active: Mutex::new(HashMap::new()),
                seq: AtomicU64::new(0),
                closed: AtomicBool::new(false),
                wakeup: Notify::new(),
                shutdown,
            }),
        }
    }

    /// Queue `job`. Enqueuing an id that is still queued or running returns
    /// a handle on that job instead.
    pub fn enqueue(&self, job: Job) -> Result<JobHandle, QueueError> {
        if self.is_closed() {
            return Err(QueueError::Closed);
        }

        let rx = {
            let mut active = lock(&self.inner.active);
            if let Some(tx) = active.get(&job.id) {
                debug!(job_id = %job.id, "🧵 Job already queued, sharing its handle");
                return Ok(JobHandle {
                    id: job.id.clone(),
                    kind: job.kind,
                    rx: tx.subscribe(),
                });
            }
            let (tx, rx) = watch::channel(None);
            active.insert(job.id.clone(), tx);
            rx
        };

        let handle = JobHandle {
            id: job.id.clone(),
            kind: job.kind,
            rx,
        };
        debug!(job_id = %job.id, priority = job.kind.priority(), "🧵 Job queued");
        self.push(job, 1);
        Ok(handle)
    }

    pub fn pending_len(&self) -> usize {
        lock(&self.inner.pending).len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(AtomicOrdering::SeqCst)
    }

    /// Spawn the configured number of workers, all running `executor`.
    pub fn start(&self, executor: Arc<dyn JobExecutor>) -> Vec<JoinHandle<()>> {
        info!(workers = self.inner.settings.workers, "🧵 Job workers started");
        (0..self.inner.settings.workers)
            .map(|worker| {
                let queue = self.clone();
                let executor = executor.clone();
                tokio::spawn(
                    async move { queue.run_worker(executor).await }
                        .instrument(info_span!("worker", worker)),
                )
            })
            .collect()
    }

    /// Stop accepting jobs, let workers finish their current job, and fail
    /// everything still queued.
    pub fn shutdown(&self) {
        if self.inner.closed.swap(true, AtomicOrdering::SeqCst) {
            return;
        }
        self.inner.shutdown.send_replace(true);
        self.inner.wakeup.notify_waiters();

        let drained: Vec<Entry> = lock(&self.inner.pending).drain().collect();
        let cancelled = drained.len();
        for entry in drained {
            self.finish(&entry.job.id, Err(JobFailure::cancelled(entry.job.kind)));
        }
        info!(cancelled, "🧵 Job queue shut down");
    }

    fn push(&self, job: Job, attempt: u32) {
        if self.is_closed() {
            self.finish(&job.id, Err(JobFailure::cancelled(job.kind)));
            return;
        }
        let entry = Entry {
            priority: job.kind.priority(),
            seq: self.inner.seq.fetch_add(1, AtomicOrdering::SeqCst),
            attempt,
            job,
        };
        lock(&self.inner.pending).push(entry);
        self.inner.wakeup.notify_one();
    }

    fn pop(&self) -> Option<Entry> {
        lock(&self.inner.pending).pop()
    }

    fn finish(&self, id: &JobId, result: JobResult) {
        if let Some(tx) = lock(&self.inner.active).remove(id) {
            tx.send_replace(Some(result));
        }
    }

    async fn run_worker(self, executor: Arc<dyn JobExecutor>) {
        let mut shutdown = self.inner.shutdown.subscribe();

        loop {
            if *shutdown.borrow() {
                break;
            }

            let Some(entry) = self.pop() else {
                tokio::select! {
                    _ = self.inner.wakeup.notified() => {}
                    _ = shutdown.changed() => {}
                }
                continue;
            };

            self.run_entry(entry, &executor).await;
        }

        debug!("🧵 Worker stopped");
    }

    async fn run_entry(&self, entry: Entry, executor: &Arc<dyn JobExecutor>) {
        let Entry { job, attempt, .. } = entry;
        let kind = job.kind;
        let span = info_span!("job", job = %kind, job_id = %job.id, attempt);

        // A panicking job must not take its worker down.
        let task = {
            let executor = executor.clone();
            let job = job.clone();
            tokio::spawn(async move { executor.execute(&job).await }.instrument(span.clone()))
        };
        let result = match task.await {
            Ok(result) => result,
            Err(e) => {
                error!(parent: &span, error = %e, "🧵 ❌ Job panicked");
                Err(JobFailure::permanent(kind, format!("job panicked: {e}")))
            }
        };

        match result {
            Err(failure) if failure.transient && attempt < self.inner.settings.max_attempts => {
                let delay = self.inner.settings.delay_after(attempt, failure.retry_after);
                warn!(
                    parent: &span,
                    error = %failure.message,
                    delay_ms = delay.as_millis() as u64,
                    "🧵 ⚠️ Job failed, retrying"
                );
                self.schedule_retry(job, attempt + 1, delay);
            }
            Err(failure) => {
                warn!(parent: &span, error = %failure.message, "🧵 ❌ Job failed");
                self.finish(&job.id, Err(failure));
            }
            Ok(output) => {
                debug!(parent: &span, "🧵 ✅ Job completed");
                self.finish(&job.id, Ok(output));
            }
        }
    }

    fn schedule_retry(&self, job: Job, attempt: u32, delay: Duration) {
        let queue = self.clone();
        let mut shutdown = self.inner.shutdown.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => queue.push(job, attempt),
                _ = shutdown.wait_for(|stop| *stop) => {
                    queue.finish(&job.id, Err(JobFailure::cancelled(job.kind)));
                }
            }
        });
    }
}

/// Completion signal of one job. Clones observe the same outcome.
#[derive(Debug, Clone)]
pub struct JobHandle {
    id: JobId,
    kind: JobKind,
    rx: watch::Receiver<Option<JobResult>>,
}

impl JobHandle {
    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    /// Wait until the job succeeded, failed for good, or was cancelled.
    pub async fn wait(mut self) -> JobResult {
        let outcome = self
            .rx
            .wait_for(Option::is_some)
            .await
            .map(|result| (*result).clone());

        match outcome {
            Ok(Some(result)) => result,
            _ => Err(JobFailure::dropped(self.kind)),
        }
    }
}
