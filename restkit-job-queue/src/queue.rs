//! A single named queue and its worker pool.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::JobQueueError;
use crate::types::{AsyncJob, QueueInfo};
use crate::worker::JobWorker;

/// Pending jobs a queue buffers before submitters have to wait.
pub const DEFAULT_CAPACITY: usize = 1;

/// Shape of a queue: worker count, buffer depth and submit timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueOptions {
    pub workers: usize,
    pub capacity: usize,
    pub submit_timeout: Option<Duration>,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self::new(1)
    }
}

impl QueueOptions {
    #[inline]
    pub const fn new(workers: usize) -> Self {
        Self {
            workers,
            capacity: DEFAULT_CAPACITY,
            submit_timeout: None,
        }
    }

    #[inline]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Fail submissions that cannot find room within `timeout`.
    #[inline]
    pub const fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = Some(timeout);
        self
    }
}

pub(crate) struct JobQueue {
    name: Arc<str>,
    options: QueueOptions,
    sender: RwLock<Option<mpsc::Sender<AsyncJob>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    processed: Arc<AtomicU64>,
}

impl JobQueue {
    /// Open the channel and spawn `options.workers` tasks draining it.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn(name: &str, worker: Arc<dyn JobWorker>, options: QueueOptions) -> Self {
        let name: Arc<str> = Arc::from(name);
        let (tx, rx) = mpsc::channel(options.capacity);
        let pending = Arc::new(Mutex::new(rx));
        let processed = Arc::new(AtomicU64::new(0));

        let handles = (0..options.workers)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    Arc::clone(&name),
                    worker_id,
                    Arc::clone(&pending),
                    Arc::clone(&worker),
                    Arc::clone(&processed),
                ))
            })
            .collect();

        Self {
            name,
            options,
            sender: RwLock::new(Some(tx)),
            workers: Mutex::new(handles),
            processed,
        }
    }

    pub(crate) async fn submit(&self, job: AsyncJob) -> Result<(), JobQueueError> {
        let sender = self
            .sender
            .read()
            .await
            .clone()
            .ok_or_else(|| JobQueueError::QueueClosed(self.name.to_string()))?;

        let job_id = job.id();
        match self.options.submit_timeout {
            None => sender
                .send(job)
                .await
                .map_err(|_| JobQueueError::QueueClosed(self.name.to_string()))?,
            Some(timeout) => match tokio::time::timeout(timeout, sender.send(job)).await {
                Ok(sent) => {
                    sent.map_err(|_| JobQueueError::QueueClosed(self.name.to_string()))?
                }
                Err(_) => {
                    warn!(queue = %self.name, %job_id, ?timeout, "job queue full; submission timed out");
                    return Err(JobQueueError::SubmitTimeout {
                        name: self.name.to_string(),
                        timeout,
                    });
                }
            },
        }

        debug!(queue = %self.name, %job_id, "job enqueued");
        Ok(())
    }

    /// Stop accepting jobs. Returns `false` if the queue was already closed.
    pub(crate) async fn close(&self) -> bool {
        self.sender.write().await.take().is_some()
    }

    /// Wait for the workers to drain what was accepted before [`close`](Self::close).
    pub(crate) async fn join(&self) {
        let handles = std::mem::take(&mut *self.workers.lock().await);
        if handles.is_empty() {
            return;
        }
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(queue = %self.name, error = %e, "job worker ended abnormally");
            }
        }
        debug!(queue = %self.name, "job queue drained");
    }

    pub(crate) async fn info(&self) -> QueueInfo {
        QueueInfo {
            name: self.name.to_string(),
            workers: self.options.workers,
            capacity: self.options.capacity,
            processed: self.processed.load(Ordering::Relaxed),
            closed: self.sender.read().await.is_none(),
        }
    }
}

async fn worker_loop(
    queue: Arc<str>,
    worker_id: usize,
    pending: Arc<Mutex<mpsc::Receiver<AsyncJob>>>,
    worker: Arc<dyn JobWorker>,
    processed: Arc<AtomicU64>,
) {
    loop {
        // Only one idle worker waits on the channel at a time; the others wait on the lock.
        let next = {
            let mut rx = pending.lock().await;
            rx.recv().await
        };
        let Some(job) = next else {
            break;
        };

        let (job_id, params, reply) = job.into_parts();
        let worker = Arc::clone(&worker);
        let run = tokio::spawn(async move { worker.run(params).await });

        match run.await {
            Ok(value) => {
                processed.fetch_add(1, Ordering::Relaxed);
                if reply.send(value).is_err() {
                    debug!(queue = %queue, worker_id, %job_id, "submitter stopped waiting; result discarded");
                }
            }
            Err(e) => {
                error!(queue = %queue, worker_id, %job_id, error = %e, "job worker failed; continuing with next job");
            }
        }
    }
    debug!(queue = %queue, worker_id, "job worker stopped");
}
