//! Registry of named job queues.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::error::JobQueueError;
use crate::queue::{JobQueue, QueueOptions};
use crate::types::{AsyncJob, QueueInfo};
use crate::worker::JobWorker;

/// Maps queue names to running queues and routes submissions to them.
///
/// Cloning is cheap; clones share the same queues. Queues are never removed
/// once created.
#[derive(Clone, Default)]
pub struct QueueController {
    queues: Arc<RwLock<HashMap<String, Arc<JobQueue>>>>,
}

impl fmt::Debug for QueueController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueController")
            .field("queues", &"<RwLock<HashMap<String, Arc<JobQueue>>>>")
            .finish()
    }
}

impl QueueController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a queue named `name` served by `options.workers` workers running `worker`.
    ///
    /// Fails with [`JobQueueError::DuplicateQueue`] if the name is taken; the
    /// existing queue is left untouched.
    pub async fn create_queue<W: JobWorker + 'static>(
        &self,
        name: impl Into<String>,
        worker: W,
        options: QueueOptions,
    ) -> Result<(), JobQueueError> {
        self.create_queue_shared(name, Arc::new(worker), options)
            .await
    }

    /// Same as [`create_queue`](Self::create_queue) for a worker that is already shared.
    pub async fn create_queue_shared(
        &self,
        name: impl Into<String>,
        worker: Arc<dyn JobWorker>,
        options: QueueOptions,
    ) -> Result<(), JobQueueError> {
        let name = name.into();
        if options.workers == 0 {
            return Err(JobQueueError::InvalidWorkerCount { name });
        }
        if options.capacity == 0 {
            return Err(JobQueueError::InvalidCapacity { name });
        }

        let mut queues = self.queues.write().await;
        if queues.contains_key(&name) {
            return Err(JobQueueError::DuplicateQueue(name));
        }

        let queue = JobQueue::spawn(&name, worker, options);
        info!(
            queue = %name,
            workers = options.workers,
            capacity = options.capacity,
            "job queue created"
        );
        queues.insert(name, Arc::new(queue));
        Ok(())
    }

    /// Hand `job` to the named queue.
    ///
    /// Returns once the job is accepted, not when it finishes; await the
    /// job's [`JobResult`](crate::JobResult) for the outcome.
    pub async fn submit(&self, name: &str, job: AsyncJob) -> Result<(), JobQueueError> {
        let queue = self.lookup(name).await?;
        queue.submit(job).await
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.queues.read().await.contains_key(name)
    }

    /// Names of all registered queues, sorted.
    pub async fn queue_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.queues.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn queue_info(&self, name: &str) -> Option<QueueInfo> {
        let queue = self.lookup(name).await.ok()?;
        Some(queue.info().await)
    }

    /// Info for every queue, sorted by name.
    pub async fn list_queues(&self) -> Vec<QueueInfo> {
        let queues: Vec<Arc<JobQueue>> = self.queues.read().await.values().cloned().collect();
        let mut infos = Vec::with_capacity(queues.len());
        for queue in queues {
            infos.push(queue.info().await);
        }
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Close every queue and wait for its workers to finish the jobs already accepted.
    ///
    /// Later submissions fail with [`JobQueueError::QueueClosed`].
    ///
    /// Every queue is closed before any worker is awaited, so cancelling this
    /// future part way (for example on a timeout) never leaves a queue open.
    pub async fn shutdown(&self) {
        let queues: Vec<Arc<JobQueue>> = self.queues.read().await.values().cloned().collect();
        for queue in &queues {
            queue.close().await;
        }
        for queue in &queues {
            queue.join().await;
        }
        info!("job queues shut down");
    }

    async fn lookup(&self, name: &str) -> Result<Arc<JobQueue>, JobQueueError> {
        self.queues
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| JobQueueError::UnknownQueue(name.to_owned()))
    }
}
