//! Core types for the job queue system.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::JobQueueError;

/// Named parameters handed to a worker.
pub type JobParams = Map<String, Value>;

/// One unit of background work.
///
/// A job is created together with its [`JobResult`]. The job itself is moved
/// into a queue on submission, so it can only ever be submitted once; the
/// worker that claims it consumes the reply half when it writes the result.
#[derive(Debug)]
pub struct AsyncJob {
    id: Uuid,
    params: JobParams,
    reply: oneshot::Sender<Value>,
}

impl AsyncJob {
    /// Create an empty job and the handle used to read its result.
    pub fn new() -> (Self, JobResult) {
        Self::with_params(JobParams::new())
    }

    /// Create a job pre-populated with parameters.
    pub fn with_params(params: JobParams) -> (Self, JobResult) {
        let (reply, rx) = oneshot::channel();
        let id = Uuid::new_v4();
        (Self { id, params, reply }, JobResult { id, rx })
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Set a named parameter, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.params.insert(key.into(), value.into());
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    #[inline]
    pub fn params(&self) -> &JobParams {
        &self.params
    }

    pub(crate) fn into_parts(self) -> (Uuid, JobParams, oneshot::Sender<Value>) {
        (self.id, self.params, self.reply)
    }
}

/// Read side of a job's single-slot result conduit.
#[derive(Debug)]
pub struct JobResult {
    id: Uuid,
    rx: oneshot::Receiver<Value>,
}

impl JobResult {
    /// Id of the job this result belongs to.
    #[inline]
    pub fn job_id(&self) -> Uuid {
        self.id
    }

    /// Wait until a worker has finished the job.
    ///
    /// Fails with [`JobQueueError::ResultDropped`] if the job was discarded
    /// (submission timed out, the queue was closed, or the worker panicked).
    pub async fn wait(self) -> Result<Value, JobQueueError> {
        self.rx.await.map_err(|_| JobQueueError::ResultDropped)
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`.
    ///
    /// Giving up only abandons the wait. The job keeps running and its result
    /// is discarded when it arrives.
    pub async fn wait_timeout(self, timeout: Duration) -> Result<Value, JobQueueError> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(JobQueueError::ResultDropped),
            Err(_) => Err(JobQueueError::ResultTimeout(timeout)),
        }
    }
}

/// Snapshot of a queue's shape and throughput.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueInfo {
    pub name: String,
    pub workers: usize,
    pub capacity: usize,
    /// Jobs whose worker function returned a value.
    pub processed: u64,
    pub closed: bool,
}
