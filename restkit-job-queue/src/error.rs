//! Error types for the job queue system.

use std::time::Duration;

use thiserror::Error;

/// Errors that may occur while creating queues or submitting jobs.
#[derive(Debug, Error)]
pub enum JobQueueError {
    #[error("job queue {0:?} already exists")]
    DuplicateQueue(String),

    #[error("job queue {0:?} does not exist")]
    UnknownQueue(String),

    #[error("job queue {name:?} needs at least one worker")]
    InvalidWorkerCount { name: String },

    #[error("job queue {name:?} needs a capacity of at least one job")]
    InvalidCapacity { name: String },

    #[error("job queue {0:?} is closed")]
    QueueClosed(String),

    #[error("timed out after {timeout:?} waiting for room on job queue {name:?}")]
    SubmitTimeout { name: String, timeout: Duration },

    #[error("timed out after {0:?} waiting for a job result")]
    ResultTimeout(Duration),

    #[error("job finished without delivering a result")]
    ResultDropped,
}
