//! Worker trait for implementing job handlers.

use std::future::Future;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::JobParams;

/// Trait for the function a queue's workers run against each job.
///
/// The returned value is delivered to the job's submitter as-is. Failures are
/// part of that value (for example `{"status": "error", ...}`); the queue does
/// not interpret it.
#[async_trait]
pub trait JobWorker: Send + Sync {
    async fn run(&self, params: JobParams) -> Value;
}

/// Adapter turning an async closure into a [`JobWorker`].
pub struct FnWorker<F> {
    f: F,
}

impl<F> std::fmt::Debug for FnWorker<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnWorker").finish_non_exhaustive()
    }
}

/// Wrap `f` so it can be used as a queue worker.
pub fn worker_fn<F, Fut>(f: F) -> FnWorker<F>
where
    F: Fn(JobParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Value> + Send + 'static,
{
    FnWorker { f }
}

#[async_trait]
impl<F, Fut> JobWorker for FnWorker<F>
where
    F: Fn(JobParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Value> + Send + 'static,
{
    async fn run(&self, params: JobParams) -> Value {
        (self.f)(params).await
    }
}
