//! Named background job queues served by fixed pools of tokio workers.
//!
//! # Architecture
//!
//! - [`QueueController`] - Registry of named queues; creates queues and routes submissions
//! - [`JobWorker`] - Trait for the function a queue's workers run
//! - [`AsyncJob`] - Parameters for one unit of work
//! - [`JobResult`] - The submitter's end of a job's one-shot result conduit
//!
//! # Example
//!
//! ```rust,no_run
//! use restkit_job_queue::{worker_fn, AsyncJob, JobParams, QueueController, QueueOptions};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), restkit_job_queue::JobQueueError> {
//!     let controller = QueueController::new();
//!     controller
//!         .create_queue(
//!             "mailer",
//!             worker_fn(|params: JobParams| async move { json!({ "sent": params.len() }) }),
//!             QueueOptions::new(2),
//!         )
//!         .await?;
//!
//!     let (mut job, result) = AsyncJob::new();
//!     job.set("to", "ops@example.com");
//!     controller.submit("mailer", job).await?;
//!     println!("worker replied: {}", result.wait().await?);
//!     Ok(())
//! }
//! ```

mod controller;
mod error;
mod queue;
mod types;
mod worker;

pub use controller::QueueController;
pub use error::JobQueueError;
pub use queue::{QueueOptions, DEFAULT_CAPACITY};
pub use types::{AsyncJob, JobParams, JobResult, QueueInfo};
pub use worker::{worker_fn, FnWorker, JobWorker};

// Re-export async_trait for convenience when implementing JobWorker
pub use async_trait::async_trait;
