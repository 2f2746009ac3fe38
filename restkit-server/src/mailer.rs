//! Demo background queue that pretends to deliver mail.

use std::time::Duration;

use restkit_config::JobsConfig;
use restkit_job_queue::{worker_fn, JobParams, JobQueueError, JobWorker, QueueController, QueueOptions};
use serde_json::{json, Value};
use tracing::debug;

/// Queue name the mailer is registered under.
pub const QUEUE: &str = "mailer";

/// Worker that waits `delay` and reports the delivery.
pub fn mail_worker(delay: Duration) -> impl JobWorker {
    worker_fn(move |params: JobParams| async move {
        let (Some(from), Some(to)) = (
            params.get("from").and_then(Value::as_str),
            params.get("to").and_then(Value::as_str),
        ) else {
            return json!({ "status": "error", "msg": "mail job needs 'from' and 'to'" });
        };

        tokio::time::sleep(delay).await;
        debug!(%from, %to, "mail delivered");
        json!({ "status": format!("mail sent from: {from} to: {to}") })
    })
}

/// Queue shape derived from the `jobs` configuration section.
pub fn queue_options(jobs: &JobsConfig) -> QueueOptions {
    let options = QueueOptions::new(jobs.mailer_workers).with_capacity(jobs.capacity);
    match jobs.submit_timeout_secs {
        Some(secs) => options.with_submit_timeout(Duration::from_secs(secs)),
        None => options,
    }
}

pub async fn register(queues: &QueueController, jobs: &JobsConfig) -> Result<(), JobQueueError> {
    queues
        .create_queue(
            QUEUE,
            mail_worker(Duration::from_millis(jobs.mailer_delay_ms)),
            queue_options(jobs),
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use restkit_config::Config;

    #[tokio::test]
    async fn reports_sender_and_recipient() {
        let worker = mail_worker(Duration::ZERO);
        let mut params = JobParams::new();
        params.insert("from".into(), json!("alice"));
        params.insert("to".into(), json!("bob"));
        assert_eq!(
            worker.run(params).await,
            json!({ "status": "mail sent from: alice to: bob" })
        );
    }

    #[tokio::test]
    async fn missing_params_are_reported_in_the_reply() {
        let reply = mail_worker(Duration::ZERO).run(JobParams::new()).await;
        assert_eq!(reply["status"], "error");
    }

    #[test]
    fn options_follow_jobs_section() {
        let mut jobs = Config::default().jobs;
        jobs.mailer_workers = 3;
        jobs.capacity = 5;
        jobs.submit_timeout_secs = Some(2);
        let options = queue_options(&jobs);
        assert_eq!(options.workers, 3);
        assert_eq!(options.capacity, 5);
        assert_eq!(options.submit_timeout, Some(Duration::from_secs(2)));
    }
}
