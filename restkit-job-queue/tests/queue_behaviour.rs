use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use restkit_job_queue::{
    worker_fn, AsyncJob, JobParams, JobQueueError, QueueController, QueueOptions,
};
use serde_json::{json, Value};
use tokio::time::Instant;

fn sleeper(delay: Duration) -> impl restkit_job_queue::JobWorker {
    worker_fn(move |params: JobParams| async move {
        tokio::time::sleep(delay).await;
        json!({ "done": params.get("n").cloned().unwrap_or(Value::Null) })
    })
}

#[tokio::test]
async fn duplicate_queue_is_rejected_and_original_keeps_working() {
    let controller = QueueController::new();
    controller
        .create_queue(
            "mailer",
            worker_fn(|_| async { json!("original") }),
            QueueOptions::new(2),
        )
        .await
        .expect("first create");

    let err = controller
        .create_queue(
            "mailer",
            worker_fn(|_| async { json!("replacement") }),
            QueueOptions::new(1),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, JobQueueError::DuplicateQueue(ref n) if n == "mailer"));

    let (job, result) = AsyncJob::new();
    controller.submit("mailer", job).await.expect("submit");
    assert_eq!(result.wait().await.unwrap(), json!("original"));
    assert_eq!(controller.queue_info("mailer").await.unwrap().workers, 2);
}

#[tokio::test(start_paused = true)]
async fn two_workers_bound_concurrency() {
    let controller = QueueController::new();
    controller
        .create_queue("slow", sleeper(Duration::from_millis(100)), QueueOptions::new(2))
        .await
        .unwrap();

    let start = Instant::now();
    let mut results = Vec::new();
    for n in 0..3 {
        let (mut job, result) = AsyncJob::new();
        job.set("n", n);
        controller.submit("slow", job).await.unwrap();
        results.push(result);
    }
    for (n, result) in results.into_iter().enumerate() {
        assert_eq!(result.wait().await.unwrap(), json!({ "done": n }));
    }
    let elapsed = start.elapsed();

    // 3 jobs on 2 workers: two rounds, not three and not one.
    assert!(elapsed >= Duration::from_millis(200), "took {elapsed:?}");
    assert!(elapsed < Duration::from_millis(300), "took {elapsed:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_job_gets_exactly_its_own_result() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let controller = QueueController::new();
    controller
        .create_queue(
            "double",
            worker_fn(move |params: JobParams| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let n = params.get("n").and_then(Value::as_u64).unwrap_or(0);
                    json!(n * 2)
                }
            }),
            QueueOptions::new(4).with_capacity(8),
        )
        .await
        .unwrap();

    let mut pending = Vec::new();
    for n in 0..50u64 {
        let (mut job, result) = AsyncJob::new();
        job.set("n", n);
        controller.submit("double", job).await.unwrap();
        pending.push((n, result));
    }
    for (n, result) in pending {
        assert_eq!(result.wait().await.unwrap(), json!(n * 2));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 50);
    assert_eq!(controller.queue_info("double").await.unwrap().processed, 50);
}

#[tokio::test]
async fn panicking_job_does_not_take_the_worker_down() {
    let controller = QueueController::new();
    controller
        .create_queue(
            "fragile",
            worker_fn(|params: JobParams| async move {
                if params.contains_key("boom") {
                    panic!("worker blew up");
                }
                json!("fine")
            }),
            QueueOptions::new(1),
        )
        .await
        .unwrap();

    let (mut bad, bad_result) = AsyncJob::new();
    bad.set("boom", true);
    controller.submit("fragile", bad).await.unwrap();
    assert!(matches!(
        bad_result.wait().await,
        Err(JobQueueError::ResultDropped)
    ));

    let (good, good_result) = AsyncJob::new();
    controller.submit("fragile", good).await.unwrap();
    assert_eq!(good_result.wait().await.unwrap(), json!("fine"));
}

#[tokio::test]
async fn abandoned_result_does_not_stall_the_queue() {
    let controller = QueueController::new();
    controller
        .create_queue("q", sleeper(Duration::from_millis(5)), QueueOptions::new(1))
        .await
        .unwrap();

    let (job, result) = AsyncJob::new();
    controller.submit("q", job).await.unwrap();
    drop(result);

    let (mut job, result) = AsyncJob::new();
    job.set("n", 7);
    controller.submit("q", job).await.unwrap();
    assert_eq!(result.wait().await.unwrap(), json!({ "done": 7 }));
}

#[tokio::test(start_paused = true)]
async fn full_queue_times_out_submission() {
    let controller = QueueController::new();
    controller
        .create_queue(
            "busy",
            sleeper(Duration::from_secs(10)),
            QueueOptions::new(1)
                .with_capacity(1)
                .with_submit_timeout(Duration::from_millis(50)),
        )
        .await
        .unwrap();

    // first job is claimed by the worker, second fills the buffer
    let (first, _r1) = AsyncJob::new();
    controller.submit("busy", first).await.unwrap();
    let (second, _r2) = AsyncJob::new();
    controller.submit("busy", second).await.unwrap();

    let (third, third_result) = AsyncJob::new();
    let err = controller.submit("busy", third).await.unwrap_err();
    assert!(matches!(err, JobQueueError::SubmitTimeout { ref name, .. } if name == "busy"));
    assert!(matches!(
        third_result.wait().await,
        Err(JobQueueError::ResultDropped)
    ));
}

#[tokio::test(start_paused = true)]
async fn result_wait_timeout_leaves_job_running() {
    let controller = QueueController::new();
    controller
        .create_queue("slow", sleeper(Duration::from_secs(1)), QueueOptions::new(1))
        .await
        .unwrap();

    let (job, result) = AsyncJob::new();
    controller.submit("slow", job).await.unwrap();
    let err = result
        .wait_timeout(Duration::from_millis(100))
        .await
        .unwrap_err();
    assert!(matches!(err, JobQueueError::ResultTimeout(_)));

    // the job still finishes and the worker moves on
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(controller.queue_info("slow").await.unwrap().processed, 1);
}

#[tokio::test]
async fn shutdown_drains_accepted_jobs_then_rejects() {
    let controller = QueueController::new();
    controller
        .create_queue(
            "drain",
            sleeper(Duration::from_millis(10)),
            QueueOptions::new(1).with_capacity(4),
        )
        .await
        .unwrap();

    let mut results = Vec::new();
    for n in 0..3 {
        let (mut job, result) = AsyncJob::new();
        job.set("n", n);
        controller.submit("drain", job).await.unwrap();
        results.push(result);
    }

    controller.shutdown().await;
    for (n, result) in results.into_iter().enumerate() {
        assert_eq!(result.wait().await.unwrap(), json!({ "done": n }));
    }

    let (job, _result) = AsyncJob::new();
    let err = controller.submit("drain", job).await.unwrap_err();
    assert!(matches!(err, JobQueueError::QueueClosed(_)));
    assert!(controller.queue_info("drain").await.unwrap().closed);

    // second shutdown is a no-op
    controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn interrupted_shutdown_still_closes_every_queue() {
    let controller = QueueController::new();
    for name in ["a", "b"] {
        controller
            .create_queue(name, sleeper(Duration::from_secs(10)), QueueOptions::new(1))
            .await
            .unwrap();
        let (job, _result) = AsyncJob::new();
        controller.submit(name, job).await.unwrap();
    }

    let outcome = tokio::time::timeout(Duration::from_millis(100), controller.shutdown()).await;
    assert!(outcome.is_err(), "draining 10s jobs should outlast the timeout");

    for info in controller.list_queues().await {
        assert!(info.closed, "queue {} left open", info.name);
    }
    for name in ["a", "b"] {
        let (job, _result) = AsyncJob::new();
        let err = controller.submit(name, job).await.unwrap_err();
        assert!(matches!(err, JobQueueError::QueueClosed(ref n) if n == name));
    }
}
