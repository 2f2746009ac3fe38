use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Extension, Path};
use axum::Json;
use restkit_job_queue::AsyncJob;
use serde_json::Value;
use tracing::debug;

use crate::{error::ApiError, mailer, state::AppState};

/// GET /mailer/{from}/{to}
/// Queue a mail job and answer with the worker's reply.
pub async fn send_mail(
    Extension(state): Extension<Arc<AppState>>,
    Path((from, to)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let (mut job, result) = AsyncJob::new();
    job.set("from", from);
    job.set("to", to);
    let job_id = job.id();

    state.queues.submit(mailer::QUEUE, job).await?;
    debug!(%job_id, "mail job submitted");

    let reply = match state.config.jobs.result_timeout_secs {
        Some(secs) => result.wait_timeout(Duration::from_secs(secs)).await?,
        None => result.wait().await?,
    };
    Ok(Json(reply))
}
