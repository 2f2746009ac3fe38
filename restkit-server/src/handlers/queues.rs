use std::sync::Arc;

use axum::extract::Extension;
use axum::Json;
use restkit_job_queue::QueueInfo;

use crate::state::AppState;

/// GET /queues
pub async fn list_queues(Extension(state): Extension<Arc<AppState>>) -> Json<Vec<QueueInfo>> {
    Json(state.queues.list_queues().await)
}
