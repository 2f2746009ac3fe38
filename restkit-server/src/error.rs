use axum::{http::StatusCode, response::IntoResponse, Json};
use restkit_config::ConfigError;
use restkit_job_queue::JobQueueError;
use restkit_plugins::PluginError;
use serde_json::{json, Value};
use thiserror::Error;

type SqlxError = sqlx::Error;

/// Top-level API error shared by all route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("job queue error: {0}")]
    JobQueue(#[from] JobQueueError),
    #[error("plugin error: {0}")]
    Plugin(#[from] PluginError),
    #[error(transparent)]
    Sqlx(#[from] SqlxError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::JobQueue(e) => match e {
                JobQueueError::UnknownQueue(_) => StatusCode::NOT_FOUND,
                JobQueueError::DuplicateQueue(_) => StatusCode::CONFLICT,
                JobQueueError::InvalidWorkerCount { .. } | JobQueueError::InvalidCapacity { .. } => {
                    StatusCode::BAD_REQUEST
                }
                JobQueueError::QueueClosed(_)
                | JobQueueError::SubmitTimeout { .. }
                | JobQueueError::ResultTimeout(_)
                | JobQueueError::ResultDropped => StatusCode::SERVICE_UNAVAILABLE,
            },
            ApiError::Plugin(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Sqlx(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body used for every error response.
pub fn error_body(status: StatusCode, msg: &str) -> Value {
    json!({ "status": "error", "msg": msg, "code": status.as_u16() })
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(error_body(status, &self.to_string()))).into_response()
    }
}

/// Failure while assembling the application before it serves requests.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Plugin(#[from] PluginError),
    #[error("job queue error: {0}")]
    JobQueue(#[from] JobQueueError),
}
