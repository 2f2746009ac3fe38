use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// GET /health
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /
pub async fn index() -> Json<Value> {
    Json(json!({ "welcome": "hello world" }))
}
