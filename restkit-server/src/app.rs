use std::any::Any;
use std::sync::Arc;

use axum::extract::{Extension, Request};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::error::error_body;
use crate::handlers;
use crate::state::AppState;

/// Build the application router with the provided shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/", get(handlers::health::index))
        .route("/health", get(handlers::health::health))
        .route("/dbversion", get(handlers::dbversion::db_version))
        .route("/mailer/{from}/{to}", get(handlers::mailer::send_mail))
        .route("/queues", get(handlers::queues::list_queues));
    with_middleware(router, state)
}

/// Wrap `router` in the request pipeline shared by every route.
///
/// Layers from the inside out: plugin injection, panic recovery, request id
/// propagation, request tracing, request id assignment.
pub fn with_middleware(router: Router, state: Arc<AppState>) -> Router {
    let inject_state = Arc::clone(&state);
    router
        .layer(middleware::from_fn(move |mut req: Request, next: Next| {
            let state = Arc::clone(&inject_state);
            async move {
                let ctx = state.registry.request_context().await;
                req.extensions_mut().insert(ctx);
                next.run(req).await
            }
        }))
        .layer(Extension(state))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = %detail, "request handler panicked");

    let status = StatusCode::INTERNAL_SERVER_ERROR;
    (status, Json(error_body(status, "internal server error"))).into_response()
}
