use std::io::Write;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use restkit_config::Config;
use restkit_server::{with_middleware, Application};
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tower::util::ServiceExt;

async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
    let res = router
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn quick_mailer_config() -> Config {
    let mut cfg = Config::default();
    cfg.jobs.mailer_delay_ms = 0;
    cfg
}

fn query_file(contents: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().expect("tmpfile");
    f.write_all(contents.as_bytes()).unwrap();
    f
}

#[tokio::test]
async fn index_and_health() {
    let app = Application::new(Config::default());

    let (status, body) = get_json(app.router(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "welcome": "hello world" }));

    let res = app
        .router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = Application::new(Config::default());
    let res = app
        .router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let id = res.headers().get("x-request-id").expect("request id header");
    assert!(!id.is_empty());

    // a caller-supplied id is echoed back
    let res = app
        .router()
        .oneshot(
            Request::get("/health")
                .header("x-request-id", "trace-me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-me");
}

#[tokio::test]
async fn mailer_round_trip() {
    let app = Application::bootstrap(quick_mailer_config()).await.unwrap();

    let (status, body) = get_json(app.router(), "/mailer/alice@example.com/bob@example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "status": "mail sent from: alice@example.com to: bob@example.com" })
    );

    let (status, body) = get_json(app.router(), "/queues").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "mailer");
    assert_eq!(body[0]["workers"], 2);
    assert_eq!(body[0]["processed"], 1);
}

#[tokio::test]
async fn mailer_without_queue_is_not_found() {
    let app = Application::new(Config::default());
    let (status, body) = get_json(app.router(), "/mailer/a/b").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert_eq!(body["code"], 404);
    assert!(body["msg"].as_str().unwrap().contains("mailer"));
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn dbversion_runs_catalog_query() {
    let queries = query_file("-- name: version\nselect sqlite_version();\n");
    let mut cfg = Config::default();
    cfg.sqldb.connstring = Some("sqlite::memory:".into());
    cfg.sqldb.max_conn = 1;
    cfg.sqldb.max_idle = 1;
    cfg.sqlqueries.path = Some(queries.path().to_string_lossy().into_owned());

    let app = Application::bootstrap(cfg).await.unwrap();
    let (status, body) = get_json(app.router(), "/dbversion").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["db"].as_str().is_some_and(|v| v.starts_with('3')));

    let report = app.shutdown().await;
    assert_eq!(report.closed, vec!["queries", "sql"]);
}

#[tokio::test]
async fn dbversion_reports_missing_query() {
    let queries = query_file("-- name: count\nselect count(*) from t;\n");
    let mut cfg = Config::default();
    cfg.sqlqueries.path = Some(queries.path().to_string_lossy().into_owned());

    let app = Application::bootstrap(cfg).await.unwrap();
    let (status, body) = get_json(app.router(), "/dbversion").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn dbversion_without_plugins_is_unavailable() {
    let app = Application::new(Config::default());
    let (status, body) = get_json(app.router(), "/dbversion").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "error");
}

async fn explode() -> &'static str {
    panic!("handler exploded")
}

#[tokio::test]
async fn panicking_handler_yields_json_500() {
    let app = Application::new(Config::default());
    let router = with_middleware(Router::new().route("/boom", get(explode)), app.state());

    let (status, body) = get_json(router.clone(), "/boom").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], 500);

    // the service keeps answering afterwards
    let (status, _) = get_json(router, "/boom").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn handlers_see_injected_context() {
    use axum::extract::Extension;
    use restkit_plugins::RequestContext;

    async fn app_name(Extension(ctx): Extension<RequestContext>) -> String {
        ctx.config().app.name.clone()
    }

    let mut cfg = Config::default();
    cfg.app.name = "inventory".into();
    let app = Application::new(cfg);
    let router = with_middleware(Router::new().route("/name", get(app_name)), app.state());

    let res = router
        .oneshot(Request::get("/name").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"inventory");
}
