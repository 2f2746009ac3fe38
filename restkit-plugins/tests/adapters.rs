use std::io::Write;
use std::sync::Arc;
#[cfg(feature = "redis")]
use std::time::Duration;

use restkit_config::Config;
#[cfg(feature = "redis")]
use restkit_plugins::adapters::CachePlugin;
use restkit_plugins::adapters::{self, QueryCatalogPlugin};
#[cfg(any(feature = "sqlite", feature = "postgres", feature = "mysql"))]
use restkit_plugins::adapters::SqlPlugin;
use restkit_plugins::{PluginError, PluginRegistry};
use restkit_queries::QueryCatalog;
#[cfg(feature = "sqlite")]
use sqlx::SqlitePool;
use tempfile::NamedTempFile;

fn config_with(f: impl FnOnce(&mut Config)) -> Arc<Config> {
    let mut cfg = Config::default();
    f(&mut cfg);
    Arc::new(cfg)
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn sql_plugin_opens_in_memory_pool() {
    let registry = PluginRegistry::new(config_with(|c| {
        c.sqldb.connstring = Some("sqlite::memory:".into());
        c.sqldb.max_conn = 1;
        c.sqldb.max_idle = 1;
    }));
    registry.register(adapters::SQL, SqlPlugin::new()).await.unwrap();

    let pool = registry.handle_as::<SqlitePool>(adapters::SQL).await.unwrap();
    let version: String = sqlx::query_scalar("select sqlite_version()")
        .fetch_one(&*pool)
        .await
        .unwrap();
    assert!(!version.is_empty());

    let report = registry.shutdown().await;
    assert!(report.is_clean());
    assert!(pool.is_closed());
}

#[cfg(any(feature = "sqlite", feature = "postgres", feature = "mysql"))]
#[tokio::test]
async fn sql_plugin_requires_connstring() {
    let registry = PluginRegistry::new(Arc::new(Config::default()));
    let err = registry
        .register(adapters::SQL, SqlPlugin::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PluginError::Initialization { .. }));
    assert!(err.to_string().contains("sqldb.connstring"));
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn sql_plugin_rejects_driver_of_another_backend() {
    let registry = PluginRegistry::new(config_with(|c| {
        c.sqldb.driver = Some("mysql".into());
        c.sqldb.connstring = Some("sqlite::memory:".into());
    }));
    let err = registry
        .register(adapters::SQL, SqlPlugin::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("does not match the sqlite3 backend"));
    assert!(registry.handle(adapters::SQL).await.is_none());
}

#[tokio::test]
async fn query_catalog_plugin_loads_configured_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "-- name: version\nselect sqlite_version();").unwrap();
    let path = file.path().to_string_lossy().into_owned();

    let registry = PluginRegistry::new(config_with(|c| c.sqlqueries.path = Some(path)));
    registry
        .register(adapters::QUERIES, QueryCatalogPlugin::new())
        .await
        .unwrap();

    let ctx = registry.request_context().await;
    let catalog = ctx.get::<QueryCatalog>(adapters::QUERIES).unwrap();
    assert_eq!(catalog.get("version"), Some("select sqlite_version();"));
}

#[tokio::test]
async fn query_catalog_plugin_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let registry = PluginRegistry::new(Arc::new(Config::default()));
    let err = registry
        .register(
            adapters::QUERIES,
            QueryCatalogPlugin::with_path(dir.path().join("missing.sql")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PluginError::Initialization { ref name, .. } if name == adapters::QUERIES));
}

#[cfg(feature = "redis")]
#[tokio::test]
async fn cache_plugin_fails_against_closed_port() {
    let registry = PluginRegistry::new(config_with(|c| {
        c.redis.url = Some("redis://127.0.0.1:1/".into());
    }));
    let outcome = tokio::time::timeout(
        Duration::from_secs(10),
        registry.register(adapters::CACHE, CachePlugin::new()),
    )
    .await;

    // a refused connection fails fast; a filtered one may only hit the timeout
    if let Ok(result) = outcome {
        assert!(matches!(result, Err(PluginError::Initialization { .. })));
    }
    assert!(registry.handle(adapters::CACHE).await.is_none());
}
