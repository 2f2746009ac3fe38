use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(feature = "mysql")]
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
#[cfg(feature = "postgres")]
use sqlx::postgres::{PgPool, PgPoolOptions};
#[cfg(feature = "sqlite")]
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::PluginError;
use crate::plugin::{Plugin, PluginContext, PluginHandle};

#[cfg(any(
    all(feature = "postgres", feature = "mysql"),
    all(feature = "postgres", feature = "sqlite"),
    all(feature = "mysql", feature = "sqlite"),
))]
compile_error!("Activate only one backend feature (`postgres`, `mysql`, or `sqlite`) for restkit-plugins.");

/// Pool type of the compiled relational backend.
#[cfg(feature = "postgres")]
pub type DbPool = PgPool;
#[cfg(feature = "mysql")]
pub type DbPool = MySqlPool;
#[cfg(feature = "sqlite")]
pub type DbPool = SqlitePool;

#[cfg(feature = "postgres")]
type DbPoolOptions = PgPoolOptions;
#[cfg(feature = "mysql")]
type DbPoolOptions = MySqlPoolOptions;
#[cfg(feature = "sqlite")]
type DbPoolOptions = SqlitePoolOptions;

/// Name of the compiled relational backend.
#[cfg(feature = "postgres")]
pub const BACKEND: &str = "postgresql";
#[cfg(feature = "mysql")]
pub const BACKEND: &str = "mysql";
#[cfg(feature = "sqlite")]
pub const BACKEND: &str = "sqlite3";

/// Whether a `sqldb.driver` value names the compiled backend.
fn driver_matches(driver: &str) -> bool {
    let driver = driver.trim().to_ascii_lowercase();
    match BACKEND {
        "postgresql" => matches!(driver.as_str(), "postgres" | "postgresql"),
        "sqlite3" => matches!(driver.as_str(), "sqlite" | "sqlite3"),
        other => driver == other,
    }
}

/// Relational store backed by a sqlx [`DbPool`].
///
/// Reads the `sqldb` configuration section. The handle is the pool itself.
#[derive(Debug, Default)]
pub struct SqlPlugin {
    pool: Option<DbPool>,
}

impl SqlPlugin {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Plugin for SqlPlugin {
    async fn initialize(&mut self, ctx: &PluginContext) -> Result<(), PluginError> {
        let cfg = &ctx.config().sqldb;
        if let Some(driver) = cfg.driver.as_deref() {
            if !driver_matches(driver) {
                return Err(PluginError::UnsupportedDriver {
                    configured: driver.to_owned(),
                    compiled: BACKEND,
                });
            }
        }
        let connstring = cfg
            .connstring
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(PluginError::MissingConfig("sqldb.connstring"))?;

        let mut opts = DbPoolOptions::new()
            .max_connections(cfg.max_conn)
            .min_connections(cfg.max_idle.min(cfg.max_conn));
        if let Some(secs) = cfg.idle_timeout_secs {
            opts = opts.idle_timeout(Duration::from_secs(secs));
        }

        // sqlite creates the database file on first open
        #[cfg(feature = "sqlite")]
        let pool = {
            use std::str::FromStr;
            let connect = SqliteConnectOptions::from_str(connstring)?.create_if_missing(true);
            opts.connect_with(connect).await?
        };
        #[cfg(not(feature = "sqlite"))]
        let pool = opts.connect(connstring).await?;

        self.pool = Some(pool.clone());
        sqlx::query("SELECT 1").execute(&pool).await?;
        info!(
            backend = BACKEND,
            max_conn = cfg.max_conn,
            max_idle = cfg.max_idle,
            "sql pool ready"
        );
        Ok(())
    }

    fn handle(&self) -> Option<PluginHandle> {
        self.pool
            .clone()
            .map(|pool| Arc::new(pool) as PluginHandle)
    }

    async fn close(&mut self) -> Result<(), PluginError> {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            debug!("sql pool closed");
        }
        Ok(())
    }
}
