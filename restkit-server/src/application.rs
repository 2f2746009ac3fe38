//! Application lifecycle: plugin startup, serving, and ordered teardown.

use std::future::Future;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use restkit_config::{AppConfig, Config};
use restkit_job_queue::QueueController;
use restkit_plugins::adapters::{self, CachePlugin, QueryCatalogPlugin, SqlPlugin};
use restkit_plugins::{Plugin, PluginError, PluginRegistry, ShutdownReport};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::app::build_router;
use crate::error::StartupError;
use crate::mailer;
use crate::state::AppState;

/// Owns the configuration, plugins and job queues of a running service.
#[derive(Debug)]
pub struct Application {
    state: Arc<AppState>,
}

impl Application {
    /// An application with no plugins and no queues.
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let registry = Arc::new(PluginRegistry::new(Arc::clone(&config)));
        Self {
            state: Arc::new(AppState::new(config, registry, QueueController::new())),
        }
    }

    /// Build the application described by `config`.
    pub async fn bootstrap(config: Config) -> Result<Self, StartupError> {
        Self::new(config).start().await
    }

    /// Register a plugin for every configured backing service (relational
    /// store, cache, query catalog), then the mailer queue.
    ///
    /// If any step fails, every plugin already running, including those added
    /// through [`register_plugin`](Self::register_plugin), is closed before the
    /// error is returned.
    pub async fn start(self) -> Result<Self, StartupError> {
        if let Err(e) = self.start_services().await {
            let report = self.state.registry.shutdown().await;
            warn!(
                error = %e,
                closed = report.closed.len(),
                failed = report.failures.len(),
                "startup failed; plugins closed"
            );
            return Err(e);
        }
        Ok(self)
    }

    async fn start_services(&self) -> Result<(), StartupError> {
        self.register_configured_plugins().await?;
        mailer::register(&self.state.queues, &self.state.config.jobs).await?;
        Ok(())
    }

    async fn register_configured_plugins(&self) -> Result<(), PluginError> {
        let cfg = &self.state.config;
        if cfg.sqldb.connstring.is_some() {
            self.register_plugin(adapters::SQL, SqlPlugin::new()).await?;
        }
        if cfg.redis.url.is_some() {
            self.register_plugin(adapters::CACHE, CachePlugin::new()).await?;
        }
        if cfg.sqlqueries.path.is_some() {
            self.register_plugin(adapters::QUERIES, QueryCatalogPlugin::new())
                .await?;
        }
        Ok(())
    }

    /// Initialize and install an additional plugin.
    pub async fn register_plugin<P: Plugin + 'static>(
        &self,
        name: &str,
        plugin: P,
    ) -> Result<(), PluginError> {
        self.state.registry.register(name, plugin).await
    }

    #[inline]
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    #[inline]
    pub fn queues(&self) -> &QueueController {
        &self.state.queues
    }

    pub fn router(&self) -> Router {
        build_router(self.state())
    }

    /// Serve HTTP on `listener` until `signal` resolves, then shut down.
    pub async fn serve<F>(self, listener: TcpListener, signal: F) -> std::io::Result<ShutdownReport>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(signal)
            .await?;
        info!("http server stopped");
        Ok(self.shutdown().await)
    }

    /// Drain the job queues, then close plugins in reverse registration order.
    ///
    /// Queue draining is bounded by `app.shutdown_timeout_secs`; jobs still
    /// running after that are abandoned.
    pub async fn shutdown(&self) -> ShutdownReport {
        let timeout = Duration::from_secs(self.state.config.app.shutdown_timeout_secs);
        if tokio::time::timeout(timeout, self.state.queues.shutdown())
            .await
            .is_err()
        {
            warn!(?timeout, "job queues did not drain before the shutdown timeout");
        }

        let report = self.state.registry.shutdown().await;
        info!(
            closed = report.closed.len(),
            failed = report.failures.len(),
            "plugins shut down"
        );
        report
    }
}

/// Socket address for `app.host` / `app.port`, falling back to all interfaces.
pub fn bind_address(cfg: &AppConfig) -> SocketAddr {
    let (host, port) = (cfg.host.as_str(), cfg.port);
    if host.eq_ignore_ascii_case("localhost") {
        return SocketAddr::from(([127, 0, 0, 1], port));
    }
    host.parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, port))
        .or_else(|_| host.parse::<SocketAddr>())
        .or_else(|_| {
            host.trim_matches(|c| c == '[' || c == ']')
                .parse::<Ipv6Addr>()
                .map(|ip| SocketAddr::new(IpAddr::V6(ip), port))
        })
        .unwrap_or_else(|_| {
            warn!(%host, "unparseable bind host; listening on all interfaces");
            SocketAddr::from(([0, 0, 0, 0], port))
        })
}

/// Resolves on ctrl-c, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
