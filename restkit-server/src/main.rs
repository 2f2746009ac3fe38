//! restkit server
//!
//! Loads configuration, starts the configured plugins and job queues, and
//! serves HTTP until ctrl-c or SIGTERM.

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use restkit_server::application::{bind_address, shutdown_signal};
use restkit_server::Application;

mod cli;
mod tracing_setup;

use cli::Cli;
use tracing_setup::install_tracing_from_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let config = restkit_config::load_config(args.config.as_deref())
        .context("failed to load configuration")?;
    restkit_config::validate_config(&config).context("invalid configuration")?;

    install_tracing_from_config(&config.logging)?;
    tracing::info!(
        app = %config.app.name,
        config_path = ?args.config,
        "configuration loaded"
    );

    let addr = bind_address(&config.app);
    let app = Application::bootstrap(config)
        .await
        .context("failed to start application")?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "server listening");

    let report = app.serve(listener, shutdown_signal()).await?;
    if !report.is_clean() {
        for failure in &report.failures {
            tracing::error!(error = %failure, "plugin close failed during shutdown");
        }
    }
    tracing::info!("server stopped");
    Ok(())
}
