//! Ordered registry driving plugin initialization and teardown.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use restkit_config::Config;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::context::RequestContext;
use crate::error::PluginError;
use crate::plugin::{Plugin, PluginContext, PluginHandle};

struct Entry {
    name: String,
    plugin: Box<dyn Plugin>,
    handle: Option<PluginHandle>,
}

/// Outcome of [`PluginRegistry::shutdown`].
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Plugins closed cleanly, in the order they were closed.
    pub closed: Vec<String>,
    /// Plugins whose close failed; each error is a [`PluginError::Close`].
    pub failures: Vec<PluginError>,
}

impl ShutdownReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owns the plugin instances in registration order.
pub struct PluginRegistry {
    ctx: PluginContext,
    entries: RwLock<Vec<Entry>>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("ctx", &self.ctx)
            .field("entries", &"<RwLock<Vec<Entry>>>")
            .finish()
    }
}

impl PluginRegistry {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            ctx: PluginContext::new(config),
            entries: RwLock::new(Vec::new()),
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        self.ctx.config()
    }

    /// Initialize `plugin` and install it under `name`.
    pub async fn register<P: Plugin + 'static>(
        &self,
        name: impl Into<String>,
        plugin: P,
    ) -> Result<(), PluginError> {
        self.register_boxed(name, Box::new(plugin)).await
    }

    /// Initialize `plugin` and install it under `name`.
    ///
    /// A plugin that fails to initialize is closed, not installed, and the
    /// failure is returned as [`PluginError::Initialization`]. If `name` is
    /// already taken, the previous instance is closed and the new one takes
    /// the last position in registration order.
    pub async fn register_boxed(
        &self,
        name: impl Into<String>,
        mut plugin: Box<dyn Plugin>,
    ) -> Result<(), PluginError> {
        let name = name.into();
        if let Err(e) = plugin.initialize(&self.ctx).await {
            // release anything acquired before the failure
            if let Err(close_err) = plugin.close().await {
                warn!(plugin = %name, error = %close_err, "failed to close plugin after failed initialization");
            }
            return Err(PluginError::initialization(&name, e));
        }
        let handle = plugin.handle();

        let replaced = {
            let mut entries = self.entries.write().await;
            let previous = entries
                .iter()
                .position(|e| e.name == name)
                .map(|pos| entries.remove(pos));
            entries.push(Entry {
                name: name.clone(),
                plugin,
                handle,
            });
            previous
        };

        if let Some(mut old) = replaced {
            warn!(plugin = %name, "plugin registered twice; closing the previous instance");
            if let Err(e) = old.plugin.close().await {
                error!(plugin = %name, error = %e, "failed to close replaced plugin");
            }
        }

        info!(plugin = %name, "plugin initialized");
        Ok(())
    }

    /// Handle of the live plugin registered as `name`.
    pub async fn handle(&self, name: &str) -> Option<PluginHandle> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| e.handle.clone())
    }

    /// Typed handle of the live plugin registered as `name`.
    pub async fn handle_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.handle(name).await?.downcast::<T>().ok()
    }

    /// Registered plugin names in registration order.
    pub async fn names(&self) -> Vec<String> {
        self.entries
            .read()
            .await
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Snapshot of the configuration and every plugin's handle for one request.
    pub async fn request_context(&self) -> RequestContext {
        let handles = self
            .entries
            .read()
            .await
            .iter()
            .filter_map(|e| e.handle.clone().map(|h| (e.name.clone(), h)))
            .collect();
        RequestContext::new(self.ctx.shared_config(), handles)
    }

    /// Close every plugin in reverse registration order.
    ///
    /// A failing close is logged and recorded; the remaining plugins are
    /// still closed. The registry is left empty.
    pub async fn shutdown(&self) -> ShutdownReport {
        let entries = std::mem::take(&mut *self.entries.write().await);
        let mut report = ShutdownReport::default();

        for mut entry in entries.into_iter().rev() {
            match entry.plugin.close().await {
                Ok(()) => {
                    info!(plugin = %entry.name, "plugin closed");
                    report.closed.push(entry.name);
                }
                Err(e) => {
                    error!(plugin = %entry.name, error = %e, "plugin failed to close");
                    report.failures.push(PluginError::close(&entry.name, e));
                }
            }
        }

        report
    }
}
