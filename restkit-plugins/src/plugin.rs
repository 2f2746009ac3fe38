//! Capability contract implemented by every backing-service adapter.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use restkit_config::Config;

use crate::error::PluginError;

/// Type-erased handle a plugin exposes to request handlers.
///
/// Handles are shared across requests and must be safe for concurrent use;
/// downcast with [`Arc::downcast`] or the typed helpers on
/// [`PluginRegistry`](crate::PluginRegistry) and [`RequestContext`](crate::RequestContext).
pub type PluginHandle = Arc<dyn Any + Send + Sync>;

/// Application state handed to plugins while they initialize.
#[derive(Debug, Clone)]
pub struct PluginContext {
    config: Arc<Config>,
}

impl PluginContext {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn shared_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }
}

/// Lifecycle of a backing service: initialize once, hand out a handle, close at shutdown.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Acquire whatever the plugin manages (pools, connections, files).
    async fn initialize(&mut self, ctx: &PluginContext) -> Result<(), PluginError>;

    /// The live handle, or `None` before a successful [`initialize`](Self::initialize).
    fn handle(&self) -> Option<PluginHandle>;

    /// Release the resources acquired in [`initialize`](Self::initialize).
    async fn close(&mut self) -> Result<(), PluginError>;
}
