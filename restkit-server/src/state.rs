use std::sync::Arc;

use restkit_config::Config;
use restkit_job_queue::QueueController;
use restkit_plugins::PluginRegistry;

/// Shared application state passed to every route handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<PluginRegistry>,
    pub queues: QueueController,
}

impl AppState {
    pub fn new(config: Arc<Config>, registry: Arc<PluginRegistry>, queues: QueueController) -> Self {
        Self {
            config,
            registry,
            queues,
        }
    }
}
