use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use restkit_queries::QueryCatalog;
use tracing::info;

use crate::error::PluginError;
use crate::plugin::{Plugin, PluginContext, PluginHandle};

/// Named query catalog loaded from a tagged query file.
///
/// The file comes from `sqlqueries.path` unless one is given with
/// [`with_path`](Self::with_path). The handle is a [`QueryCatalog`].
#[derive(Debug, Default)]
pub struct QueryCatalogPlugin {
    path: Option<PathBuf>,
    catalog: Option<Arc<QueryCatalog>>,
}

impl QueryCatalogPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            catalog: None,
        }
    }
}

#[async_trait]
impl Plugin for QueryCatalogPlugin {
    async fn initialize(&mut self, ctx: &PluginContext) -> Result<(), PluginError> {
        let path = match &self.path {
            Some(p) => p.clone(),
            None => ctx
                .config()
                .sqlqueries
                .path
                .as_deref()
                .map(PathBuf::from)
                .ok_or(PluginError::MissingConfig("sqlqueries.path"))?,
        };

        let catalog = QueryCatalog::load(&path)?;
        info!(path = %path.display(), queries = catalog.len(), "query catalog loaded");
        self.catalog = Some(Arc::new(catalog));
        Ok(())
    }

    fn handle(&self) -> Option<PluginHandle> {
        self.catalog.clone().map(|c| c as PluginHandle)
    }

    async fn close(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
}
