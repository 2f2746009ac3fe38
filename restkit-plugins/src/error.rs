use restkit_queries::QueryError;
use thiserror::Error;

/// Boxed cause carried by the lifecycle variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin '{name}' failed to initialize: {source}")]
    Initialization {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("plugin '{name}' failed to close: {source}")]
    Close {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("missing configuration value: {0}")]
    MissingConfig(&'static str),

    #[error("sqldb.driver '{configured}' does not match the {compiled} backend this build supports")]
    UnsupportedDriver {
        configured: String,
        compiled: &'static str,
    },

    #[error("invalid cache url: {0}")]
    InvalidUrl(String),

    #[cfg(any(feature = "sqlite", feature = "postgres", feature = "mysql"))]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[cfg(feature = "redis")]
    #[error("cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl PluginError {
    pub(crate) fn initialization(name: &str, source: PluginError) -> Self {
        Self::Initialization {
            name: name.to_owned(),
            source: Box::new(source),
        }
    }

    pub(crate) fn close(name: &str, source: PluginError) -> Self {
        Self::Close {
            name: name.to_owned(),
            source: Box::new(source),
        }
    }
}
