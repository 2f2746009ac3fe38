use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tracing::{debug, info};
use url::Url;

use crate::error::PluginError;
use crate::plugin::{Plugin, PluginContext, PluginHandle};

/// Cache pool backed by a redis multiplexed connection.
///
/// Reads the `redis` configuration section. The handle is a
/// [`MultiplexedConnection`]; clone it to issue commands.
#[derive(Default)]
pub struct CachePlugin {
    connection: Option<MultiplexedConnection>,
}

impl std::fmt::Debug for CachePlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachePlugin")
            .field("connected", &self.connection.is_some())
            .finish()
    }
}

impl CachePlugin {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Merge a configured password into the connection url.
///
/// An empty or absent password leaves the url as configured.
pub fn connection_url(raw: &str, password: Option<&str>) -> Result<String, PluginError> {
    let Some(password) = password.filter(|p| !p.is_empty()) else {
        return Ok(raw.to_owned());
    };
    let mut url = Url::parse(raw).map_err(|e| PluginError::InvalidUrl(e.to_string()))?;
    url.set_password(Some(password))
        .map_err(|_| PluginError::InvalidUrl(format!("cannot attach a password to '{raw}'")))?;
    Ok(url.into())
}

#[async_trait]
impl Plugin for CachePlugin {
    async fn initialize(&mut self, ctx: &PluginContext) -> Result<(), PluginError> {
        let cfg = &ctx.config().redis;
        let raw = cfg
            .url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(PluginError::MissingConfig("redis.url"))?;

        let url = connection_url(raw, cfg.password.as_deref())?;
        let client = redis::Client::open(url.as_str())?;
        let mut connection = client.get_multiplexed_async_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut connection).await?;
        debug!(reply = %pong, "cache ping");
        info!("cache connection ready");

        self.connection = Some(connection);
        Ok(())
    }

    fn handle(&self) -> Option<PluginHandle> {
        self.connection
            .clone()
            .map(|conn| Arc::new(conn) as PluginHandle)
    }

    async fn close(&mut self) -> Result<(), PluginError> {
        if self.connection.take().is_some() {
            debug!("cache connection released");
        }
        Ok(())
    }
}
