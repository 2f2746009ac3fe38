//! Plugins for the backing services an application can be configured with.

#[cfg(feature = "redis")]
mod cache;
mod queries;
#[cfg(any(feature = "sqlite", feature = "postgres", feature = "mysql"))]
mod sql;

#[cfg(feature = "redis")]
pub use cache::{connection_url, CachePlugin};
pub use queries::QueryCatalogPlugin;
#[cfg(any(feature = "sqlite", feature = "postgres", feature = "mysql"))]
pub use sql::{DbPool, SqlPlugin, BACKEND};

/// Registration name of the relational store.
pub const SQL: &str = "sql";
/// Registration name of the cache pool.
pub const CACHE: &str = "cache";
/// Registration name of the named query catalog.
pub const QUERIES: &str = "queries";
