//! Plugin lifecycle registry for backing services.
//!
//! # Architecture
//!
//! - [`Plugin`] - Capability contract: initialize, expose a handle, close
//! - [`PluginRegistry`] - Initializes plugins in registration order and closes them in reverse
//! - [`RequestContext`] - Per-request snapshot of the configuration and plugin handles
//! - [`adapters`] - Relational store, cache pool and query catalog plugins

pub mod adapters;
mod context;
mod error;
mod plugin;
mod registry;

pub use context::RequestContext;
pub use error::{BoxError, PluginError};
pub use plugin::{Plugin, PluginContext, PluginHandle};
pub use registry::{PluginRegistry, ShutdownReport};

// Re-export async_trait for convenience when implementing Plugin
pub use async_trait::async_trait;
