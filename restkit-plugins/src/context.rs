use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use restkit_config::Config;

use crate::plugin::PluginHandle;

/// Per-request view of the configuration and every registered plugin's handle.
///
/// Built by [`PluginRegistry::request_context`](crate::PluginRegistry::request_context);
/// cloning only bumps reference counts.
#[derive(Clone)]
pub struct RequestContext {
    config: Arc<Config>,
    handles: Arc<HashMap<String, PluginHandle>>,
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.handles.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("RequestContext")
            .field("app", &self.config.app.name)
            .field("plugins", &names)
            .finish()
    }
}

impl RequestContext {
    pub fn new(config: Arc<Config>, handles: HashMap<String, PluginHandle>) -> Self {
        Self {
            config,
            handles: Arc::new(handles),
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn handle(&self, name: &str) -> Option<&PluginHandle> {
        self.handles.get(name)
    }

    /// Typed handle of the plugin registered as `name`.
    ///
    /// `None` when the plugin is not registered or its handle is not a `T`.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.handles
            .get(name)
            .cloned()
            .and_then(|h| h.downcast::<T>().ok())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handles.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_lookup_checks_name_and_type() {
        let mut handles: HashMap<String, PluginHandle> = HashMap::new();
        handles.insert("greeting".into(), Arc::new(String::from("hi")));
        let ctx = RequestContext::new(Arc::new(Config::default()), handles);

        assert_eq!(ctx.get::<String>("greeting").as_deref().map(String::as_str), Some("hi"));
        assert!(ctx.get::<u32>("greeting").is_none());
        assert!(ctx.get::<String>("absent").is_none());
        assert!(ctx.contains("greeting"));
        assert_eq!(ctx.config().app.name, "restkit");
    }
}
