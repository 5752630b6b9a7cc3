//! Per-plugin registry scopes.
//!
//! Every loaded plugin gets a [`ScopedServiceRegistry`] layered over the
//! host's global registry. The scope is pre-populated with:
//!
//! - the plugin's [`PluginInfo`], as an instance;
//! - its [`PluginConfig`], as a provider that asks the global
//!   [`ConfigService`] on first lookup.
//!
//! Extensions are created against the scope of the plugin that owns them
//! ([`Origin::Plugin`]) or against the global registry ([`Origin::Host`]).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rivet_core::{
    ConfigService, PluginConfig, ScopedServiceRegistry, ServiceRegistry, ServiceRegistryExt,
};
use tracing::{debug, trace, warn};

use crate::error::{WiringError, WiringResult};
use crate::plugin::PluginInfo;

/// Where a component comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Provided by the host application itself.
    Host,
    /// Contributed by the plugin with this id.
    Plugin(String),
}

impl Origin {
    pub fn plugin(id: impl Into<String>) -> Self {
        Self::Plugin(id.into())
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => f.write_str("host"),
            Self::Plugin(id) => write!(f, "plugin '{id}'"),
        }
    }
}

/// Maps plugin ids to their scoped registries.
pub struct PluginScopes {
    global: Arc<dyn ServiceRegistry>,
    scopes: RwLock<HashMap<String, Arc<ScopedServiceRegistry>>>,
}

impl PluginScopes {
    pub fn new(global: Arc<dyn ServiceRegistry>) -> Self {
        Self {
            global,
            scopes: RwLock::new(HashMap::new()),
        }
    }

    /// The host registry every scope falls back to.
    pub fn global(&self) -> &Arc<dyn ServiceRegistry> {
        &self.global
    }

    /// Creates and records the scope for `info`.
    ///
    /// Fails with [`WiringError::DuplicatePlugin`] while a scope for the same
    /// id exists.
    pub fn create(&self, info: &PluginInfo) -> WiringResult<Arc<ScopedServiceRegistry>> {
        let mut scopes = self.scopes.write();
        if scopes.contains_key(info.id()) {
            return Err(WiringError::DuplicatePlugin(info.id().to_string()));
        }

        let scope = Arc::new(ScopedServiceRegistry::new(Arc::clone(&self.global)));
        scope.register(Arc::new(info.clone()));
        scope.register_provider::<PluginConfig, _>(config_provider(
            Arc::clone(&self.global),
            info.id().to_string(),
        ));

        scopes.insert(info.id().to_string(), Arc::clone(&scope));
        debug!(plugin = %info, "Created plugin scope");
        Ok(scope)
    }

    pub fn get(&self, plugin_id: &str) -> Option<Arc<ScopedServiceRegistry>> {
        self.scopes.read().get(plugin_id).cloned()
    }

    /// Drops the scope for `plugin_id`, returning it if it existed.
    pub fn remove(&self, plugin_id: &str) -> Option<Arc<ScopedServiceRegistry>> {
        let removed = self.scopes.write().remove(plugin_id);
        if removed.is_some() {
            debug!(plugin = plugin_id, "Removed plugin scope");
        }
        removed
    }

    pub fn contains(&self, plugin_id: &str) -> bool {
        self.scopes.read().contains_key(plugin_id)
    }

    /// Ids with a live scope, sorted.
    pub fn plugin_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.scopes.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// The registry a component from `origin` should see.
    ///
    /// A plugin origin without a scope (never loaded, or already unloaded)
    /// falls back to the global registry.
    pub fn resolve(&self, origin: &Origin) -> Arc<dyn ServiceRegistry> {
        match origin {
            Origin::Host => Arc::clone(&self.global),
            Origin::Plugin(id) => match self.get(id) {
                Some(scope) => {
                    trace!(plugin = %id, "Resolved plugin scope");
                    scope as Arc<dyn ServiceRegistry>
                }
                None => {
                    trace!(plugin = %id, "No scope for plugin, using global registry");
                    Arc::clone(&self.global)
                }
            },
        }
    }
}

fn config_provider(
    global: Arc<dyn ServiceRegistry>,
    plugin_id: String,
) -> impl Fn() -> Option<Arc<PluginConfig>> + Send + Sync + 'static {
    move || {
        let configs = match global.require::<ConfigService>() {
            Ok(configs) => configs,
            Err(e) => {
                warn!(plugin = %plugin_id, error = %e, "PluginConfig requested but no ConfigService is registered");
                return None;
            }
        };
        match configs.for_plugin(&plugin_id) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(plugin = %plugin_id, error = %e, "Could not open plugin configuration");
                None
            }
        }
    }
}

impl fmt::Debug for PluginScopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginScopes")
            .field("plugins", &self.plugin_ids())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rivet_core::{DefaultServiceRegistry, MemoryConfigPersister};

    fn global_with_configs() -> Arc<dyn ServiceRegistry> {
        let global: Arc<dyn ServiceRegistry> = Arc::new(DefaultServiceRegistry::new());
        global.register(Arc::new(ConfigService::new(Arc::new(
            MemoryConfigPersister::new().with_plugin("p1", [("greeting", "hi")]),
        ))));
        global
    }

    #[test]
    fn test_scope_holds_plugin_info() {
        let scopes = PluginScopes::new(global_with_configs());
        let scope = scopes.create(&PluginInfo::new("p1").with_version("1.0")).unwrap();

        let info = scope.require::<PluginInfo>().unwrap();
        assert_eq!(info.id(), "p1");
        assert_eq!(info.version(), Some("1.0"));
        assert!(scopes.global().get::<PluginInfo>().is_none());
    }

    #[test]
    fn test_scope_provides_plugin_config_lazily() {
        let global = global_with_configs();
        let scopes = PluginScopes::new(Arc::clone(&global));
        let scope = scopes.create(&PluginInfo::new("p1")).unwrap();

        let configs = global.require::<ConfigService>().unwrap();
        assert!(configs.loaded_plugins().is_empty());

        let config = scope.require::<PluginConfig>().unwrap();
        assert_eq!(config.plugin_id(), "p1");
        assert_eq!(config.get("greeting").as_deref(), Some("hi"));
        assert_eq!(configs.loaded_plugins(), ["p1"]);
        assert!(Arc::ptr_eq(&config, &configs.for_plugin("p1").unwrap()));
    }

    #[test]
    fn test_plugin_config_without_config_service() {
        let scopes = PluginScopes::new(Arc::new(DefaultServiceRegistry::new()));
        let scope = scopes.create(&PluginInfo::new("p1")).unwrap();
        assert!(scope.get::<PluginConfig>().is_none());
    }

    #[test]
    fn test_duplicate_scope_rejected_until_removed() {
        let scopes = PluginScopes::new(global_with_configs());
        scopes.create(&PluginInfo::new("p1")).unwrap();
        assert!(matches!(
            scopes.create(&PluginInfo::new("p1")),
            Err(WiringError::DuplicatePlugin(id)) if id == "p1"
        ));

        assert!(scopes.remove("p1").is_some());
        assert!(scopes.remove("p1").is_none());
        assert!(scopes.create(&PluginInfo::new("p1")).is_ok());
    }

    #[test]
    fn test_resolve_origin() {
        let global = global_with_configs();
        let scopes = PluginScopes::new(Arc::clone(&global));
        scopes.create(&PluginInfo::new("p1")).unwrap();

        let from_plugin = scopes.resolve(&Origin::plugin("p1"));
        assert_eq!(from_plugin.require::<PluginInfo>().unwrap().id(), "p1");

        let from_host = scopes.resolve(&Origin::Host);
        assert!(Arc::ptr_eq(&from_host, &global));

        let unknown = scopes.resolve(&Origin::plugin("ghost"));
        assert!(Arc::ptr_eq(&unknown, &global));
    }

    #[test]
    fn test_plugin_ids_sorted() {
        let scopes = PluginScopes::new(global_with_configs());
        scopes.create(&PluginInfo::new("b")).unwrap();
        scopes.create(&PluginInfo::new("a")).unwrap();
        assert_eq!(scopes.plugin_ids(), ["a", "b"]);
        assert!(scopes.contains("a"));
    }
}
