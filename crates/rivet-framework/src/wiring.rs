//! Plugin and extension creation.
//!
//! [`PluginWiring`] is the single entry point a loader uses to turn a
//! freshly constructed plugin or extension into a wired one:
//!
//! ```text
//! create_plugin(info, factory)
//!     ├── PluginScopes::create(info)     scope + PluginInfo + PluginConfig
//!     ├── factory()                      construct the plugin
//!     └── hooks, in order                registry-aware, injection, custom
//!
//! create_extension(origin, factory)
//!     ├── PluginScopes::resolve(origin)  owning plugin's scope, or global
//!     ├── factory()
//!     └── hooks, in order
//! ```
//!
//! Discovering plugins is the loader's job; this module only wires what it
//! is given.

use std::sync::Arc;

use rivet_core::{ServiceRegistry, ServiceRegistryExt};
use tracing::{debug, error, info_span};

use crate::error::{WiringError, WiringResult};
use crate::hooks::{CreationContext, CreationHook, default_hooks};
use crate::plugin::{Component, Plugin, PluginInfo};
use crate::scope::{Origin, PluginScopes};

/// Creates plugins and extensions inside their scopes and runs the
/// creation hooks on them.
pub struct PluginWiring {
    scopes: PluginScopes,
    hooks: Vec<Arc<dyn CreationHook>>,
}

impl PluginWiring {
    /// Wiring over `global` with the default hooks.
    pub fn new(global: Arc<dyn ServiceRegistry>) -> Self {
        Self::with_hooks(global, default_hooks())
    }

    /// Wiring over `global` with exactly `hooks`, run in the given order.
    pub fn with_hooks(global: Arc<dyn ServiceRegistry>, hooks: Vec<Arc<dyn CreationHook>>) -> Self {
        Self {
            scopes: PluginScopes::new(global),
            hooks,
        }
    }

    /// Appends `hook` after the existing ones.
    pub fn hook(mut self, hook: Arc<dyn CreationHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Inserts `hook` before the existing ones.
    pub fn hook_first(mut self, hook: Arc<dyn CreationHook>) -> Self {
        self.hooks.insert(0, hook);
        self
    }

    pub fn global(&self) -> &Arc<dyn ServiceRegistry> {
        self.scopes.global()
    }

    pub fn scopes(&self) -> &PluginScopes {
        &self.scopes
    }

    /// Names of the configured hooks, in run order.
    pub fn hook_names(&self) -> Vec<&'static str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    /// Creates the plugin described by `info` in a new scope.
    ///
    /// If any hook fails the scope is discarded again, so the id can be
    /// loaded later.
    pub fn create_plugin<P, F>(&self, info: PluginInfo, factory: F) -> WiringResult<P>
    where
        P: Plugin,
        F: FnOnce() -> P,
    {
        let _span = info_span!("create_plugin", plugin = %info).entered();
        debug!("Creating plugin");
        let scope = self.scopes.create(&info)?;
        let registry: Arc<dyn ServiceRegistry> = scope;
        let origin = Origin::Plugin(info.id().to_string());

        let mut plugin = factory();
        if let Err(e) = self.run_hooks(&origin, &registry, &mut plugin) {
            error!(plugin = %info, error = %e, "Plugin creation failed");
            self.scopes.remove(info.id());
            return Err(e);
        }
        Ok(plugin)
    }

    /// Creates an extension contributed by `origin`.
    ///
    /// Extensions see the scope of the plugin that contributed them, or the
    /// global registry for host extensions.
    pub fn create_extension<C, F>(&self, origin: &Origin, factory: F) -> WiringResult<C>
    where
        C: Component,
        F: FnOnce() -> C,
    {
        let _span = info_span!("create_extension", origin = %origin).entered();
        debug!(extension = std::any::type_name::<C>(), "Creating extension");
        let registry = self.scopes.resolve(origin);
        let mut extension = factory();
        self.run_hooks(origin, &registry, &mut extension)?;
        Ok(extension)
    }

    /// Looks up `T` as a component from `origin` would see it.
    pub fn require<T>(&self, origin: &Origin) -> WiringResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Ok(self.scopes.resolve(origin).require::<T>()?)
    }

    /// Drops the plugin's scope. Returns `false` if it was not loaded.
    pub fn unload(&self, plugin_id: &str) -> bool {
        self.scopes.remove(plugin_id).is_some()
    }

    fn run_hooks<C: Component>(
        &self,
        origin: &Origin,
        registry: &Arc<dyn ServiceRegistry>,
        component: &mut C,
    ) -> WiringResult<()> {
        let ctx = CreationContext {
            origin,
            registry,
            component: std::any::type_name::<C>(),
        };
        for hook in &self.hooks {
            hook.on_create(&ctx, component)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for PluginWiring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginWiring")
            .field("scopes", &self.scopes)
            .field("hooks", &self.hook_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::ServiceRegistryAware;
    use parking_lot::Mutex;
    use rivet_core::{DefaultServiceRegistry, Injectable};

    #[derive(Default, Injectable)]
    struct Bare {
        #[inject(optional)]
        info: Option<Arc<PluginInfo>>,
        registry: Option<Arc<dyn ServiceRegistry>>,
    }

    impl std::fmt::Debug for Bare {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Bare")
                .field("info", &self.info)
                .field("registry", &self.registry.is_some())
                .finish()
        }
    }

    impl ServiceRegistryAware for Bare {
        fn set_service_registry(&mut self, registry: Arc<dyn ServiceRegistry>) {
            self.registry = Some(registry);
        }
    }

    impl Component for Bare {
        fn as_registry_aware(&mut self) -> Option<&mut dyn ServiceRegistryAware> {
            Some(self)
        }
    }

    impl Plugin for Bare {}

    fn wiring() -> PluginWiring {
        PluginWiring::new(Arc::new(DefaultServiceRegistry::new()))
    }

    #[test]
    fn test_default_hook_order() {
        assert_eq!(wiring().hook_names(), ["registry-aware", "injection"]);
    }

    #[test]
    fn test_plugin_sees_its_scope() {
        let wiring = wiring();
        let plugin = wiring
            .create_plugin(PluginInfo::new("p1"), Bare::default)
            .unwrap();

        assert_eq!(plugin.info.unwrap().id(), "p1");
        let registry = plugin.registry.unwrap();
        assert_eq!(registry.require::<PluginInfo>().unwrap().id(), "p1");
        assert!(wiring.global().get::<PluginInfo>().is_none());
    }

    #[test]
    fn test_host_extension_sees_global() {
        let wiring = wiring();
        let ext = wiring
            .create_extension(&Origin::Host, Bare::default)
            .unwrap();
        assert!(ext.info.is_none());
        assert!(Arc::ptr_eq(&ext.registry.unwrap(), wiring.global()));
    }

    #[test]
    fn test_plugin_extension_sees_plugin_scope() {
        let wiring = wiring();
        wiring
            .create_plugin(PluginInfo::new("p1"), Bare::default)
            .unwrap();
        let ext = wiring
            .create_extension(&Origin::plugin("p1"), Bare::default)
            .unwrap();
        assert_eq!(ext.info.unwrap().id(), "p1");
    }

    struct Recording {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl CreationHook for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        fn on_create(
            &self,
            _ctx: &CreationContext<'_>,
            _component: &mut dyn Component,
        ) -> WiringResult<()> {
            self.log.lock().push(self.name);
            Ok(())
        }
    }

    struct Reject;

    impl CreationHook for Reject {
        fn name(&self) -> &'static str {
            "reject"
        }

        fn on_create(
            &self,
            _ctx: &CreationContext<'_>,
            _component: &mut dyn Component,
        ) -> WiringResult<()> {
            Err(WiringError::Hook {
                hook: self.name(),
                source: "not allowed".into(),
            })
        }
    }

    #[test]
    fn test_custom_hooks_run_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let wiring = wiring()
            .hook(Arc::new(Recording { name: "last", log: Arc::clone(&log) }))
            .hook_first(Arc::new(Recording { name: "first", log: Arc::clone(&log) }));

        wiring
            .create_plugin(PluginInfo::new("p1"), Bare::default)
            .unwrap();
        assert_eq!(*log.lock(), ["first", "last"]);
        assert_eq!(
            wiring.hook_names(),
            ["first", "registry-aware", "injection", "last"]
        );
    }

    #[test]
    fn test_failed_creation_releases_scope() {
        let wiring = wiring().hook(Arc::new(Reject));
        let err = wiring
            .create_plugin(PluginInfo::new("p1"), Bare::default)
            .unwrap_err();
        assert!(matches!(err, WiringError::Hook { hook: "reject", .. }));
        assert!(!wiring.scopes().contains("p1"));
    }

    #[test]
    fn test_duplicate_plugin() {
        let wiring = wiring();
        wiring
            .create_plugin(PluginInfo::new("p1"), Bare::default)
            .unwrap();
        let err = wiring
            .create_plugin(PluginInfo::new("p1"), Bare::default)
            .unwrap_err();
        assert!(matches!(err, WiringError::DuplicatePlugin(_)));

        assert!(wiring.unload("p1"));
        assert!(!wiring.unload("p1"));
        assert!(wiring
            .create_plugin(PluginInfo::new("p1"), Bare::default)
            .is_ok());
    }

    #[test]
    fn test_require_by_origin() {
        let wiring = wiring();
        wiring
            .create_plugin(PluginInfo::new("p1"), Bare::default)
            .unwrap();

        assert!(wiring.require::<PluginInfo>(&Origin::plugin("p1")).is_ok());
        assert!(matches!(
            wiring.require::<PluginInfo>(&Origin::Host),
            Err(WiringError::ServiceNotFound(_))
        ));
    }
}
