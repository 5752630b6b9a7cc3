use std::sync::Arc;

use rivet_core::{BoxError, Injectable, ServiceRegistry};

/// Receives the registry it was created in.
///
/// For a plugin this is the plugin's own scope; for an extension it is the
/// scope of the plugin that owns it, or the host registry.
pub trait ServiceRegistryAware {
    fn set_service_registry(&mut self, registry: Arc<dyn ServiceRegistry>);
}

/// Anything the wiring layer creates: plugins and extensions.
///
/// Injection comes from the [`Injectable`] supertrait (usually derived).
/// Types that also want the registry itself override
/// [`as_registry_aware`](Self::as_registry_aware):
///
/// ```rust,ignore
/// impl Component for GreetingPlugin {
///     fn as_registry_aware(&mut self) -> Option<&mut dyn ServiceRegistryAware> {
///         Some(self)
///     }
/// }
/// ```
pub trait Component: Injectable + Send + Sync + 'static {
    fn as_registry_aware(&mut self) -> Option<&mut dyn ServiceRegistryAware> {
        None
    }
}

/// A plugin: a [`Component`] with start/stop hooks.
///
/// Hooks run on the thread that calls
/// [`PluginManager::start_all`](crate::PluginManager::start_all) /
/// [`stop_all`](crate::PluginManager::stop_all).
pub trait Plugin: Component {
    fn start(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}
