//! Host assembly.
//!
//! [`HostBuilder`] puts together what a plugin-enabled application needs:
//! the global service registry, the default services plugins expect to find
//! in it, the creation hook pipeline and a [`PluginManager`].
//!
//! ```rust,ignore
//! let host = HostBuilder::new(config)
//!     .with_default_services()
//!     .services(|registry| {
//!         registry.register::<dyn GreetingService>(Arc::new(DefaultGreeting));
//!     })
//!     .build()?;
//!
//! host.load(PluginInfo::new("greeting"), GreetingPlugin::default)?;
//! host.start();
//! ```

use std::sync::Arc;

use rivet_core::{
    ConfigPersister, ConfigService, DefaultServiceRegistry, EventBus, Executor,
    PropertiesConfigPersister, ServiceRegistry, ServiceRegistryExt, Synchronous, TokioExecutor,
};
use rivet_framework::{CreationHook, Plugin, PluginInfo, PluginManager, PluginWiring};
use tracing::{debug, info};

use crate::config::{EventDelivery, HostConfig};
use crate::error::{RuntimeError, RuntimeResult};

type Configurer = Box<dyn FnOnce(&dyn ServiceRegistry) + Send>;

/// Builds a [`Host`].
pub struct HostBuilder {
    config: HostConfig,
    registry: Option<Arc<dyn ServiceRegistry>>,
    default_services: bool,
    persister: Option<Arc<dyn ConfigPersister>>,
    configurers: Vec<Configurer>,
    hooks_first: Vec<Arc<dyn CreationHook>>,
    hooks_last: Vec<Arc<dyn CreationHook>>,
}

impl HostBuilder {
    pub fn new(config: HostConfig) -> Self {
        Self {
            config,
            registry: None,
            default_services: false,
            persister: None,
            configurers: Vec::new(),
            hooks_first: Vec::new(),
            hooks_last: Vec::new(),
        }
    }

    /// Uses `registry` as the global registry instead of a fresh one.
    pub fn registry(mut self, registry: Arc<dyn ServiceRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Registers an [`EventBus`] and a [`ConfigService`] before any
    /// [`services`](Self::services) configurer runs.
    ///
    /// The bus delivers according to `events.delivery`; the config service
    /// persists to `plugins.config_dir` unless [`persister`](Self::persister)
    /// is set.
    pub fn with_default_services(mut self) -> Self {
        self.default_services = true;
        self
    }

    /// Persister for the default [`ConfigService`].
    pub fn persister(mut self, persister: Arc<dyn ConfigPersister>) -> Self {
        self.persister = Some(persister);
        self
    }

    /// Adds a step that registers host services. Steps run in order.
    pub fn services<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(&dyn ServiceRegistry) + Send + 'static,
    {
        self.configurers.push(Box::new(configure));
        self
    }

    /// Runs `hook` before the built-in creation hooks.
    pub fn hook_first(mut self, hook: Arc<dyn CreationHook>) -> Self {
        self.hooks_first.push(hook);
        self
    }

    /// Runs `hook` after the built-in creation hooks.
    pub fn hook(mut self, hook: Arc<dyn CreationHook>) -> Self {
        self.hooks_last.push(hook);
        self
    }

    pub fn build(self) -> RuntimeResult<Host> {
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(DefaultServiceRegistry::new()));

        if self.default_services {
            let executor: Arc<dyn Executor> = match self.config.events.delivery {
                EventDelivery::Sync => Arc::new(Synchronous),
                EventDelivery::Tokio => {
                    Arc::new(TokioExecutor::current().ok_or(RuntimeError::NoTokioRuntime)?)
                }
            };
            registry.register(Arc::new(EventBus::with_executor(executor)));

            let persister = self.persister.unwrap_or_else(|| {
                Arc::new(PropertiesConfigPersister::new(&self.config.plugins.config_dir))
            });
            registry.register(Arc::new(ConfigService::new(persister)));
            debug!(
                delivery = ?self.config.events.delivery,
                config_dir = %self.config.plugins.config_dir.display(),
                "Registered default services"
            );
        }

        for configure in self.configurers {
            configure(registry.as_ref());
        }

        let mut wiring = PluginWiring::new(Arc::clone(&registry));
        for hook in self.hooks_first.into_iter().rev() {
            wiring = wiring.hook_first(hook);
        }
        for hook in self.hooks_last {
            wiring = wiring.hook(hook);
        }
        info!(hooks = ?wiring.hook_names(), "Host ready");

        Ok(Host {
            config: self.config,
            manager: PluginManager::new(wiring),
        })
    }
}

impl std::fmt::Debug for HostBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBuilder")
            .field("config", &self.config)
            .field("default_services", &self.default_services)
            .field("configurers", &self.configurers.len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Host
// =============================================================================

/// A configured host: global registry plus plugin manager.
#[derive(Debug)]
pub struct Host {
    config: HostConfig,
    manager: PluginManager,
}

impl Host {
    pub fn builder(config: HostConfig) -> HostBuilder {
        HostBuilder::new(config)
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<dyn ServiceRegistry> {
        self.manager.wiring().global()
    }

    pub fn plugins(&self) -> &PluginManager {
        &self.manager
    }

    pub fn event_bus(&self) -> Option<Arc<EventBus>> {
        self.registry().get::<EventBus>()
    }

    pub fn config_service(&self) -> Option<Arc<ConfigService>> {
        self.registry().get::<ConfigService>()
    }

    pub fn load<P, F>(&self, info: PluginInfo, factory: F) -> RuntimeResult<()>
    where
        P: Plugin,
        F: FnOnce() -> P,
    {
        Ok(self.manager.load(info, factory)?)
    }

    /// Starts every loaded plugin. Returns how many started.
    pub fn start(&self) -> usize {
        self.manager.start_all()
    }

    /// Unloads every plugin and flushes plugin configuration.
    pub fn shutdown(&self) {
        self.manager.unload_all();
        if let Some(configs) = self.config_service() {
            configs.save_all();
        }
        info!("Host shut down");
    }
}
