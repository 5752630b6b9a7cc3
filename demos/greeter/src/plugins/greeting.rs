//! Greeting plugin: reads everything through its registry by hand.

use rivet::prelude::*;
use tracing::info;

use crate::services::{Greeted, Greeter, GreetingService};

pub const ID: &str = "greeting";

#[derive(Default, Injectable)]
#[injectable(crate = "rivet::core")]
pub struct GreetingPlugin {
    registry: Option<Arc<dyn ServiceRegistry>>,
}

impl ServiceRegistryAware for GreetingPlugin {
    fn set_service_registry(&mut self, registry: Arc<dyn ServiceRegistry>) {
        self.registry = Some(registry);
    }
}

impl Component for GreetingPlugin {
    fn as_registry_aware(&mut self) -> Option<&mut dyn ServiceRegistryAware> {
        Some(self)
    }
}

impl Plugin for GreetingPlugin {
    fn start(&mut self) -> Result<(), BoxError> {
        let registry = self.registry.as_ref().ok_or("service registry not set")?;

        let plugin = registry.require::<PluginInfo>()?;
        info!(id = plugin.id(), version = ?plugin.version(), "Greeting plugin started");

        let greeting = registry.require::<dyn GreetingService>()?;
        info!("Registry says: {}", greeting.greet("Greeting Plugin"));

        let config = registry.require::<PluginConfig>()?;
        let start_count = config.get_i32("start.count", 0)? + 1;
        config.set_i32("start.count", start_count);
        let prefix = config.get_or("greeting.prefix", "Hello");
        info!(start_count, prefix = %prefix, keys = ?config.keys(), "Plugin configuration");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        info!("Greeting plugin stopped");
        Ok(())
    }
}

/// Greets with the prefix from the plugin's configuration.
#[derive(Default, Injectable)]
#[injectable(crate = "rivet::core")]
pub struct PrefixGreeter {
    #[inject]
    config: Option<Arc<PluginConfig>>,
    #[inject(optional)]
    events: Option<Arc<EventBus>>,
}

impl Component for PrefixGreeter {}

impl Greeter for PrefixGreeter {
    fn greet(&self) -> String {
        let prefix = self
            .config
            .as_ref()
            .map_or_else(|| "Hello".to_string(), |c| c.get_or("greeting.prefix", "Hello"));
        let message = format!("{prefix} from the greeting plugin");
        if let Some(events) = &self.events {
            events.publish(Greeted {
                by: ID.to_string(),
                message: message.clone(),
            });
        }
        message
    }
}
