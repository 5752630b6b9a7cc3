//! Welcome plugin: gets its services through `#[inject]`.

use rivet::prelude::*;
use tracing::info;

use crate::services::{Greeted, Greeter, GreetingService};

pub const ID: &str = "welcome";

#[derive(Default, Injectable)]
#[injectable(crate = "rivet::core")]
pub struct WelcomePlugin {
    #[inject]
    greeting: Option<Arc<dyn GreetingService>>,
    #[inject(optional)]
    events: Option<Arc<EventBus>>,
    listener: Option<Listener<Greeted>>,
}

impl Component for WelcomePlugin {}

impl Plugin for WelcomePlugin {
    fn start(&mut self) -> Result<(), BoxError> {
        info!("Welcome plugin started");
        if let Some(greeting) = &self.greeting {
            info!("Injected service says: {}", greeting.greet("Welcome Plugin"));
        }
        if let Some(events) = &self.events {
            self.listener = Some(events.on(|e: &Greeted| {
                info!(by = %e.by, "Welcome plugin heard: {}", e.message);
                Ok(())
            }));
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        if let (Some(events), Some(listener)) = (&self.events, self.listener.take()) {
            events.unsubscribe(&listener);
        }
        info!("Welcome plugin stopped");
        Ok(())
    }
}

/// Greets through whatever `GreetingService` its plugin scope resolves.
#[derive(Default, Injectable)]
#[injectable(crate = "rivet::core")]
pub struct WelcomeGreeter {
    #[inject]
    greeting: Option<Arc<dyn GreetingService>>,
    #[inject]
    plugin: Option<Arc<PluginInfo>>,
}

impl Component for WelcomeGreeter {}

impl Greeter for WelcomeGreeter {
    fn greet(&self) -> String {
        let name = self.plugin.as_ref().map_or(ID, |p| p.id());
        match &self.greeting {
            Some(greeting) => greeting.greet(name),
            None => format!("Welcome from {name}"),
        }
    }
}
