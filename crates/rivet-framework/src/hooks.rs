//! Creation hooks.
//!
//! Every component the wiring layer creates passes through an ordered list of
//! [`CreationHook`]s before it is handed back. The default pipeline is
//!
//! 1. [`RegistryAwareHook`]: gives [`ServiceRegistryAware`] components
//!    their registry;
//! 2. [`InjectionHook`]: fills `#[inject]` fields from the same registry.
//!
//! Hosts can add their own hooks around these (validation, metrics,
//! event subscription) through [`PluginWiring`](crate::PluginWiring).
//!
//! [`ServiceRegistryAware`]: crate::plugin::ServiceRegistryAware

use std::sync::Arc;

use rivet_core::{Injector, ServiceRegistry};
use tracing::debug;

use crate::error::WiringResult;
use crate::plugin::Component;
use crate::scope::Origin;

/// What a hook knows about the component being created.
pub struct CreationContext<'a> {
    /// Who contributed the component.
    pub origin: &'a Origin,
    /// The registry the component belongs to.
    pub registry: &'a Arc<dyn ServiceRegistry>,
    /// Type name of the concrete component.
    pub component: &'static str,
}

impl std::fmt::Debug for CreationContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreationContext")
            .field("origin", self.origin)
            .field("component", &self.component)
            .finish_non_exhaustive()
    }
}

/// One step in the creation pipeline.
pub trait CreationHook: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Prepares `component`. An error aborts creation.
    fn on_create(&self, ctx: &CreationContext<'_>, component: &mut dyn Component)
    -> WiringResult<()>;
}

/// Hands the component its registry if it asks for one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryAwareHook;

impl CreationHook for RegistryAwareHook {
    fn name(&self) -> &'static str {
        "registry-aware"
    }

    fn on_create(
        &self,
        ctx: &CreationContext<'_>,
        component: &mut dyn Component,
    ) -> WiringResult<()> {
        if let Some(aware) = component.as_registry_aware() {
            debug!(component = ctx.component, origin = %ctx.origin, "Setting service registry");
            aware.set_service_registry(Arc::clone(ctx.registry));
        }
        Ok(())
    }
}

/// Fills `#[inject]` fields from the component's registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct InjectionHook;

impl CreationHook for InjectionHook {
    fn name(&self) -> &'static str {
        "injection"
    }

    fn on_create(
        &self,
        ctx: &CreationContext<'_>,
        component: &mut dyn Component,
    ) -> WiringResult<()> {
        debug!(component = ctx.component, origin = %ctx.origin, "Injecting dependencies");
        Injector::new(Arc::clone(ctx.registry)).inject(component)?;
        Ok(())
    }
}

/// The hooks every [`PluginWiring`](crate::PluginWiring) starts with.
pub fn default_hooks() -> Vec<Arc<dyn CreationHook>> {
    vec![Arc::new(RegistryAwareHook), Arc::new(InjectionHook)]
}
