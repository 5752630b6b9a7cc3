use std::sync::Arc;

use super::{DefaultServiceRegistry, ServiceArc, ServiceEntry, ServiceKey, ServiceRegistry};

/// A child registry layered over a parent.
///
/// Lookups check the local registry first, with full local semantics
/// (providers run and cache locally), and fall back to the parent. Writes
/// only ever touch the local layer, so a scope can shadow a global service
/// for one plugin without other plugins or the host noticing.
///
/// ```rust,ignore
/// let scope = ScopedServiceRegistry::new(Arc::clone(&global));
/// scope.register::<dyn GreetingService>(Arc::new(PirateGreeting));
///
/// scope.get::<dyn GreetingService>();  // pirate
/// global.get::<dyn GreetingService>(); // unchanged
/// ```
pub struct ScopedServiceRegistry {
    local: DefaultServiceRegistry,
    parent: Arc<dyn ServiceRegistry>,
}

impl ScopedServiceRegistry {
    pub fn new(parent: Arc<dyn ServiceRegistry>) -> Self {
        Self {
            local: DefaultServiceRegistry::new(),
            parent,
        }
    }

    /// The registry this scope falls back to.
    pub fn parent(&self) -> &Arc<dyn ServiceRegistry> {
        &self.parent
    }

    /// The scope's own entries, without the parent fallback.
    pub fn local(&self) -> &DefaultServiceRegistry {
        &self.local
    }

    /// Returns `true` if `key` is shadowed by a local entry.
    pub fn is_local(&self, key: ServiceKey) -> bool {
        self.local.contains(key)
    }
}

impl ServiceRegistry for ScopedServiceRegistry {
    fn register_entry(&self, entry: ServiceEntry) {
        self.local.register_entry(entry);
    }

    fn lookup(&self, key: ServiceKey) -> Option<ServiceArc> {
        self.local
            .lookup(key)
            .or_else(|| self.parent.lookup(key))
    }
}

impl std::fmt::Debug for ScopedServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedServiceRegistry")
            .field("local", &self.local)
            .finish_non_exhaustive()
    }
}
