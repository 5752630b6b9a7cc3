use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::{ServiceArc, ServiceKey, ServiceProvider};
use crate::error::ServiceNotFound;

/// Erased provider: produces the `Arc<T>` already wrapped as a [`ServiceArc`].
type ErasedProvider = Arc<dyn Fn() -> Option<ServiceArc> + Send + Sync>;

// =============================================================================
// ServiceEntry
// =============================================================================

/// A single registration: either a ready instance or a lazy provider.
///
/// Entries can only be built through the typed constructors, so the key
/// always matches the stored value's contract type.
pub struct ServiceEntry {
    key: ServiceKey,
    kind: EntryKind,
}

enum EntryKind {
    Instance(ServiceArc),
    Provider(ErasedProvider),
}

impl ServiceEntry {
    /// An entry holding a ready instance of contract `T`.
    pub fn instance<T>(service: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Self {
            key: ServiceKey::of::<T>(),
            kind: EntryKind::Instance(Arc::new(service)),
        }
    }

    /// An entry that builds contract `T` on first lookup.
    pub fn provider<T, P>(provider: P) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        P: ServiceProvider<T> + 'static,
    {
        let erased: ErasedProvider =
            Arc::new(move || provider.provide().map(|s| Arc::new(s) as ServiceArc));
        Self {
            key: ServiceKey::of::<T>(),
            kind: EntryKind::Provider(erased),
        }
    }

    /// The contract this entry is registered under.
    pub fn key(&self) -> ServiceKey {
        self.key
    }

    /// Returns `true` if this entry is a lazy provider.
    pub fn is_provider(&self) -> bool {
        matches!(self.kind, EntryKind::Provider(_))
    }
}

impl std::fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceEntry")
            .field("key", &self.key)
            .field("provider", &self.is_provider())
            .finish()
    }
}

// =============================================================================
// ServiceRegistry + typed extension
// =============================================================================

/// Object-safe service store.
///
/// Implementors deal in erased values only; use [`ServiceRegistryExt`] for
/// the typed `register` / `get` / `require` API.
pub trait ServiceRegistry: Send + Sync {
    /// Stores `entry`, replacing any instance or provider under its key.
    fn register_entry(&self, entry: ServiceEntry);

    /// Resolves `key` to an erased `Arc<T>`, running a provider if needed.
    fn lookup(&self, key: ServiceKey) -> Option<ServiceArc>;
}

/// Typed API over any [`ServiceRegistry`], including `dyn ServiceRegistry`.
pub trait ServiceRegistryExt: ServiceRegistry {
    /// Registers a ready instance of contract `T`.
    fn register<T>(&self, service: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register_entry(ServiceEntry::instance(service));
    }

    /// Registers a lazy provider for contract `T`.
    fn register_provider<T, P>(&self, provider: P)
    where
        T: ?Sized + Send + Sync + 'static,
        P: ServiceProvider<T> + 'static,
    {
        self.register_entry(ServiceEntry::provider::<T, P>(provider));
    }

    /// Returns the service for `T`, or `None` if it is unavailable.
    fn get<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.lookup(ServiceKey::of::<T>())
            .and_then(|arc| arc.downcast_ref::<Arc<T>>().map(Arc::clone))
    }

    /// Like [`get`](Self::get), but fails with [`ServiceNotFound`].
    fn require<T>(&self) -> Result<Arc<T>, ServiceNotFound>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get::<T>().ok_or_else(ServiceNotFound::of::<T>)
    }
}

impl<R: ServiceRegistry + ?Sized> ServiceRegistryExt for R {}

// =============================================================================
// DefaultServiceRegistry
// =============================================================================

enum Slot {
    Resolved(ServiceArc),
    Lazy(ErasedProvider),
}

/// The standard thread-safe registry.
///
/// Lookups take a read lock. Providers run with no lock held, so a provider
/// may itself resolve other services from this registry. Racing first
/// lookups may each run the provider; the first produced value is cached
/// and returned to every racer that finishes afterwards.
#[derive(Default)]
pub struct DefaultServiceRegistry {
    slots: RwLock<HashMap<ServiceKey, Slot>>,
}

impl DefaultServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if an instance or provider is registered for `key`.
    pub fn contains(&self, key: ServiceKey) -> bool {
        self.slots.read().contains_key(&key)
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    /// Keys currently registered, in no particular order.
    pub fn keys(&self) -> Vec<ServiceKey> {
        self.slots.read().keys().copied().collect()
    }

    fn resolve_lazy(&self, key: ServiceKey, provider: ErasedProvider) -> Option<ServiceArc> {
        let Some(value) = provider() else {
            trace!(service = %key, "Provider produced no value");
            return None;
        };

        let mut slots = self.slots.write();
        let still_current = match slots.get(&key) {
            Some(Slot::Lazy(current)) => Arc::ptr_eq(current, &provider),
            // Another lookup got there first, or a newer instance replaced us.
            Some(Slot::Resolved(winner)) => return Some(Arc::clone(winner)),
            None => false,
        };
        if still_current {
            debug!(service = %key, "Cached provided service");
            slots.insert(key, Slot::Resolved(Arc::clone(&value)));
        }
        // A superseded or removed provider's value is handed out uncached.
        Some(value)
    }
}

impl ServiceRegistry for DefaultServiceRegistry {
    fn register_entry(&self, entry: ServiceEntry) {
        let slot = match entry.kind {
            EntryKind::Instance(value) => Slot::Resolved(value),
            EntryKind::Provider(provider) => Slot::Lazy(provider),
        };
        debug!(service = %entry.key, lazy = matches!(slot, Slot::Lazy(_)), "Registered service");
        self.slots.write().insert(entry.key, slot);
    }

    fn lookup(&self, key: ServiceKey) -> Option<ServiceArc> {
        let provider = {
            let slots = self.slots.read();
            match slots.get(&key)? {
                Slot::Resolved(value) => return Some(Arc::clone(value)),
                Slot::Lazy(provider) => Arc::clone(provider),
            }
        };
        self.resolve_lazy(key, provider)
    }
}

impl std::fmt::Debug for DefaultServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultServiceRegistry")
            .field("services", &self.keys())
            .finish()
    }
}
