//! Type-keyed service registries.
//!
//! # Architecture
//!
//! A registry maps a [`ServiceKey`] (one per service contract type) to exactly
//! one [`ServiceEntry`]: either a ready instance or a lazy
//! [`ServiceProvider`].  Registering either kind replaces whatever the key held
//! before, so the latest registration always wins.
//!
//! - [`DefaultServiceRegistry`]: the host's global store.
//! - [`ScopedServiceRegistry`]: a per-plugin view where local entries shadow the
//!   parent, registrations never reach the parent.
//!
//! [`ServiceRegistry`] is object-safe and type-erased; the typed API lives in
//! [`ServiceRegistryExt`], which is implemented for every registry including
//! `dyn ServiceRegistry`.
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = DefaultServiceRegistry::new();
//! registry.register::<dyn GreetingService>(Arc::new(EnglishGreeting));
//! registry.register_provider(|| Some(Arc::new(ExpensiveIndex::build())));
//!
//! let greeting = registry.require::<dyn GreetingService>()?;
//! let index: Option<Arc<ExpensiveIndex>> = registry.get(); // built now, cached
//! ```

mod key;
mod provider;
mod registry;
mod scoped;

pub use key::ServiceKey;
pub use provider::ServiceProvider;
pub use registry::{DefaultServiceRegistry, ServiceEntry, ServiceRegistry, ServiceRegistryExt};
pub use scoped::ScopedServiceRegistry;

use std::any::Any;
use std::sync::Arc;

/// Type-erased service value stored in a registry.
///
/// The inner `dyn Any` is always an `Arc<T>` for the entry's contract type
/// `T`, so unsized contracts (`dyn Trait`) round-trip through the registry.
/// Consumers downcast it back to `Arc<T>`.
pub type ServiceArc = Arc<dyn Any + Send + Sync>;
