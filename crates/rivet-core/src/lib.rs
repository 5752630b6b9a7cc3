//! # Rivet Core
//!
//! The in-process wiring layer between a host application and its plugins.
//!
//! This crate provides:
//! - A type-keyed [`ServiceRegistry`] with lazy, memoized providers
//! - [`ScopedServiceRegistry`] for per-plugin views that shadow the host's
//!   global registry without mutating it
//! - An [`Injector`] that fills `#[inject]`-marked fields from a registry
//! - A type-keyed [`EventBus`] with synchronous or executor-based delivery
//! - A per-plugin string key/value [`ConfigService`] with auto-save
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rivet_core::prelude::*;
//!
//! let global: Arc<dyn ServiceRegistry> = Arc::new(DefaultServiceRegistry::new());
//! global.register::<dyn GreetingService>(Arc::new(EnglishGreeting));
//!
//! let scope = ScopedServiceRegistry::new(Arc::clone(&global));
//! scope.register(Arc::new(PluginMarker));
//!
//! let greeting = scope.require::<dyn GreetingService>()?;
//! ```

// Lets `#[derive(Injectable)]` resolve `::rivet_core` inside this crate's own tests.
extern crate self as rivet_core;

pub mod config;
pub mod error;
pub mod event;
pub mod inject;
pub mod service;

pub use config::{
    ConfigChangeEvent, ConfigChangeListener, ConfigPersister, ConfigService,
    MemoryConfigPersister, PluginConfig, PropertiesConfigPersister,
};
pub use error::{BoxError, ConfigError, ConfigResult, InjectionError, ServiceNotFound};
pub use event::{EventBus, Executor, Listener, Synchronous, TokioExecutor};
pub use inject::{Injectable, InjectionPoint, Injector};
pub use service::{
    DefaultServiceRegistry, ScopedServiceRegistry, ServiceArc, ServiceEntry, ServiceKey,
    ServiceProvider, ServiceRegistry, ServiceRegistryExt,
};

pub use rivet_macros::Injectable;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{ConfigService, PluginConfig};
    pub use crate::event::{EventBus, Listener};
    pub use crate::inject::{Injectable, Injector};
    pub use crate::service::{
        DefaultServiceRegistry, ScopedServiceRegistry, ServiceRegistry, ServiceRegistryExt,
    };
    pub use rivet_macros::Injectable;
}
