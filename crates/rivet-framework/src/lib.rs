//! # Rivet Framework
//!
//! Plugin wiring on top of `rivet-core`.
//!
//! This layer provides:
//! - [`PluginScopes`]: one scoped registry per plugin, pre-populated with its
//!   [`PluginInfo`] and a lazily opened `PluginConfig`
//! - [`PluginWiring`]: creates plugins and extensions inside the right scope
//!   and runs the [`CreationHook`] pipeline on them
//! - [`PluginManager`]: holds wired plugins and drives `start` / `stop`
//!
//! Finding plugin code (jar scanning, dynamic libraries, manifests) is left
//! to the loader; this crate starts from a [`PluginInfo`] and a factory.

pub mod error;
pub mod hooks;
pub mod manager;
pub mod plugin;
pub mod scope;
pub mod wiring;

pub use error::{WiringError, WiringResult};
pub use hooks::{CreationContext, CreationHook, InjectionHook, RegistryAwareHook, default_hooks};
pub use manager::{PluginManager, PluginState, PluginStateChanged};
pub use plugin::{Component, Plugin, PluginInfo, ServiceRegistryAware};
pub use scope::{Origin, PluginScopes};
pub use wiring::PluginWiring;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::manager::{PluginManager, PluginState};
    pub use crate::plugin::{Component, Plugin, PluginInfo, ServiceRegistryAware};
    pub use crate::scope::Origin;
    pub use crate::wiring::PluginWiring;
}
