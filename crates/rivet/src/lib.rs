//! # Rivet
//!
//! The wiring layer between a host application and its plugins.
//!
//! ## Overview
//!
//! ```text
//! ┌──────────────────────────┐
//! │ Global ServiceRegistry   │◀── host registers EventBus, ConfigService, ...
//! └────────────┬─────────────┘
//!              │ parent
//!   ┌──────────┴───────────┐
//!   ▼                      ▼
//! ┌─────────────────┐  ┌─────────────────┐
//! │ scope "greeting"│  │ scope "welcome" │  PluginInfo, PluginConfig, overrides
//! └────────┬────────┘  └────────┬────────┘
//!          ▼                    ▼
//!   plugin + extensions   plugin + extensions   #[inject] fields filled
//! ```
//!
//! - **Service registry**: type-keyed instances and lazy providers
//! - **Scopes**: per-plugin registries that shadow the global one without
//!   changing it
//! - **Injector**: fills `#[inject]` fields on plugins and extensions
//! - **Event bus**: type-keyed publish/subscribe between host and plugins
//! - **Config service**: per-plugin string settings, saved automatically
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rivet::prelude::*;
//!
//! #[derive(Default, Injectable)]
//! #[injectable(crate = "rivet::core")]
//! struct WelcomePlugin {
//!     #[inject]
//!     greeting: Option<Arc<dyn GreetingService>>,
//! }
//!
//! impl Component for WelcomePlugin {}
//! impl Plugin for WelcomePlugin {}
//!
//! let host = Host::builder(ConfigLoader::new().load()?)
//!     .with_default_services()
//!     .services(|r| r.register::<dyn GreetingService>(Arc::new(English)))
//!     .build()?;
//! host.load(PluginInfo::new("welcome"), WelcomePlugin::default)?;
//! host.start();
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: read `rivet.toml`
//! - `json-log`: JSON log output

pub use rivet_core as core;
pub use rivet_framework as framework;
pub use rivet_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use rivet::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Services
    pub use rivet_core::{
        DefaultServiceRegistry, ScopedServiceRegistry, ServiceProvider, ServiceRegistry,
        ServiceRegistryExt,
    };

    // Injection
    pub use rivet_core::{Injectable, Injector};

    // Events and configuration
    pub use rivet_core::{BoxError, ConfigService, EventBus, Listener, PluginConfig};

    // Plugins
    pub use rivet_framework::{
        Component, Origin, Plugin, PluginInfo, PluginManager, PluginState, PluginStateChanged,
        ServiceRegistryAware,
    };

    // Host
    pub use rivet_runtime::{ConfigLoader, Host, HostBuilder, HostConfig, logging};
}
