//! Rivet Runtime - host-side setup for Rivet applications.
//!
//! This crate provides:
//! - Host configuration loading (`rivet.toml`, `RIVET_*` environment
//!   variables) via [`ConfigLoader`]
//! - Logging setup driven by that configuration ([`logging`])
//! - [`HostBuilder`], which registers the default services, runs the host's
//!   own service registrations and hands back a [`Host`] with a ready
//!   [`PluginManager`](rivet_framework::PluginManager)
//!
//! ```ignore
//! use rivet_runtime::{ConfigLoader, Host, logging};
//!
//! let config = ConfigLoader::new().load()?;
//! logging::init_from_config(&config.logging);
//!
//! let host = Host::builder(config).with_default_services().build()?;
//! host.load(PluginInfo::new("greeting"), GreetingPlugin::default)?;
//! host.start();
//! // ...
//! host.shutdown();
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod logging;

pub use config::{ConfigLoader, HostConfig, HostConfigError, HostConfigResult, load_config};
pub use error::{RuntimeError, RuntimeResult};
pub use host::{Host, HostBuilder};
pub use logging::LoggingBuilder;

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
