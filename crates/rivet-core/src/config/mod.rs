//! Per-plugin string key/value configuration.
//!
//! [`ConfigService`] hands out one [`PluginConfig`] per plugin id, loading
//! it through a [`ConfigPersister`] on first use. By default every mutation
//! is written straight back (auto-save); attaching a
//! [`ConfigChangeListener`] switches auto-save off and routes change events
//! to the listener instead.
//!
//! ```rust,ignore
//! let configs = ConfigService::new(Arc::new(PropertiesConfigPersister::new("config/plugins")));
//! let config = configs.for_plugin("greeter")?;
//!
//! let starts = config.get_i32("start.count", 0)?;
//! config.set_i32("start.count", starts + 1); // persisted immediately
//! ```

mod event;
mod persister;
mod plugin_config;
mod properties;
mod service;

pub use event::{ConfigChangeEvent, ConfigChangeListener};
pub use persister::{ConfigPersister, MemoryConfigPersister};
pub use plugin_config::{ChangeCallback, PluginConfig};
pub use properties::PropertiesConfigPersister;
pub use service::ConfigService;
