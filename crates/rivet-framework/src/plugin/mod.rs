//! Plugin and extension contracts.

mod component;
mod info;

pub use component::{Component, Plugin, ServiceRegistryAware};
pub use info::PluginInfo;
