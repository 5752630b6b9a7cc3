//! Plugin lifecycle.
//!
//! [`PluginManager`] owns the plugins created through its [`PluginWiring`]
//! and drives their `start` / `stop` hooks:
//!
//! ```text
//! load()       ──► Loaded
//! start_all()  ──► Started   (start succeeded)
//!              ──► Failed    (start returned an error)
//! stop_all()   ──► Stopped   (Started → Stopped, reverse load order)
//! start_all()  ──► Started   (Stopped plugins are started again)
//! unload()     ──► gone      (stopped first if running; scope dropped)
//! ```
//!
//! Every transition is published as a [`PluginStateChanged`] event on the
//! global [`EventBus`], if the host registered one.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rivet_core::{EventBus, ServiceRegistryExt};
use tracing::{error, info, info_span, warn};

use crate::error::{WiringError, WiringResult};
use crate::plugin::{Plugin, PluginInfo};
use crate::wiring::PluginWiring;

/// Lifecycle state of a plugin held by [`PluginManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginState {
    /// Created and wired, never started.
    Loaded,
    /// `start` succeeded.
    Started,
    /// `stop` ran after a successful start.
    Stopped,
    /// `start` or `stop` returned an error. Not started again.
    Failed,
}

/// Published on the global [`EventBus`] on every state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginStateChanged {
    pub plugin_id: String,
    pub old_state: Option<PluginState>,
    pub new_state: PluginState,
}

// =============================================================================
// PluginEntry (internal)
// =============================================================================

struct PluginEntry {
    info: PluginInfo,
    slot: Mutex<Slot>,
}

struct Slot {
    plugin: Box<dyn Plugin>,
    state: PluginState,
}

// =============================================================================
// PluginManager
// =============================================================================

/// Holds wired plugins and runs their lifecycle hooks.
///
/// Plugins start in load order and stop in reverse load order.
pub struct PluginManager {
    wiring: PluginWiring,
    plugins: RwLock<Vec<Arc<PluginEntry>>>,
}

impl PluginManager {
    pub fn new(wiring: PluginWiring) -> Self {
        Self {
            wiring,
            plugins: RwLock::new(Vec::new()),
        }
    }

    pub fn wiring(&self) -> &PluginWiring {
        &self.wiring
    }

    // ─── Loading ──────────────────────────────────────────────────────────────

    /// Creates and wires a plugin, leaving it [`PluginState::Loaded`].
    pub fn load<P, F>(&self, info: PluginInfo, factory: F) -> WiringResult<()>
    where
        P: Plugin,
        F: FnOnce() -> P,
    {
        let plugin = self.wiring.create_plugin(info.clone(), factory)?;
        let id = info.id().to_string();
        self.plugins.write().push(Arc::new(PluginEntry {
            info,
            slot: Mutex::new(Slot {
                plugin: Box::new(plugin),
                state: PluginState::Loaded,
            }),
        }));
        info!(plugin = %id, "Plugin loaded");
        self.publish(&id, None, PluginState::Loaded);
        Ok(())
    }

    /// Stops (if running) and removes one plugin, dropping its scope.
    pub fn unload(&self, plugin_id: &str) -> WiringResult<()> {
        let entry = {
            let mut plugins = self.plugins.write();
            let pos = plugins
                .iter()
                .position(|e| e.info.id() == plugin_id)
                .ok_or_else(|| WiringError::UnknownPlugin(plugin_id.to_string()))?;
            plugins.remove(pos)
        };
        let result = self.stop_entry(&entry);
        self.wiring.unload(plugin_id);
        info!(plugin = %plugin_id, "Plugin unloaded");
        result
    }

    /// Stops everything, then unloads every plugin in reverse load order.
    pub fn unload_all(&self) {
        self.stop_all();
        let entries: Vec<_> = self.plugins.write().drain(..).rev().collect();
        for entry in entries {
            self.wiring.unload(entry.info.id());
            info!(plugin = %entry.info, "Plugin unloaded");
        }
    }

    // ─── Lifecycle ────────────────────────────────────────────────────────────

    /// Starts every `Loaded` or `Stopped` plugin in load order.
    ///
    /// Returns the number of plugins that were started. A failing plugin
    /// is marked [`PluginState::Failed`] and the rest still start.
    pub fn start_all(&self) -> usize {
        let mut started = 0;
        for entry in self.snapshot() {
            let mut slot = entry.slot.lock();
            if !matches!(slot.state, PluginState::Loaded | PluginState::Stopped) {
                continue;
            }
            let old = slot.state;
            let span = info_span!("start_plugin", plugin = %entry.info).entered();
            let new = match slot.plugin.start() {
                Ok(()) => {
                    info!(plugin = %entry.info, "Plugin started");
                    started += 1;
                    PluginState::Started
                }
                Err(e) => {
                    let e = WiringError::Lifecycle {
                        plugin: entry.info.id().to_string(),
                        action: "start",
                        source: e,
                    };
                    error!(plugin = %entry.info, error = %e, "Plugin failed to start");
                    PluginState::Failed
                }
            };
            slot.state = new;
            drop(slot);
            drop(span);
            self.publish(entry.info.id(), Some(old), new);
        }
        started
    }

    /// Stops every `Started` plugin in reverse load order.
    pub fn stop_all(&self) {
        for entry in self.snapshot().into_iter().rev() {
            if let Err(e) = self.stop_entry(&entry) {
                warn!(plugin = %entry.info, error = %e, "Plugin did not stop cleanly");
            }
        }
    }

    fn stop_entry(&self, entry: &PluginEntry) -> WiringResult<()> {
        let mut slot = entry.slot.lock();
        if slot.state != PluginState::Started {
            return Ok(());
        }
        let span = info_span!("stop_plugin", plugin = %entry.info).entered();
        let result = slot.plugin.stop().map_err(|source| WiringError::Lifecycle {
            plugin: entry.info.id().to_string(),
            action: "stop",
            source,
        });
        let new = if result.is_ok() {
            info!(plugin = %entry.info, "Plugin stopped");
            PluginState::Stopped
        } else {
            PluginState::Failed
        };
        slot.state = new;
        drop(slot);
        drop(span);
        self.publish(entry.info.id(), Some(PluginState::Started), new);
        result
    }

    // ─── Queries ──────────────────────────────────────────────────────────────

    pub fn plugin_state(&self, plugin_id: &str) -> Option<PluginState> {
        self.plugins
            .read()
            .iter()
            .find(|e| e.info.id() == plugin_id)
            .map(|e| e.slot.lock().state)
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.read().len()
    }

    /// Infos of all held plugins, in load order.
    pub fn plugins(&self) -> Vec<PluginInfo> {
        self.plugins.read().iter().map(|e| e.info.clone()).collect()
    }

    fn snapshot(&self) -> Vec<Arc<PluginEntry>> {
        self.plugins.read().iter().cloned().collect()
    }

    fn publish(&self, plugin_id: &str, old_state: Option<PluginState>, new_state: PluginState) {
        if let Some(bus) = self.wiring.global().get::<EventBus>() {
            bus.publish(PluginStateChanged {
                plugin_id: plugin_id.to_string(),
                old_state,
                new_state,
            });
        }
    }
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("wiring", &self.wiring)
            .field("plugins", &self.plugin_count())
            .finish()
    }
}
