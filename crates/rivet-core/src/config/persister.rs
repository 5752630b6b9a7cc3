use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

/// Storage backend for plugin configuration.
///
/// Persisters report their own failures (typically by logging); callers
/// never see an error. A missing configuration loads as an empty map.
pub trait ConfigPersister: Send + Sync {
    /// Loads all entries stored for `plugin_id`.
    fn load(&self, plugin_id: &str) -> HashMap<String, String>;

    /// Replaces the stored entries for `plugin_id` with `config`.
    fn save(&self, plugin_id: &str, config: &HashMap<String, String>);

    /// Removes everything stored for `plugin_id`.
    fn delete(&self, _plugin_id: &str) {}
}

/// Keeps configuration in memory. Useful for tests and hosts that do not
/// want disk I/O.
#[derive(Debug, Default)]
pub struct MemoryConfigPersister {
    store: RwLock<HashMap<String, HashMap<String, String>>>,
    saves: AtomicUsize,
}

impl MemoryConfigPersister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the stored entries for `plugin_id`.
    pub fn with_plugin<I, K, V>(self, plugin_id: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.store.write().insert(plugin_id.to_string(), entries);
        self
    }

    /// What is currently stored for `plugin_id`.
    pub fn stored(&self, plugin_id: &str) -> Option<HashMap<String, String>> {
        self.store.read().get(plugin_id).cloned()
    }

    /// Number of `save` calls received so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl ConfigPersister for MemoryConfigPersister {
    fn load(&self, plugin_id: &str) -> HashMap<String, String> {
        self.stored(plugin_id).unwrap_or_default()
    }

    fn save(&self, plugin_id: &str, config: &HashMap<String, String>) {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.store
            .write()
            .insert(plugin_id.to_string(), config.clone());
    }

    fn delete(&self, plugin_id: &str) {
        self.store.write().remove(plugin_id);
    }
}
