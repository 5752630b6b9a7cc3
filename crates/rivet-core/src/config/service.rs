use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::{ChangeCallback, ConfigChangeEvent, ConfigChangeListener, ConfigPersister, PluginConfig};
use crate::error::{ConfigError, ConfigResult};

struct Shared {
    persister: Arc<dyn ConfigPersister>,
    configs: RwLock<HashMap<String, Arc<PluginConfig>>>,
    listener: RwLock<Option<Arc<dyn ConfigChangeListener>>>,
}

impl Shared {
    fn on_config_changed(&self, config: &PluginConfig, event: ConfigChangeEvent) {
        let listener = self.listener.read().clone();
        if let Some(listener) = listener {
            listener.on_config_changed(&event);
            return;
        }

        // A deleted config must not write itself back.
        let is_current = self
            .configs
            .read()
            .get(&event.plugin_id)
            .is_some_and(|current| std::ptr::eq(Arc::as_ptr(current), config));
        if is_current {
            trace!(plugin = %event.plugin_id, key = %event.key, "Auto-saving configuration");
            self.persister.save(&event.plugin_id, &config.snapshot());
        }
    }
}

/// Hands out and persists per-plugin configuration.
///
/// Cloning is cheap; clones share the same configs and listener.
#[derive(Clone)]
pub struct ConfigService {
    shared: Arc<Shared>,
}

impl ConfigService {
    pub fn new(persister: Arc<dyn ConfigPersister>) -> Self {
        Self {
            shared: Arc::new(Shared {
                persister,
                configs: RwLock::new(HashMap::new()),
                listener: RwLock::new(None),
            }),
        }
    }

    /// Returns the configuration for `plugin_id`, loading it on first use.
    ///
    /// Repeated calls return the same instance until [`delete`](Self::delete).
    pub fn for_plugin(&self, plugin_id: &str) -> ConfigResult<Arc<PluginConfig>> {
        if plugin_id.is_empty() {
            return Err(ConfigError::InvalidArgument("plugin id must not be empty"));
        }
        if let Some(config) = self.shared.configs.read().get(plugin_id) {
            return Ok(Arc::clone(config));
        }

        let mut configs = self.shared.configs.write();
        if let Some(config) = configs.get(plugin_id) {
            return Ok(Arc::clone(config));
        }

        debug!(plugin = plugin_id, "Loading configuration");
        let data = self.shared.persister.load(plugin_id);
        let config = Arc::new(PluginConfig::new(
            plugin_id,
            data,
            Some(self.change_callback()),
        ));
        configs.insert(plugin_id.to_string(), Arc::clone(&config));
        Ok(config)
    }

    fn change_callback(&self) -> ChangeCallback {
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        Arc::new(move |config: &PluginConfig, event: ConfigChangeEvent| {
            if let Some(shared) = shared.upgrade() {
                shared.on_config_changed(config, event);
            }
        })
    }

    /// Routes change events to `listener` and stops auto-saving.
    pub fn set_change_listener(&self, listener: Arc<dyn ConfigChangeListener>) {
        *self.shared.listener.write() = Some(listener);
    }

    /// Detaches the listener; auto-save resumes with the next change.
    pub fn remove_change_listener(&self) {
        *self.shared.listener.write() = None;
    }

    pub fn has_change_listener(&self) -> bool {
        self.shared.listener.read().is_some()
    }

    /// Persists `plugin_id`'s current entries. Returns `false` if that
    /// configuration has not been loaded.
    pub fn save(&self, plugin_id: &str) -> bool {
        let config = self.shared.configs.read().get(plugin_id).cloned();
        match config {
            Some(config) => {
                debug!(plugin = plugin_id, "Saving configuration");
                self.shared.persister.save(plugin_id, &config.snapshot());
                true
            }
            None => false,
        }
    }

    /// Persists every loaded configuration.
    pub fn save_all(&self) {
        for plugin_id in self.loaded_plugins() {
            self.save(&plugin_id);
        }
    }

    /// Forgets the in-memory configuration and deletes its stored copy.
    pub fn delete(&self, plugin_id: &str) {
        self.shared.configs.write().remove(plugin_id);
        self.shared.persister.delete(plugin_id);
        debug!(plugin = plugin_id, "Deleted configuration");
    }

    /// Ids of all loaded configurations, sorted.
    pub fn loaded_plugins(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.shared.configs.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl std::fmt::Debug for ConfigService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigService")
            .field("loaded", &self.loaded_plugins())
            .field("listener", &self.has_change_listener())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MemoryConfigPersister, PropertiesConfigPersister};
    use parking_lot::Mutex;

    fn service() -> (ConfigService, Arc<MemoryConfigPersister>) {
        let persister = Arc::new(MemoryConfigPersister::new());
        (ConfigService::new(persister.clone()), persister)
    }

    #[test]
    fn test_for_plugin_is_memoized() {
        let (configs, _) = service();
        let a = configs.for_plugin("p1").unwrap();
        let b = configs.for_plugin("p1").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(configs.loaded_plugins(), ["p1"]);
    }

    #[test]
    fn test_empty_id_rejected() {
        let (configs, _) = service();
        assert!(matches!(
            configs.for_plugin(""),
            Err(ConfigError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_loads_persisted_entries() {
        let persister = Arc::new(MemoryConfigPersister::new().with_plugin("p1", [("k", "v")]));
        let configs = ConfigService::new(persister);
        let config = configs.for_plugin("p1").unwrap();
        assert_eq!(config.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_set_auto_saves_full_snapshot() {
        let (configs, persister) = service();
        let config = configs.for_plugin("p1").unwrap();

        config.set("k", "v");
        assert_eq!(persister.save_count(), 1);
        assert_eq!(
            persister.stored("p1").unwrap(),
            HashMap::from([("k".to_string(), "v".to_string())])
        );

        config.set("other", "x");
        assert_eq!(persister.save_count(), 2);
        assert_eq!(persister.stored("p1").unwrap().len(), 2);
    }

    #[test]
    fn test_listener_suppresses_auto_save() {
        let (configs, persister) = service();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        configs.set_change_listener(Arc::new(move |e: &ConfigChangeEvent| {
            sink.lock().push(e.clone())
        }));

        let config = configs.for_plugin("p1").unwrap();
        config.set("k", "v");

        assert_eq!(persister.save_count(), 0);
        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].key, "k");
        assert_eq!(events[0].plugin_id, "p1");
    }

    #[test]
    fn test_removing_listener_resumes_auto_save() {
        let (configs, persister) = service();
        configs.set_change_listener(Arc::new(|_: &ConfigChangeEvent| {}));
        let config = configs.for_plugin("p1").unwrap();
        config.set("a", "1");
        assert_eq!(persister.save_count(), 0);

        configs.remove_change_listener();
        config.set("b", "2");
        assert_eq!(persister.save_count(), 1);
        assert_eq!(persister.stored("p1").unwrap().len(), 2);
    }

    #[test]
    fn test_explicit_save_and_save_all() {
        let (configs, persister) = service();
        configs.set_change_listener(Arc::new(|_: &ConfigChangeEvent| {}));
        configs.for_plugin("p1").unwrap().set("a", "1");
        configs.for_plugin("p2").unwrap().set("b", "2");

        assert!(configs.save("p1"));
        assert!(!configs.save("unknown"));
        assert_eq!(persister.save_count(), 1);

        configs.save_all();
        assert_eq!(persister.save_count(), 3);
        assert!(persister.stored("p2").is_some());
    }

    #[test]
    fn test_delete_then_reload_is_empty() {
        let (configs, persister) = service();
        let old = configs.for_plugin("p1").unwrap();
        old.set("k", "v");

        configs.delete("p1");
        assert!(persister.stored("p1").is_none());

        let fresh = configs.for_plugin("p1").unwrap();
        assert!(fresh.keys().is_empty());
        assert!(!Arc::ptr_eq(&old, &fresh));

        // The detached instance no longer writes through.
        old.set("stale", "1");
        assert!(persister.stored("p1").is_none());
    }

    #[test]
    fn test_config_outliving_service_is_inert() {
        let (configs, persister) = service();
        let config = configs.for_plugin("p1").unwrap();
        drop(configs);

        config.set("k", "v");
        assert_eq!(persister.save_count(), 0);
        assert_eq!(config.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_auto_save_to_properties_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let configs = ConfigService::new(Arc::new(PropertiesConfigPersister::new(dir.path())));
        configs.for_plugin("greeter").unwrap().set_i32("start.count", 3);

        let reloaded = ConfigService::new(Arc::new(PropertiesConfigPersister::new(dir.path())));
        let config = reloaded.for_plugin("greeter").unwrap();
        assert_eq!(config.get_i32("start.count", 0).unwrap(), 3);
    }
}
