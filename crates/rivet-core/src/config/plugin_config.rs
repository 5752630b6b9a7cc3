use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;

use super::ConfigChangeEvent;
use crate::error::{ConfigError, ConfigResult};

/// Invoked after every change, with the lock on the data already released.
pub type ChangeCallback = Arc<dyn Fn(&PluginConfig, ConfigChangeEvent) + Send + Sync>;

/// One plugin's configuration.
///
/// All values are strings. The typed getters parse on read and return
/// `default` only when the key is absent; a value that does not parse is a
/// [`ConfigError::Format`]. Typed setters store the value's string form.
pub struct PluginConfig {
    plugin_id: String,
    data: RwLock<HashMap<String, String>>,
    on_change: Option<ChangeCallback>,
}

impl PluginConfig {
    pub fn new(
        plugin_id: impl Into<String>,
        initial: HashMap<String, String>,
        on_change: Option<ChangeCallback>,
    ) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            data: RwLock::new(initial),
            on_change,
        }
    }

    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    // ─── Raw access ───────────────────────────────────────────────────────────

    pub fn get(&self, key: &str) -> Option<String> {
        self.data.read().get(key).cloned()
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Stores `value` under `key`. Always emits a change event, even when
    /// the value is unchanged.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let old_value = self.data.write().insert(key.clone(), value.clone());
        self.notify(key, old_value, Some(value));
    }

    /// Removes `key`. Emits a change event only if the key was present.
    pub fn remove(&self, key: &str) {
        let removed = self.data.write().remove(key);
        if let Some(old_value) = removed {
            self.notify(key.to_string(), Some(old_value), None);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// A copy of every entry.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.data.read().clone()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn notify(&self, key: String, old_value: Option<String>, new_value: Option<String>) {
        if let Some(callback) = &self.on_change {
            let event = ConfigChangeEvent {
                plugin_id: self.plugin_id.clone(),
                key,
                old_value,
                new_value,
            };
            callback(self, event);
        }
    }

    // ─── Typed access ─────────────────────────────────────────────────────────

    fn parse_or<T: FromStr>(&self, key: &str, default: T, expected: &'static str) -> ConfigResult<T> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Format {
                key: key.to_string(),
                value,
                expected,
            }),
        }
    }

    pub fn get_i32(&self, key: &str, default: i32) -> ConfigResult<i32> {
        self.parse_or(key, default, "i32")
    }

    pub fn set_i32(&self, key: impl Into<String>, value: i32) {
        self.set(key, value.to_string());
    }

    pub fn get_i64(&self, key: &str, default: i64) -> ConfigResult<i64> {
        self.parse_or(key, default, "i64")
    }

    pub fn set_i64(&self, key: impl Into<String>, value: i64) {
        self.set(key, value.to_string());
    }

    /// Accepts `true` / `false` in any letter case.
    pub fn get_bool(&self, key: &str, default: bool) -> ConfigResult<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(value) if value.trim().eq_ignore_ascii_case("true") => Ok(true),
            Some(value) if value.trim().eq_ignore_ascii_case("false") => Ok(false),
            Some(value) => Err(ConfigError::Format {
                key: key.to_string(),
                value,
                expected: "bool",
            }),
        }
    }

    pub fn set_bool(&self, key: impl Into<String>, value: bool) {
        self.set(key, value.to_string());
    }

    pub fn get_f64(&self, key: &str, default: f64) -> ConfigResult<f64> {
        self.parse_or(key, default, "f64")
    }

    pub fn set_f64(&self, key: impl Into<String>, value: f64) {
        self.set(key, value.to_string());
    }

    /// Comma-separated list; an absent key yields an empty list.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get_list_or(key, Vec::new())
    }

    /// Splits on `,` without trimming. Trailing empty items are dropped, so
    /// an empty value is an empty list.
    pub fn get_list_or(&self, key: &str, default: Vec<String>) -> Vec<String> {
        let Some(value) = self.get(key) else {
            return default;
        };
        let mut items: Vec<String> = value.split(',').map(str::to_string).collect();
        while items.last().is_some_and(String::is_empty) {
            items.pop();
        }
        items
    }

    pub fn set_list<I, S>(&self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.set(key, joined);
    }
}

impl std::fmt::Debug for PluginConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginConfig")
            .field("plugin_id", &self.plugin_id)
            .field("keys", &self.keys())
            .finish_non_exhaustive()
    }
}
