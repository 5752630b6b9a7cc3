/// A single key change in a plugin's configuration.
///
/// `old_value` is `None` when the key was newly added; `new_value` is
/// `None` when it was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChangeEvent {
    pub plugin_id: String,
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl ConfigChangeEvent {
    /// Returns `true` if this event records a removal.
    pub fn is_removal(&self) -> bool {
        self.new_value.is_none()
    }
}

/// Takes over persistence from [`ConfigService`](super::ConfigService).
///
/// While a listener is attached, configuration changes are forwarded to it
/// and nothing is saved automatically.
pub trait ConfigChangeListener: Send + Sync {
    fn on_config_changed(&self, event: &ConfigChangeEvent);
}

impl<F> ConfigChangeListener for F
where
    F: Fn(&ConfigChangeEvent) + Send + Sync,
{
    fn on_config_changed(&self, event: &ConfigChangeEvent) {
        self(event)
    }
}
