use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Descriptive metadata for one loaded plugin.
///
/// Registered in every plugin's scope, so plugins can `#[inject]` their own
/// `PluginInfo`. Two infos are equal when their ids are equal.
///
/// ```rust,ignore
/// let info = PluginInfo::new("greeter")
///     .with_version("1.2.0")
///     .with_provider("Rivet Contributors");
/// ```
#[derive(Debug, Clone)]
pub struct PluginInfo {
    id: String,
    version: Option<String>,
    description: Option<String>,
    provider: Option<String>,
    path: Option<PathBuf>,
}

impl PluginInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: None,
            description: None,
            provider: None,
            path: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Where the plugin was loaded from, if it came from disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl PartialEq for PluginInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PluginInfo {}

impl Hash for PluginInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for PluginInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.id, version),
            None => f.write_str(&self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builder_fields() {
        let info = PluginInfo::new("greeter")
            .with_version("1.0.0")
            .with_description("Says hello")
            .with_provider("Rivet")
            .with_path("plugins/greeter");

        assert_eq!(info.id(), "greeter");
        assert_eq!(info.version(), Some("1.0.0"));
        assert_eq!(info.description(), Some("Says hello"));
        assert_eq!(info.provider(), Some("Rivet"));
        assert_eq!(info.path(), Some(Path::new("plugins/greeter")));
    }

    #[test]
    fn test_equality_by_id_only() {
        let a = PluginInfo::new("p1").with_version("1.0.0");
        let b = PluginInfo::new("p1").with_version("2.0.0");
        let c = PluginInfo::new("p2").with_version("1.0.0");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(PluginInfo::new("p1").to_string(), "p1");
        assert_eq!(PluginInfo::new("p1").with_version("0.3").to_string(), "p1@0.3");
    }
}
