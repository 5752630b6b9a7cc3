//! Host configuration loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Profile-specific config file (`rivet.{profile}.toml`)
//! 3. Main config file (`rivet.toml`)
//! 4. Environment variables (`RIVET_*`)
//! 5. Programmatic overrides
//!
//! # Environment Variable Mapping
//!
//! Environment variables use the `RIVET_` prefix with `__` as separator:
//!
//! - `RIVET_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `RIVET_PLUGINS__CONFIG_DIR=/etc/app/plugins` → `plugins.config_dir`
//! - `RIVET_EVENTS__DELIVERY=tokio` → `events.delivery = "tokio"`
//!
//! # Example
//!
//! ```rust,ignore
//! use rivet_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("./rivet.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(feature = "toml-config")]
use figment::providers::{Format, Toml};
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{HostConfigError, HostConfigResult};
use super::schema::HostConfig;

const ENV_PREFIX: &str = "RIVET_";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `RIVET_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var("RIVET_PROFILE")
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layered [`HostConfig`] loader.
pub struct ConfigLoader {
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a directory to search for `rivet.toml`.
    ///
    /// Without any search paths the current directory and
    /// `<user config dir>/rivet` are searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges `config` over every other source.
    pub fn merge(mut self, config: HostConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    pub fn load(self) -> HostConfigResult<HostConfig> {
        let profile = self.profile.clone();
        let config: HostConfig = self
            .build_figment()?
            .extract()
            .map_err(|e| HostConfigError::Extract(e.to_string()))?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            config_dir = %config.plugins.config_dir.display(),
            "Host configuration loaded"
        );
        Ok(config)
    }

    fn build_figment(mut self) -> HostConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(HostConfig::default()));

        if let Some(path) = self.config_file.take() {
            if !path.exists() {
                return Err(HostConfigError::FileNotFound(path));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, &path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with {ENV_PREFIX} prefix");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment.merge(std::mem::take(&mut self.overrides)))
    }

    fn merge_config_file(figment: Figment, path: &Path) -> HostConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            _ => Err(HostConfigError::UnsupportedFormat(ext.to_string())),
        }
    }

    #[cfg(feature = "toml-config")]
    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("rivet"));
        }
        paths
    }

    #[cfg(feature = "toml-config")]
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        for dir in self.resolve_search_paths() {
            let profile_path = dir.join(format!("rivet.{}.toml", self.profile));
            if profile_path.exists() {
                debug!(path = %profile_path.display(), "Loading profile-specific config");
                figment = figment.merge(Toml::file(&profile_path));
            }

            let base_path = dir.join("rivet.toml");
            if base_path.exists() {
                info!(path = %base_path.display(), "Loading configuration file");
                return figment.merge(Toml::file(&base_path));
            }
        }
        warn!("No configuration file found, using defaults");
        figment
    }

    #[cfg(not(feature = "toml-config"))]
    fn load_config_files(&self, figment: Figment) -> Figment {
        debug!("No configuration file format enabled, skipping file search");
        figment
    }
}

/// Loads host configuration from the default locations.
pub fn load_config() -> HostConfigResult<HostConfig> {
    ConfigLoader::new().load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EventDelivery, LogLevel};
    use figment::Jail;

    #[test]
    fn test_defaults_without_sources() {
        Jail::expect_with(|jail| {
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config, HostConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_then_merge() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "rivet.toml",
                r#"
                [logging]
                level = "debug"

                [plugins]
                config_dir = "from-file"

                [events]
                delivery = "tokio"
                "#,
            )?;
            jail.set_env("RIVET_PLUGINS__CONFIG_DIR", "from-env");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.logging.level, LogLevel::Debug);
            assert_eq!(config.plugins.config_dir, PathBuf::from("from-env"));
            assert_eq!(config.events.delivery, EventDelivery::Tokio);

            let mut forced = HostConfig::default();
            forced.plugins.config_dir = PathBuf::from("forced");
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .merge(forced)
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.plugins.config_dir, PathBuf::from("forced"));
            Ok(())
        });
    }

    #[test]
    fn test_profile_file_is_overridden_by_base() {
        Jail::expect_with(|jail| {
            jail.create_file("rivet.production.toml", "[logging]\nlevel = \"warn\"\nthread_ids = true\n")?;
            jail.create_file("rivet.toml", "[logging]\nlevel = \"error\"\n")?;

            let config = ConfigLoader::new()
                .profile("prod")
                .search_path(jail.directory())
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.logging.level, LogLevel::Error);
            assert!(config.logging.thread_ids);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = ConfigLoader::new()
            .file("/definitely/not/here/rivet.toml")
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, HostConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        Jail::expect_with(|jail| {
            jail.create_file("rivet.ini", "level=debug")?;
            let err = ConfigLoader::new()
                .file(jail.directory().join("rivet.ini"))
                .without_env()
                .load()
                .unwrap_err();
            assert!(matches!(err, HostConfigError::UnsupportedFormat(ext) if ext == "ini"));
            Ok(())
        });
    }

    #[test]
    fn test_profile_parsing() {
        assert_eq!(ConfigLoader::new().profile("PROD").profile, Profile::Production);
        assert_eq!(
            ConfigLoader::new().profile("staging").profile,
            Profile::Custom("staging".into())
        );
    }
}
