//! # dock-config
//!
//! Layered configuration loading for dock using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`DOCK_*` prefix, `__` as separator)
//! 2. An explicit file passed on the command line (`--config`)
//! 3. Project-level `.dock/config.toml`
//! 4. User-level `~/.config/dock/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `DOCK_LOOKUP__IDENTITY_FIELD` -> `lookup.identity_field`,
//! `DOCK_STORE__BACKEND` -> `store.backend`, and so on.
//!
//! # Usage
//!
//! ```no_run
//! use dock_config::DockConfig;
//!
//! let config = DockConfig::load_with_dotenv().expect("config");
//! println!("manifest: {}", config.source.manifest);
//! ```

mod error;
mod lookup;
mod overrides;
mod source;
mod store;

pub use error::ConfigError;
pub use lookup::LookupConfig;
pub use overrides::OverrideConfig;
pub use source::SourceConfig;
pub use store::{StoreBackend, StoreConfig};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DockConfig {
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub overrides: Vec<OverrideConfig>,
}

impl DockConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`DockConfig::load_with_dotenv`] if you need
    /// `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] if a source is malformed, or
    /// [`ConfigError::InvalidValue`] if validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration with an extra TOML file layered above the project file.
    ///
    /// # Errors
    ///
    /// As [`DockConfig::load`].
    pub fn load_from(extra: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(extra).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// As [`DockConfig::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    #[must_use]
    pub fn figment(extra: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".dock/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Explicit file
        if let Some(path) = extra {
            figment = figment.merge(Toml::file(path));
        }

        // Layer 4: Environment variables (highest priority)
        figment.merge(Env::prefixed("DOCK_").split("__"))
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::InvalidValue`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.lookup.validate()?;
        self.source.validate()?;
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("dock").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DockConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.overrides.is_empty());
        assert_eq!(config.store.backend, StoreBackend::DuckDb);
    }

    #[test]
    fn figment_builds_without_files() {
        figment::Jail::expect_with(|_jail| {
            let config: DockConfig = DockConfig::figment(None).extract()?;
            assert_eq!(config.lookup.fields, vec!["id", "name"]);
            assert_eq!(config.source.manifest, "index.json");
            Ok(())
        });
    }
}
