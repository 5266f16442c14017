//! Source tree layout configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default per-directory manifest filename.
fn default_manifest() -> String {
    String::from("index.json")
}

fn default_extensions() -> Vec<String> {
    vec![String::from(".csv")]
}

fn default_ignored_dirs() -> Vec<String> {
    vec![String::from("assets")]
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Manifest filename read in every directory.
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// Data file extensions, tried in order for each manifest entry.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory names never walked or expanded.
    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            extensions: default_extensions(),
            ignored_dirs: default_ignored_dirs(),
        }
    }
}

impl SourceConfig {
    /// Whether a directory name is excluded from the walk.
    #[must_use]
    pub fn is_ignored(&self, dir_name: &str) -> bool {
        self.ignored_dirs.iter().any(|ignored| ignored == dir_name)
    }

    /// Reject settings the locator cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.manifest.is_empty() {
            return Err(ConfigError::invalid("source.manifest", "must not be empty"));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::invalid(
                "source.extensions",
                "at least one extension is required",
            ));
        }
        if let Some(bad) = self
            .extensions
            .iter()
            .find(|ext| !ext.starts_with('.') || ext.len() < 2)
        {
            return Err(ConfigError::invalid(
                "source.extensions",
                format!("'{bad}' must look like '.csv'"),
            ));
        }
        Ok(())
    }
}
