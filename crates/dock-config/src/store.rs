//! Store backend configuration.

use serde::{Deserialize, Serialize};

/// Which [`dock_core::Store`] implementation to load into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// In-process store, discarded at exit.
    Memory,
    /// Persistent `DuckDB` file.
    #[default]
    #[serde(rename = "duckdb")]
    DuckDb,
}

/// Default `DuckDB` file location.
fn default_path() -> String {
    String::from(".dock/store.duckdb")
}

/// Default schema description file.
fn default_schema() -> String {
    String::from("schema.toml")
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// `DuckDB` database path (ignored by the memory backend).
    #[serde(default = "default_path")]
    pub path: String,

    /// TOML schema description for every loadable entity type.
    #[serde(default = "default_schema")]
    pub schema: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_path(),
            schema: default_schema(),
        }
    }
}
