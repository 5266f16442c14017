//! Shared state built once per invocation: configuration and schema.

use std::path::{Path, PathBuf};

use anyhow::Context;
use dock_config::{DockConfig, StoreBackend};
use dock_core::{Schema, Store};
use dock_store::{DuckStore, MemoryStore};

use crate::cli::GlobalFlags;

pub struct AppContext {
    pub config: DockConfig,
    pub schema_path: PathBuf,
}

impl AppContext {
    /// Load `.env`, the layered configuration, and resolve the schema path.
    pub fn init(flags: &GlobalFlags) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        let config = DockConfig::load_from(flags.config.as_deref())
            .context("failed to load configuration")?;
        Ok(Self::with_config(config, flags))
    }

    pub fn with_config(config: DockConfig, flags: &GlobalFlags) -> Self {
        let schema_path = flags
            .schema
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.store.schema));
        Self {
            config,
            schema_path,
        }
    }

    pub fn schema(&self) -> anyhow::Result<Schema> {
        Schema::from_path(&self.schema_path)
            .with_context(|| format!("failed to load schema from {}", self.schema_path.display()))
    }

    /// Open the configured store, or an in-memory one for dry runs.
    pub fn open_store(&self, dry_run: bool) -> anyhow::Result<Box<dyn Store>> {
        let schema = self.schema()?;

        if dry_run || self.config.store.backend == StoreBackend::Memory {
            tracing::debug!(dry_run, "using in-memory store");
            return Ok(Box::new(MemoryStore::new(schema)?));
        }

        let path = Path::new(&self.config.store.path);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let store = DuckStore::open_local(&self.config.store.path, schema)
            .with_context(|| format!("failed to open store at {}", path.display()))?;
        Ok(Box::new(store))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use dock_core::EntityType;

    use super::*;
    use crate::cli::OutputFormat;

    const SCHEMA: &str = r#"
[entities."library.Authors"]
fields = { name = "scalar" }
"#;

    fn flags(schema: Option<PathBuf>) -> GlobalFlags {
        GlobalFlags {
            format: OutputFormat::Json,
            config: None,
            schema,
        }
    }

    #[test]
    fn schema_flag_overrides_config() {
        let ctx = AppContext::with_config(DockConfig::default(), &flags(Some("custom.toml".into())));
        assert_eq!(ctx.schema_path, PathBuf::from("custom.toml"));

        let ctx = AppContext::with_config(DockConfig::default(), &flags(None));
        assert_eq!(ctx.schema_path, PathBuf::from("schema.toml"));
    }

    #[test]
    fn dry_run_uses_memory_store() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("schema.toml");
        fs::write(&schema, SCHEMA).unwrap();

        let mut config = DockConfig::default();
        config.store.path = dir.path().join("never.duckdb").display().to_string();
        let ctx = AppContext::with_config(config, &flags(Some(schema)));

        let store = ctx.open_store(true).unwrap();
        assert!(store.schema().entity(&EntityType::new("library", "Authors")).is_some());
        assert!(!dir.path().join("never.duckdb").exists());
    }

    #[test]
    fn duckdb_store_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("schema.toml");
        fs::write(&schema, SCHEMA).unwrap();

        let mut config = DockConfig::default();
        let db = dir.path().join("nested").join("store.duckdb");
        config.store.path = db.display().to_string();
        let ctx = AppContext::with_config(config, &flags(Some(schema)));

        ctx.open_store(false).unwrap();
        assert!(db.exists());
    }

    #[test]
    fn missing_schema_is_reported() {
        let ctx = AppContext::with_config(
            DockConfig::default(),
            &flags(Some("/nonexistent/schema.toml".into())),
        );
        let err = ctx.open_store(true).err().unwrap();
        assert!(format!("{err:#}").contains("failed to load schema"));
    }
}
