//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for safe, sandboxed env var and cwd manipulation.

use dock_config::{DockConfig, StoreBackend};
use dock_core::{EntityType, FieldKind};
use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;

#[test]
fn loads_lookup_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[lookup]
fields = ["code", "name"]
header_args_separator = "@"
field_args_separator = ","
identity_field = "pk"
direct_relation_kinds = ["foreign_key"]
"#,
        )?;

        let config: DockConfig = Figment::from(Serialized::defaults(DockConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.lookup.fields, vec!["code", "name"]);
        assert_eq!(config.lookup.header_args_separator, "@");
        assert_eq!(config.lookup.field_args_separator, ",");
        assert_eq!(config.lookup.identity_field, "pk");
        assert_eq!(config.lookup.direct_relation_kinds, vec![FieldKind::ForeignKey]);
        Ok(())
    });
}

#[test]
fn loads_source_and_store_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[source]
manifest = "order.json"
extensions = [".csv", ".tsv"]
ignored_dirs = ["assets", "drafts"]

[store]
backend = "memory"
schema = "data/schema.toml"
"#,
        )?;

        let config: DockConfig = Figment::from(Serialized::defaults(DockConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.source.manifest, "order.json");
        assert_eq!(config.source.extensions, vec![".csv", ".tsv"]);
        assert!(config.source.is_ignored("drafts"));
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.schema, "data/schema.toml");
        assert_eq!(config.store.path, ".dock/store.duckdb");
        Ok(())
    });
}

#[test]
fn loads_overrides_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[[overrides]]
entity = "library.Book"
rename = { writer = "author" }
defaults = { status = "draft" }
drop = ["notes"]

[[overrides]]
entity = "library.Tag"
prepare = false
"#,
        )?;

        let config: DockConfig = Figment::from(Serialized::defaults(DockConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.overrides.len(), 2);
        let book = &config.overrides[0];
        assert_eq!(book.entity, EntityType::new("library", "Book"));
        assert_eq!(book.rename["writer"], "author");
        assert_eq!(book.defaults["status"], "draft");
        assert_eq!(book.drop, vec!["notes"]);
        assert!(book.prepare);
        assert!(!config.overrides[1].prepare);
        Ok(())
    });
}

#[test]
fn project_file_is_picked_up_by_load() {
    Jail::expect_with(|jail| {
        std::fs::create_dir_all(jail.directory().join(".dock"))
            .map_err(|e| e.to_string())?;
        jail.create_file(
            ".dock/config.toml",
            r#"
[source]
manifest = "manifest.json"
"#,
        )?;

        let config = DockConfig::load().map_err(|e| e.to_string())?;
        assert_eq!(config.source.manifest, "manifest.json");
        Ok(())
    });
}

#[test]
fn explicit_file_beats_project_file() {
    Jail::expect_with(|jail| {
        std::fs::create_dir_all(jail.directory().join(".dock"))
            .map_err(|e| e.to_string())?;
        jail.create_file(".dock/config.toml", "[store]\npath = \"project.duckdb\"\n")?;
        jail.create_file("extra.toml", "[store]\npath = \"extra.duckdb\"\n")?;

        let config = DockConfig::load_from(Some(std::path::Path::new("extra.toml")))
            .map_err(|e| e.to_string())?;
        assert_eq!(config.store.path, "extra.duckdb");
        Ok(())
    });
}

#[test]
fn load_rejects_invalid_values() {
    Jail::expect_with(|jail| {
        jail.create_file("bad.toml", "[lookup]\nfields = []\n")?;

        let result = DockConfig::load_from(Some(std::path::Path::new("bad.toml")));
        assert!(result.is_err());
        Ok(())
    });
}
