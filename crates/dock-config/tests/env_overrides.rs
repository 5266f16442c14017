use dock_config::{DockConfig, StoreBackend};
use figment::Jail;

#[test]
fn env_sets_nested_values() {
    Jail::expect_with(|jail| {
        jail.set_env("DOCK_STORE__BACKEND", "memory");
        jail.set_env("DOCK_LOOKUP__IDENTITY_FIELD", "pk");

        let config = DockConfig::load().map_err(|e| e.to_string())?;
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.lookup.identity_field, "pk");
        Ok(())
    });
}

#[test]
fn env_beats_project_file() {
    Jail::expect_with(|jail| {
        std::fs::create_dir_all(jail.directory().join(".dock"))
            .map_err(|e| e.to_string())?;
        jail.create_file(".dock/config.toml", "[source]\nmanifest = \"file.json\"\n")?;
        jail.set_env("DOCK_SOURCE__MANIFEST", "env.json");

        let config = DockConfig::load().map_err(|e| e.to_string())?;
        assert_eq!(config.source.manifest, "env.json");
        Ok(())
    });
}

#[test]
fn env_list_values_parse() {
    Jail::expect_with(|jail| {
        jail.set_env("DOCK_LOOKUP__FIELDS", "[code, name]");

        let config = DockConfig::load().map_err(|e| e.to_string())?;
        assert_eq!(config.lookup.fields, vec!["code", "name"]);
        Ok(())
    });
}
