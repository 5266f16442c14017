//! Save strategies and the per-entity registry.
//!
//! Every record is saved through a [`SaveStrategy`]. Unregistered entity
//! types use [`GenericSave`]; custom strategies pre-process the record and
//! then delegate to [`Persister::save_base`], optionally skipping relation
//! resolution when they already did equivalent work.

use std::collections::{BTreeMap, HashMap};

use dock_config::OverrideConfig;
use dock_core::{EntityType, Record};

use crate::error::LoadError;
use crate::persist::{Persister, Saved};

/// Prepares and persists one record of an entity type.
pub trait SaveStrategy {
    /// Save `record` as an instance of `entity`.
    ///
    /// # Errors
    ///
    /// Returns any resolution or persistence error; the run stops on it.
    fn save(
        &self,
        persister: &mut Persister<'_>,
        entity: &EntityType,
        record: Record,
    ) -> Result<Saved, LoadError>;
}

/// Resolve relations, then create or update.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericSave;

impl SaveStrategy for GenericSave {
    fn save(
        &self,
        persister: &mut Persister<'_>,
        entity: &EntityType,
        record: Record,
    ) -> Result<Saved, LoadError> {
        persister.save_base(entity, &record, true)
    }
}

/// Declarative record rewrite before the generic save.
///
/// Applied in order: renames, drops, then defaults for fields still absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteStrategy {
    pub rename: BTreeMap<String, String>,
    pub defaults: BTreeMap<String, String>,
    pub drop: Vec<String>,
    pub prepare: bool,
}

impl RewriteStrategy {
    #[must_use]
    pub fn from_override(config: &OverrideConfig) -> Self {
        Self {
            rename: config.rename.clone(),
            defaults: config.defaults.clone(),
            drop: config.drop.clone(),
            prepare: config.prepare,
        }
    }

    #[must_use]
    pub fn rewrite(&self, mut record: Record) -> Record {
        for (from, to) in &self.rename {
            if let Some(value) = record.remove(from) {
                record.insert(to.clone(), value);
            }
        }
        for field in &self.drop {
            record.remove(field);
        }
        for (field, value) in &self.defaults {
            if !value.is_empty() && !record.contains_key(field) {
                record.insert(field.clone(), value.clone());
            }
        }
        record
    }
}

impl SaveStrategy for RewriteStrategy {
    fn save(
        &self,
        persister: &mut Persister<'_>,
        entity: &EntityType,
        record: Record,
    ) -> Result<Saved, LoadError> {
        let record = self.rewrite(record);
        persister.save_base(entity, &record, self.prepare)
    }
}

/// Maps entity types to their save strategy.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: HashMap<EntityType, Box<dyn SaveStrategy>>,
    generic: GenericSave,
}

impl StrategyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry with one [`RewriteStrategy`] per override entry.
    /// A later entry for the same entity type replaces an earlier one.
    #[must_use]
    pub fn from_overrides(overrides: &[OverrideConfig]) -> Self {
        overrides.iter().fold(Self::new(), |registry, config| {
            registry.with(config.entity.clone(), RewriteStrategy::from_override(config))
        })
    }

    #[must_use]
    pub fn with(mut self, entity: EntityType, strategy: impl SaveStrategy + 'static) -> Self {
        self.register(entity, strategy);
        self
    }

    pub fn register(&mut self, entity: EntityType, strategy: impl SaveStrategy + 'static) {
        tracing::debug!(entity = %entity, "registered save strategy");
        self.strategies.insert(entity, Box::new(strategy));
    }

    /// The strategy for `entity`, or the generic one.
    #[must_use]
    pub fn strategy_for(&self, entity: &EntityType) -> &dyn SaveStrategy {
        match self.strategies.get(entity) {
            Some(strategy) => strategy.as_ref(),
            None => &self.generic,
        }
    }

    #[must_use]
    pub fn is_custom(&self, entity: &EntityType) -> bool {
        self.strategies.contains_key(entity)
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("custom", &self.strategies.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use dock_config::LookupConfig;
    use dock_core::{EntitySchema, FieldKind, Schema};
    use dock_store::MemoryStore;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::persist::Outcome;

    fn author() -> EntityType {
        EntityType::new("library", "Authors")
    }

    fn book() -> EntityType {
        EntityType::new("library", "Books")
    }

    fn store() -> MemoryStore {
        let schema = Schema::new()
            .with_entity(author(), EntitySchema::new().scalar("name"))
            .with_entity(
                book(),
                EntitySchema::new()
                    .scalar("title")
                    .scalar("status")
                    .relation("author", FieldKind::ForeignKey, &author()),
            );
        MemoryStore::new(schema).unwrap()
    }

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn book_override() -> OverrideConfig {
        OverrideConfig {
            entity: book(),
            rename: BTreeMap::from([("writer".to_string(), "author".to_string())]),
            defaults: BTreeMap::from([("status".to_string(), "draft".to_string())]),
            drop: vec!["notes".to_string()],
            prepare: true,
        }
    }

    #[test]
    fn rewrite_renames_drops_and_fills_defaults() {
        let strategy = RewriteStrategy::from_override(&book_override());
        let rewritten = strategy.rewrite(record(&[
            ("title", "T"),
            ("writer", "Ada"),
            ("notes", "scratch"),
        ]));

        assert_eq!(
            rewritten,
            record(&[("author", "Ada"), ("status", "draft"), ("title", "T")])
        );
    }

    #[test]
    fn defaults_do_not_overwrite_values() {
        let strategy = RewriteStrategy::from_override(&book_override());
        let rewritten = strategy.rewrite(record(&[("status", "final")]));
        assert_eq!(rewritten["status"], "final");
    }

    #[test]
    fn registry_falls_back_to_generic() {
        let registry = StrategyRegistry::from_overrides(&[book_override()]);
        assert!(registry.is_custom(&book()));
        assert!(!registry.is_custom(&author()));
    }

    #[test]
    fn override_strategy_saves_rewritten_record() {
        let lookup = LookupConfig::default();
        let mut store = store();
        let registry = StrategyRegistry::from_overrides(&[book_override()]);

        let mut persister = Persister::new(&mut store, &lookup);
        let ada = registry
            .strategy_for(&author())
            .save(&mut persister, &author(), record(&[("name", "Ada")]))
            .unwrap();
        let saved = registry
            .strategy_for(&book())
            .save(
                &mut persister,
                &book(),
                record(&[("title", "T"), ("writer", "Ada"), ("notes", "x")]),
            )
            .unwrap();

        assert_eq!(saved.outcome, Outcome::Created);
        assert_eq!(saved.instance.reference_of("author"), Some(&ada.instance.reference()));
        assert_eq!(saved.instance.text("status"), Some("draft"));
        assert!(!saved.instance.fields.contains_key("notes"));
    }

    struct Uppercase;

    impl SaveStrategy for Uppercase {
        fn save(
            &self,
            persister: &mut Persister<'_>,
            entity: &EntityType,
            record: Record,
        ) -> Result<Saved, LoadError> {
            let record: Record = record
                .into_iter()
                .map(|(k, v)| (k, v.to_uppercase()))
                .collect();
            persister.save_base(entity, &record, true)
        }
    }

    #[test]
    fn custom_strategies_can_be_registered() {
        let lookup = LookupConfig::default();
        let mut store = store();
        let registry = StrategyRegistry::new().with(author(), Uppercase);

        let mut persister = Persister::new(&mut store, &lookup);
        let saved = registry
            .strategy_for(&author())
            .save(&mut persister, &author(), record(&[("name", "ada")]))
            .unwrap();
        assert_eq!(saved.instance.text("name"), Some("ADA"));
    }
}
