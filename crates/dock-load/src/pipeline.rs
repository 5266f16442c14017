//! Pipeline Driver: locate → extract + normalize → (process) → save.
//!
//! Everything runs on the caller's thread, one source and one record at a
//! time, in load-plan order. The first error stops the run; records saved
//! before it stay saved.

use std::path::{Path, PathBuf};

use dock_config::{DockConfig, LookupConfig, SourceConfig};
use dock_core::{EntityType, Record, Store};
use serde::Serialize;

use crate::error::LoadError;
use crate::locate::{Source, SourceLocator};
use crate::normalize::read_source;
use crate::persist::{Outcome, Persister};
use crate::strategy::StrategyRegistry;

/// Normalized records bound for one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub entity: EntityType,
    /// The file the records came from; `None` for synthesized datasets.
    pub source: Option<PathBuf>,
    pub records: Vec<Record>,
}

/// Whole-dataset transform run between extraction and persistence.
///
/// Receives every dataset in load order and returns the datasets to save,
/// in the order to save them. It may validate, reorder, drop, or add.
pub trait DatasetProcessor {
    /// # Errors
    ///
    /// Any error aborts the run before a single record is written.
    fn processed(&self, datasets: Vec<Dataset>) -> Result<Vec<Dataset>, LoadError>;
}

/// Per-dataset counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub entity: EntityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub records: usize,
    pub created: usize,
    pub updated: usize,
}

/// Result of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub sources: Vec<SourceReport>,
    pub records: usize,
    pub created: usize,
    pub updated: usize,
}

impl LoadReport {
    fn push(&mut self, source: SourceReport) {
        self.records += source.records;
        self.created += source.created;
        self.updated += source.updated;
        self.sources.push(source);
    }
}

/// Drives a load plan into a store.
pub struct Pipeline {
    lookup: LookupConfig,
    strategies: StrategyRegistry,
    processor: Option<Box<dyn DatasetProcessor>>,
}

impl Pipeline {
    #[must_use]
    pub fn new(lookup: LookupConfig) -> Self {
        Self {
            lookup,
            strategies: StrategyRegistry::new(),
            processor: None,
        }
    }

    /// Lookup settings plus one rewrite strategy per configured override.
    #[must_use]
    pub fn from_config(config: &DockConfig) -> Self {
        Self::new(config.lookup.clone())
            .with_strategies(StrategyRegistry::from_overrides(&config.overrides))
    }

    #[must_use]
    pub fn with_strategies(mut self, strategies: StrategyRegistry) -> Self {
        self.strategies = strategies;
        self
    }

    #[must_use]
    pub fn with_processor(mut self, processor: impl DatasetProcessor + 'static) -> Self {
        self.processor = Some(Box::new(processor));
        self
    }

    #[must_use]
    pub const fn lookup(&self) -> &LookupConfig {
        &self.lookup
    }

    /// Read and normalize every source, in order.
    ///
    /// # Errors
    ///
    /// Returns the first read or parse error.
    pub fn extract(&self, inventory: &[Source]) -> Result<Vec<Dataset>, LoadError> {
        inventory
            .iter()
            .map(|source| {
                let records = read_source(&source.path)?;
                Ok(Dataset {
                    entity: source.entity.clone(),
                    source: Some(source.path.clone()),
                    records,
                })
            })
            .collect()
    }

    /// Run the full pipeline over a load plan.
    ///
    /// # Errors
    ///
    /// Returns the first error from extraction, processing, resolution, or
    /// persistence. Nothing is rolled back.
    pub fn run(&self, inventory: &[Source], store: &mut dyn Store) -> Result<LoadReport, LoadError> {
        let mut datasets = self.extract(inventory)?;
        if let Some(processor) = &self.processor {
            datasets = processor.processed(datasets)?;
            tracing::debug!(datasets = datasets.len(), "dataset processor finished");
        }
        self.save(datasets, store)
    }

    /// Persist datasets in order, record by record.
    ///
    /// # Errors
    ///
    /// Returns the first resolution or persistence error.
    pub fn save(&self, datasets: Vec<Dataset>, store: &mut dyn Store) -> Result<LoadReport, LoadError> {
        let mut persister = Persister::new(store, &self.lookup);
        let mut report = LoadReport::default();

        for dataset in datasets {
            let strategy = self.strategies.strategy_for(&dataset.entity);
            let mut source = SourceReport {
                entity: dataset.entity.clone(),
                path: dataset.source,
                records: dataset.records.len(),
                created: 0,
                updated: 0,
            };

            for record in dataset.records {
                let saved = strategy.save(&mut persister, &dataset.entity, record)?;
                match saved.outcome {
                    Outcome::Created => source.created += 1,
                    Outcome::Updated => source.updated += 1,
                }
            }

            tracing::info!(
                entity = %source.entity,
                records = source.records,
                created = source.created,
                updated = source.updated,
                "loaded dataset"
            );
            report.push(source);
        }

        tracing::info!(
            sources = report.sources.len(),
            records = report.records,
            created = report.created,
            updated = report.updated,
            "load complete"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("lookup", &self.lookup)
            .field("strategies", &self.strategies)
            .field("processor", &self.processor.is_some())
            .finish()
    }
}

/// Locate the sources under `root` and load them into `store`.
///
/// # Errors
///
/// Returns the first configuration, resolution, or persistence error.
pub fn load_tree(
    root: &Path,
    source: &SourceConfig,
    pipeline: &Pipeline,
    store: &mut dyn Store,
) -> Result<LoadReport, LoadError> {
    let inventory = SourceLocator::new(source.clone()).locate(root, store.schema())?;
    pipeline.run(&inventory, store)
}

#[cfg(test)]
mod tests {
    use dock_core::{EntitySchema, FieldKind, Schema};
    use dock_store::MemoryStore;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::{PersistError, ResolutionError};

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

    fn dataset(entity: EntityType, records: Vec<Record>) -> Dataset {
        Dataset {
            entity,
            source: None,
            records,
        }
    }

    #[test]
    fn saves_datasets_in_order_and_counts() {
        let pipeline = Pipeline::new(LookupConfig::default());
        let mut store = store();

        let report = pipeline
            .save(
                vec![
                    dataset(author(), vec![record(&[("name", "Ada")]), record(&[("name", "Grace")])]),
                    dataset(book(), vec![record(&[("title", "Computing"), ("author", "Grace")])]),
                ],
                &mut store,
            )
            .unwrap();

        assert_eq!(report.records, 3);
        assert_eq!(report.created, 3);
        assert_eq!(report.updated, 0);
        assert_eq!(report.sources.len(), 2);
        let grace = &store.instances(&author())[1];
        assert_eq!(
            store.instances(&book())[0].reference_of("author"),
            Some(&grace.reference())
        );
    }

    #[test]
    fn out_of_order_datasets_fail_to_resolve() {
        let pipeline = Pipeline::new(LookupConfig::default());
        let mut store = store();

        let err = pipeline
            .save(
                vec![
                    dataset(book(), vec![record(&[("title", "Computing"), ("author", "Ada")])]),
                    dataset(author(), vec![record(&[("name", "Ada")])]),
                ],
                &mut store,
            )
            .unwrap_err();

        assert!(matches!(
            err,
            LoadError::Resolution(ResolutionError::NotFound { .. })
        ));
        assert_eq!(store.count(&author()), 0);
    }

    #[test]
    fn first_failure_stops_the_run_without_rollback() {
        let pipeline = Pipeline::new(LookupConfig::default());
        let mut store = store();

        let err = pipeline
            .save(
                vec![dataset(
                    author(),
                    vec![
                        record(&[("name", "Ada")]),
                        record(&[("id", "99"), ("name", "Ghost")]),
                        record(&[("name", "Grace")]),
                    ],
                )],
                &mut store,
            )
            .unwrap_err();

        assert!(matches!(
            err,
            LoadError::Persist(PersistError::IdentityNotFound { .. })
        ));
        assert_eq!(store.count(&author()), 1);
    }

    struct SwapOrder;

    impl DatasetProcessor for SwapOrder {
        fn processed(&self, mut datasets: Vec<Dataset>) -> Result<Vec<Dataset>, LoadError> {
            datasets.reverse();
            Ok(datasets)
        }
    }

    #[test]
    fn processor_sees_and_reorders_everything() {
        let dir = tempfile::tempdir().unwrap();
        let books = dir.path().join("books.csv");
        let authors = dir.path().join("authors.csv");
        std::fs::write(&books, "title,author\nComputing,Ada\n").unwrap();
        std::fs::write(&authors, "name\nAda\n").unwrap();

        let inventory = vec![
            Source {
                entity: book(),
                path: books,
            },
            Source {
                entity: author(),
                path: authors.clone(),
            },
        ];
        let pipeline = Pipeline::new(LookupConfig::default()).with_processor(SwapOrder);
        let mut store = store();
        let report = pipeline.run(&inventory, &mut store).unwrap();

        assert_eq!(report.sources[0].entity, author());
        assert_eq!(report.sources[0].path.as_deref(), Some(authors.as_path()));
        assert_eq!(store.count(&book()), 1);
    }

    #[test]
    fn report_serializes_with_entity_names() {
        let mut report = LoadReport::default();
        report.push(SourceReport {
            entity: author(),
            path: None,
            records: 2,
            created: 1,
            updated: 1,
        });

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["sources"][0]["entity"], "library.Authors");
        assert_eq!(json["records"], 2);
        assert!(json["sources"][0].get("path").is_none());
    }
}
