//! # dock-load
//!
//! Loads a directory tree of tabular files into a [`dock_core::Store`].
//!
//! - [`locate`]: manifest-driven load order and entity-type mapping
//! - [`normalize`]: CSV/TSV/JSON parsing and header cleanup
//! - [`resolve`]: relation lookup with per-header priority
//! - [`persist`]: create-or-update plus deferred relation wiring
//! - [`strategy`]: per-entity save overrides
//! - [`pipeline`]: the end-to-end driver
//!
//! ```no_run
//! use std::path::Path;
//!
//! use dock_config::DockConfig;
//! use dock_load::{Pipeline, load_tree};
//! # fn demo(store: &mut dyn dock_core::Store) -> Result<(), Box<dyn std::error::Error>> {
//! let config = DockConfig::load()?;
//! let pipeline = Pipeline::from_config(&config);
//! let report = load_tree(Path::new("data"), &config.source, &pipeline, store)?;
//! println!("{} records", report.records);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod locate;
pub mod normalize;
pub mod persist;
pub mod pipeline;
pub mod resolve;
pub mod strategy;

pub use error::{LoadConfigError, LoadError, ParseError, PersistError, ResolutionError};
pub use locate::{Manifest, Source, SourceLocator};
pub use normalize::{SourceFormat, canonical_header, canonical_headers, read_source};
pub use persist::{Outcome, Persister, Saved};
pub use pipeline::{Dataset, DatasetProcessor, LoadReport, Pipeline, SourceReport, load_tree};
pub use resolve::{Pending, Prepared, Resolver};
pub use strategy::{GenericSave, RewriteStrategy, SaveStrategy, StrategyRegistry};
