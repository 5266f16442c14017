//! Loader error taxonomy.
//!
//! Every variant is fatal: the pipeline stops at the first error and records
//! already persisted stay persisted.

use std::path::PathBuf;

use dock_core::{EntityType, SchemaError, StoreError};
use thiserror::Error;

/// The source tree or the entity mapping is malformed.
#[derive(Debug, Error)]
pub enum LoadConfigError {
    /// The root directory does not exist or cannot be resolved.
    #[error("Cannot open data root {path}: {source}")]
    Root {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The directory walk failed.
    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),

    /// A manifest file could not be read.
    #[error("Cannot read manifest {path}: {source}")]
    ManifestIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A manifest is not a JSON object with an `ordering` list of names.
    #[error("Invalid manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A source path has no parent directory or stem to map from.
    #[error("Cannot derive an entity type from {0}")]
    Unmappable(PathBuf),

    /// A source maps to an entity type the schema does not declare.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A located file has an extension no reader handles.
    #[error("Unsupported source format: {0}")]
    UnsupportedFormat(PathBuf),
}

/// A field value could not be turned into a reference.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// No lookup field matched the value on the target entity type.
    #[error("No {entity} matches '{value}' (tried: {})", lookups.join(", "))]
    NotFound {
        entity: EntityType,
        value: String,
        lookups: Vec<String>,
    },

    /// The field is neither declared on the entity type nor a reverse accessor.
    #[error("Unknown field '{field}' on {entity}")]
    UnknownField { entity: EntityType, field: String },

    /// The field is a relation whose target type is not declared.
    #[error("Relation '{field}' on {entity} has no target entity type")]
    MissingTarget { entity: EntityType, field: String },

    /// A lookup matched more than one instance.
    #[error("Ambiguous reference: {entity}.{field} = '{value}' matches several instances")]
    Ambiguous {
        entity: EntityType,
        field: String,
        value: String,
    },

    /// A reverse accessor has no field to store its values in.
    #[error(
        "Reverse accessor '{field}' on {entity} needs a value field, e.g. '{field}|name'"
    )]
    NoValueField { entity: EntityType, field: String },
}

/// The store rejected a write.
#[derive(Debug, Error)]
pub enum PersistError {
    /// A record carries an identity that matches no existing instance.
    #[error("{entity} with identity '{id}' does not exist")]
    IdentityNotFound { entity: EntityType, id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a source's contents could not be normalized.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Malformed delimited text.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Not an array of flat objects.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Two raw headers collapse to the same field name.
    #[error("headers '{first}' and '{second}' both normalize to '{field}'")]
    DuplicateHeader {
        first: String,
        second: String,
        field: String,
    },
}

/// Top-level error for a load run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Config(#[from] LoadConfigError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    /// A source file could not be read.
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A source file could not be turned into records.
    #[error("Cannot parse {path}: {source}")]
    Parse { path: PathBuf, source: ParseError },
}

impl From<StoreError> for LoadError {
    fn from(error: StoreError) -> Self {
        Self::Persist(PersistError::Store(error))
    }
}
