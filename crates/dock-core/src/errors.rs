//! Cross-cutting error types for dock.
//!
//! Loader errors (`LoadError` and the resolution/persistence taxonomy) live in
//! `dock-load`; configuration errors live in `dock-config`. The CLI is where
//! all of them converge into `anyhow`.

use thiserror::Error;

use crate::entity::EntityType;

/// Errors raised while building core values.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An entity type identifier was not of the form `namespace.Name`.
    #[error("Invalid entity type '{0}': expected 'namespace.Name'")]
    InvalidEntityType(String),
}

/// Errors from loading or querying a schema description.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema file could not be read.
    #[error("IO error reading schema: {0}")]
    Io(#[from] std::io::Error),

    /// The schema document is not valid TOML or has the wrong shape.
    #[error("Schema parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// No entity type is declared for the namespace/name pair.
    #[error("Unknown entity type: {namespace}.{name}")]
    UnknownEntity { namespace: String, name: String },

    /// Two entity types differ only by case.
    #[error("Entity types {first} and {second} differ only by case")]
    EntityCaseCollision { first: EntityType, second: EntityType },

    /// Two fields or reverse accessors of one entity differ only by case.
    #[error("Fields '{first}' and '{second}' on {entity} differ only by case")]
    FieldCaseCollision {
        entity: EntityType,
        first: String,
        second: String,
    },

    /// A relation field does not declare its target entity type.
    #[error("Field '{field}' on {entity} is a relation but has no target")]
    MissingTarget { entity: EntityType, field: String },

    /// A relation points at an entity type the schema does not declare.
    #[error("Field '{field}' on {entity} targets undeclared entity {target}")]
    UndeclaredTarget {
        entity: EntityType,
        field: String,
        target: EntityType,
    },

    /// A reverse accessor names a back-reference field missing on its target.
    #[error("Reverse accessor '{accessor}' on {entity}: {target} has no field '{field}'")]
    InvalidReverse {
        entity: EntityType,
        accessor: String,
        target: EntityType,
        field: String,
    },
}

/// Errors reported by a [`crate::Store`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The schema handed to the store is inconsistent.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The entity type is not part of the store's schema.
    #[error("Unknown entity type: {0}")]
    UnknownEntity(EntityType),

    /// A write referenced a field the entity type does not declare.
    #[error("Unknown field '{field}' on {entity}")]
    UnknownField { entity: EntityType, field: String },

    /// A field used as a collection is not declared as one.
    #[error("Field '{field}' on {entity} is not a collection")]
    NotCollection { entity: EntityType, field: String },

    /// A reference column names an instance that does not exist.
    #[error("Field '{field}' on {entity} references missing {target} {id}")]
    DanglingReference {
        entity: EntityType,
        field: String,
        target: EntityType,
        id: String,
    },

    /// An instance addressed by id does not exist.
    #[error("Instance not found: {entity} {id}")]
    NotFound { entity: EntityType, id: String },

    /// A lookup by field matched more than one instance.
    #[error("Ambiguous lookup: {entity}.{field} = '{value}' matched {count} instances")]
    Ambiguous {
        entity: EntityType,
        field: String,
        value: String,
        count: usize,
    },

    /// Backend-specific failure (SQL error, I/O, ...).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
