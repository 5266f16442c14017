//! # dock-core
//!
//! Core types and error types for dock.
//!
//! This crate provides the foundational types shared across all dock crates:
//! - Entity type identifiers, raw records, and persisted instances
//! - The statically declared schema and its relation introspection
//! - The [`Store`] trait that persistence backends implement
//! - Cross-cutting error types

pub mod entity;
pub mod errors;
pub mod schema;
pub mod store;

pub use entity::{EntityType, Fields, Instance, Record, Reference, Value};
pub use errors::{CoreError, SchemaError, StoreError};
pub use schema::{EntitySchema, FieldDef, FieldKind, Relation, ReverseDef, Schema};
pub use store::Store;
