//! The persistence collaborator.

use crate::entity::{EntityType, Fields, Instance};
use crate::errors::StoreError;
use crate::schema::Schema;

/// A persistence backend the loader writes into.
///
/// Lookups that miss return `Ok(None)` rather than an error, so callers can
/// walk an ordered list of candidate fields without using errors for control
/// flow. Writes take `&mut self`; the loader is single-threaded.
pub trait Store {
    /// The schema describing every entity type this store holds.
    fn schema(&self) -> &Schema;

    /// Fetch an instance by identity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownEntity`] for undeclared types, or a
    /// backend error.
    fn get(&self, entity: &EntityType, id: &str) -> Result<Option<Instance>, StoreError>;

    /// Fetch the single instance whose `field` equals `value`.
    ///
    /// A field the entity type does not declare yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Ambiguous`] when more than one instance matches.
    fn find(
        &self,
        entity: &EntityType,
        field: &str,
        value: &str,
    ) -> Result<Option<Instance>, StoreError>;

    /// Create a new instance from already-resolved fields.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownField`] for undeclared or collection
    /// fields, or a backend error.
    fn create(&mut self, entity: &EntityType, fields: &Fields) -> Result<Instance, StoreError>;

    /// Overwrite the given fields of an existing instance.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the instance vanished, or as
    /// [`Store::create`].
    fn update(&mut self, instance: &Instance, fields: &Fields) -> Result<Instance, StoreError>;

    /// Attach `members` to the collection `field` of `instance`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotCollection`] when `field` is not many-valued.
    fn add_to_collection(
        &mut self,
        instance: &Instance,
        field: &str,
        members: &[Instance],
    ) -> Result<(), StoreError>;
}
