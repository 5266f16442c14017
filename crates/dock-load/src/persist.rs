//! Persister: write one record, then its deferred relations.

use dock_config::LookupConfig;
use dock_core::{EntityType, Instance, Record, Store, Value};
use serde::Serialize;

use crate::error::{LoadError, PersistError};
use crate::resolve::{Pending, Prepared, Resolver};

/// Whether a save created a new instance or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Created,
    Updated,
}

/// The persisted owner instance and how it got there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Saved {
    pub instance: Instance,
    pub outcome: Outcome,
}

/// Writes records into a store; handed to every save strategy.
pub struct Persister<'a> {
    store: &'a mut dyn Store,
    lookup: &'a LookupConfig,
}

impl<'a> Persister<'a> {
    pub const fn new(store: &'a mut dyn Store, lookup: &'a LookupConfig) -> Self {
        Self { store, lookup }
    }

    #[must_use]
    pub fn store(&self) -> &dyn Store {
        &*self.store
    }

    #[must_use]
    pub const fn lookup(&self) -> &LookupConfig {
        self.lookup
    }

    /// Resolve (when `prepare` is set) and persist one record.
    ///
    /// A non-empty identity field turns the save into an update of that
    /// instance; otherwise a new instance is created. Collection members are
    /// attached and reverse-side records created afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::IdentityNotFound`] if the identity matches no
    /// instance, a resolution error from preparation, or a store error.
    pub fn save_base(
        &mut self,
        entity: &EntityType,
        record: &Record,
        prepare: bool,
    ) -> Result<Saved, LoadError> {
        let Prepared { mut fields, pending } = if prepare {
            Resolver::new(self.lookup).prepare(&*self.store, entity, record)?
        } else {
            Prepared::plain(record)
        };

        let identity = fields
            .remove(&self.lookup.identity_field)
            .and_then(|value| value.as_text().map(str::to_string))
            .filter(|id| !id.is_empty());

        let (instance, outcome) = if let Some(id) = identity {
            let current = self
                .store
                .get(entity, &id)?
                .ok_or_else(|| PersistError::IdentityNotFound {
                    entity: entity.clone(),
                    id: id.clone(),
                })?;
            (self.store.update(&current, &fields)?, Outcome::Updated)
        } else {
            (self.store.create(entity, &fields)?, Outcome::Created)
        };

        tracing::debug!(entity = %entity, id = %instance.id, outcome = ?outcome, "saved record");

        if pending.is_empty() {
            return Ok(Saved { instance, outcome });
        }

        self.attach(&instance, pending)?;
        let instance = self.store.get(entity, &instance.id)?.unwrap_or(instance);
        Ok(Saved { instance, outcome })
    }

    fn attach(&mut self, owner: &Instance, pending: Vec<Pending>) -> Result<(), LoadError> {
        for work in pending {
            match work {
                Pending::Collection { field, members } => {
                    self.store.add_to_collection(owner, &field, &members)?;
                }
                Pending::Reverse {
                    target,
                    back_field,
                    value_field,
                    values,
                } => {
                    for value in values {
                        let record = Record::from([(value_field.clone(), value)]);
                        let Prepared {
                            mut fields,
                            pending,
                        } = Resolver::new(self.lookup).prepare(&*self.store, &target, &record)?;
                        fields.insert(back_field.clone(), Value::Ref(owner.reference()));

                        let related = self.store.create(&target, &fields)?;
                        tracing::debug!(entity = %target, id = %related.id, owner = %owner.id, "created reverse record");
                        self.attach(&related, pending)?;
                    }
                }
            }
        }
        Ok(())
    }
}
