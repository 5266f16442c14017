//! Reference Resolver: turn a raw record into store-ready fields.
//!
//! Each header may carry lookup arguments after the header-argument
//! separator (`author|code`, `tags|slug;name`). Those fields are tried first
//! for that header only, followed by the configured lookup fields. The
//! configuration itself is never changed.
//!
//! Single-valued references are substituted before the owner is written.
//! Collection members and reverse-side records need the owner to exist, so
//! they come back as [`Pending`] work for the persister.

use dock_config::LookupConfig;
use dock_core::{EntityType, Fields, Instance, Record, Relation, Store, StoreError, Value};

use crate::error::{LoadError, PersistError, ResolutionError};

/// Work that can only happen once the owning instance exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
    /// Attach already-resolved instances to a many-valued field.
    Collection {
        field: String,
        members: Vec<Instance>,
    },
    /// Create one `target` record per value, pointing back at the owner.
    Reverse {
        target: EntityType,
        back_field: String,
        value_field: String,
        values: Vec<String>,
    },
}

/// A record ready for the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prepared {
    pub fields: Fields,
    pub pending: Vec<Pending>,
}

impl Prepared {
    /// Take a record as-is, with no relation handling.
    #[must_use]
    pub fn plain(record: &Record) -> Self {
        Self {
            fields: record
                .iter()
                .map(|(name, value)| (name.clone(), Value::Text(value.clone())))
                .collect(),
            pending: Vec::new(),
        }
    }
}

/// Resolves relation fields against a store using a lookup configuration.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'c> {
    lookup: &'c LookupConfig,
}

impl<'c> Resolver<'c> {
    #[must_use]
    pub const fn new(lookup: &'c LookupConfig) -> Self {
        Self { lookup }
    }

    /// Split a header into its field name and lookup arguments.
    #[must_use]
    pub fn split_header<'h>(&self, header: &'h str) -> (&'h str, Vec<&'h str>) {
        match header.split_once(self.lookup.header_args_separator.as_str()) {
            Some((field, args)) => (field, self.split_values(args)),
            None => (header, Vec::new()),
        }
    }

    /// Split a cell or argument list on the field-argument separator.
    ///
    /// Parts are trimmed and empty parts dropped.
    #[must_use]
    pub fn split_values<'v>(&self, value: &'v str) -> Vec<&'v str> {
        value
            .split(self.lookup.field_args_separator.as_str())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect()
    }

    /// Lookup fields for one header: its arguments first, then the
    /// configured fields not already listed.
    #[must_use]
    pub fn lookup_order<'a>(&'a self, header_args: &[&'a str]) -> Vec<&'a str> {
        let mut order: Vec<&str> = Vec::with_capacity(header_args.len() + self.lookup.fields.len());
        for field in header_args
            .iter()
            .copied()
            .chain(self.lookup.fields.iter().map(String::as_str))
        {
            if !order.contains(&field) {
                order.push(field);
            }
        }
        order
    }

    /// Find the instance of `target` that `value` refers to, trying each
    /// lookup field in order and stopping at the first match.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::NotFound`] when no field matches and
    /// [`ResolutionError::Ambiguous`] when a field matches several instances.
    pub fn lookup(
        &self,
        store: &dyn Store,
        target: &EntityType,
        lookups: &[&str],
        value: &str,
    ) -> Result<Instance, LoadError> {
        for field in lookups {
            match store.find(target, field, value) {
                Ok(Some(instance)) => {
                    tracing::trace!(entity = %target, field, value, id = %instance.id, "resolved reference");
                    return Ok(instance);
                }
                Ok(None) => {}
                Err(StoreError::Ambiguous { entity, field, value, .. }) => {
                    return Err(ResolutionError::Ambiguous {
                        entity,
                        field,
                        value,
                    }
                    .into());
                }
                Err(other) => return Err(PersistError::Store(other).into()),
            }
        }

        Err(ResolutionError::NotFound {
            entity: target.clone(),
            value: value.to_string(),
            lookups: lookups.iter().map(ToString::to_string).collect(),
        }
        .into())
    }

    /// Resolve every field of `record` for `entity`.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolutionError`] for unknown fields or unresolvable
    /// values, or a [`PersistError`] if the store fails during lookup.
    pub fn prepare(
        &self,
        store: &dyn Store,
        entity: &EntityType,
        record: &Record,
    ) -> Result<Prepared, LoadError> {
        let schema = store.schema();
        let mut prepared = Prepared::default();

        for (header, value) in record {
            let (field, args) = self.split_header(header);

            if field == self.lookup.identity_field {
                prepared.fields.insert(field.to_string(), Value::Text(value.clone()));
                continue;
            }

            let relation = schema
                .relation(entity, field, &self.lookup.direct_relation_kinds)
                .ok_or_else(|| {
                    let declared = schema
                        .entity(entity)
                        .is_some_and(|declared| declared.field(field).is_some());
                    if declared {
                        ResolutionError::MissingTarget {
                            entity: entity.clone(),
                            field: field.to_string(),
                        }
                    } else {
                        ResolutionError::UnknownField {
                            entity: entity.clone(),
                            field: field.to_string(),
                        }
                    }
                })?;

            match relation {
                Relation::Plain => {
                    prepared.fields.insert(field.to_string(), Value::Text(value.clone()));
                }
                Relation::Direct(target) => {
                    let lookups = self.lookup_order(&args);
                    let instance = self.lookup(store, &target, &lookups, value)?;
                    prepared
                        .fields
                        .insert(field.to_string(), Value::Ref(instance.reference()));
                }
                Relation::Collection(target) => {
                    let lookups = self.lookup_order(&args);
                    let members = self
                        .split_values(value)
                        .into_iter()
                        .map(|member| self.lookup(store, &target, &lookups, member))
                        .collect::<Result<Vec<_>, _>>()?;
                    prepared.pending.push(Pending::Collection {
                        field: field.to_string(),
                        members,
                    });
                }
                Relation::Reverse { target, back_field } => {
                    // The identity never names a new record.
                    let value_field = self
                        .lookup_order(&args)
                        .into_iter()
                        .find(|f| *f != self.lookup.identity_field)
                        .ok_or_else(|| ResolutionError::NoValueField {
                            entity: entity.clone(),
                            field: field.to_string(),
                        })?;
                    prepared.pending.push(Pending::Reverse {
                        target,
                        back_field,
                        value_field: value_field.to_string(),
                        values: self
                            .split_values(value)
                            .into_iter()
                            .map(str::to_string)
                            .collect(),
                    });
                }
            }
        }

        Ok(prepared)
    }
}
