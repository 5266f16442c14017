//! In-process store.

use std::collections::BTreeMap;

use dock_core::{
    EntitySchema, EntityType, Fields, Instance, Reference, Schema, Store, StoreError, Value,
};

use crate::fields;

/// Identity column every store exposes for lookups.
pub const ID_FIELD: &str = "id";

#[derive(Debug, Default)]
struct Table {
    next_id: u64,
    rows: Vec<Instance>,
}

/// Ordered in-memory tables with sequential string ids per entity type.
#[derive(Debug)]
pub struct MemoryStore {
    schema: Schema,
    tables: BTreeMap<EntityType, Table>,
}

impl MemoryStore {
    /// Create an empty store for `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Schema`] if the schema is inconsistent.
    pub fn new(schema: Schema) -> Result<Self, StoreError> {
        schema.validate()?;
        let tables = schema
            .entities()
            .map(|(entity, _)| (entity.clone(), Table::default()))
            .collect();
        Ok(Self { schema, tables })
    }

    /// All instances of `entity`, in creation order.
    #[must_use]
    pub fn instances(&self, entity: &EntityType) -> &[Instance] {
        self.tables.get(entity).map_or(&[], |table| &table.rows)
    }

    #[must_use]
    pub fn count(&self, entity: &EntityType) -> usize {
        self.instances(entity).len()
    }

    fn bind(&self, entity: &EntityType, fields: &Fields) -> Result<Fields, StoreError> {
        fields::bind(self.declared(entity)?, entity, fields, |target, id| {
            Ok(self.get(target, id)?.is_some())
        })
    }

    fn declared(&self, entity: &EntityType) -> Result<&EntitySchema, StoreError> {
        self.schema
            .entity(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.clone()))
    }

    fn table_mut(&mut self, entity: &EntityType) -> Result<&mut Table, StoreError> {
        self.tables
            .get_mut(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.clone()))
    }

    fn row_mut(&mut self, entity: &EntityType, id: &str) -> Result<&mut Instance, StoreError> {
        self.table_mut(entity)?
            .rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| StoreError::NotFound {
                entity: entity.clone(),
                id: id.to_string(),
            })
    }
}

/// Every written field must be declared and single-valued.
impl Store for MemoryStore {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn get(&self, entity: &EntityType, id: &str) -> Result<Option<Instance>, StoreError> {
        self.declared(entity)?;
        Ok(self
            .instances(entity)
            .iter()
            .find(|row| row.id == id)
            .cloned())
    }

    fn find(
        &self,
        entity: &EntityType,
        field: &str,
        value: &str,
    ) -> Result<Option<Instance>, StoreError> {
        if field == ID_FIELD {
            return self.get(entity, value);
        }

        let declared = self.declared(entity)?;
        match declared.field(field) {
            Some(def) if !def.kind.is_collection() => {}
            _ => return Ok(None),
        }

        let mut matches = self
            .instances(entity)
            .iter()
            .filter(|row| row.fields.get(field).and_then(Value::column_text) == Some(value));

        let Some(first) = matches.next() else {
            return Ok(None);
        };
        let extra = matches.count();
        if extra > 0 {
            return Err(StoreError::Ambiguous {
                entity: entity.clone(),
                field: field.to_string(),
                value: value.to_string(),
                count: extra + 1,
            });
        }
        Ok(Some(first.clone()))
    }

    fn create(&mut self, entity: &EntityType, fields: &Fields) -> Result<Instance, StoreError> {
        let fields = self.bind(entity, fields)?;

        let table = self.table_mut(entity)?;
        table.next_id += 1;
        let instance = Instance {
            entity: entity.clone(),
            id: table.next_id.to_string(),
            fields,
        };
        table.rows.push(instance.clone());
        Ok(instance)
    }

    fn update(&mut self, instance: &Instance, fields: &Fields) -> Result<Instance, StoreError> {
        let fields = self.bind(&instance.entity, fields)?;

        let row = self.row_mut(&instance.entity, &instance.id)?;
        row.fields.extend(fields);
        Ok(row.clone())
    }

    fn add_to_collection(
        &mut self,
        instance: &Instance,
        field: &str,
        members: &[Instance],
    ) -> Result<(), StoreError> {
        let is_collection = self
            .declared(&instance.entity)?
            .field(field)
            .is_some_and(|def| def.kind.is_collection());
        if !is_collection {
            return Err(StoreError::NotCollection {
                entity: instance.entity.clone(),
                field: field.to_string(),
            });
        }

        let row = self.row_mut(&instance.entity, &instance.id)?;
        let slot = row
            .fields
            .entry(field.to_string())
            .or_insert_with(|| Value::Refs(Vec::new()));
        if let Value::Refs(existing) = slot {
            for member in members.iter().map(Instance::reference) {
                if !existing.contains(&member) {
                    existing.push(member);
                }
            }
        } else {
            *slot = Value::Refs(members.iter().map(Instance::reference).collect::<Vec<Reference>>());
        }
        Ok(())
    }
}
