//! Persistent `DuckDB` store.
//!
//! Layout, derived from the schema on open:
//! - one table per entity type, `"{namespace}__{name}"` (lowercased), with an
//!   `id VARCHAR PRIMARY KEY` column and one `VARCHAR` column per scalar or
//!   single-valued reference field (references store the target id);
//! - one link table per collection field, `"{table}__{field}"`, holding
//!   `(owner_id, member_id)` pairs;
//! - a single `dock_ids` sequence that hands out instance ids.
//!
//! All DDL is `IF NOT EXISTS`, so re-opening an existing file is a no-op.

use dock_core::{
    EntitySchema, EntityType, FieldKind, Fields, Instance, Reference, Schema, Store, StoreError,
    Value,
};
use duckdb::{Connection, params, params_from_iter};

use crate::fields;
use crate::memory::ID_FIELD;

const CREATE_SEQUENCE: &str = "CREATE SEQUENCE IF NOT EXISTS dock_ids START 1";

/// Quote an identifier for use in SQL.
fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn table_name(entity: &EntityType) -> String {
    format!("{}__{}", entity.namespace(), entity.name()).to_lowercase()
}

fn link_table_name(entity: &EntityType, field: &str) -> String {
    format!("{}__{}", table_name(entity), field.to_lowercase())
}

fn backend(error: duckdb::Error) -> StoreError {
    StoreError::Other(error.into())
}

/// Single-valued columns of an entity table, in schema order.
fn columns(declared: &EntitySchema) -> Vec<(&str, FieldKind, Option<&EntityType>)> {
    declared
        .fields
        .iter()
        .filter(|(_, def)| !def.kind.is_collection())
        .map(|(name, def)| (name.as_str(), def.kind, def.target.as_ref()))
        .collect()
}

/// `DuckDB`-backed store.
pub struct DuckStore {
    conn: Connection,
    schema: Schema,
}

impl DuckStore {
    /// Open or create a `DuckDB` file and create tables for `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Schema`] for an inconsistent schema, or a backend
    /// error if the file cannot be opened or DDL fails.
    pub fn open_local(path: &str, schema: Schema) -> Result<Self, StoreError> {
        schema.validate()?;
        let conn = Connection::open(path).map_err(backend)?;
        let store = Self { conn, schema };
        store.init_schema().map_err(backend)?;
        tracing::debug!(path, "opened duckdb store");
        Ok(store)
    }

    /// Open an in-memory store (for testing and dry runs).
    ///
    /// # Errors
    ///
    /// As [`DuckStore::open_local`].
    pub fn open_in_memory(schema: Schema) -> Result<Self, StoreError> {
        schema.validate()?;
        let conn = Connection::open_in_memory().map_err(backend)?;
        let store = Self { conn, schema };
        store.init_schema().map_err(backend)?;
        Ok(store)
    }

    /// Access the underlying `DuckDB` connection.
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Number of rows stored for `entity`.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the table is missing.
    pub fn count(&self, entity: &EntityType) -> Result<usize, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote(&table_name(entity)));
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(backend)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn init_schema(&self) -> duckdb::Result<()> {
        self.conn.execute_batch(CREATE_SEQUENCE)?;
        for (entity, declared) in self.schema.entities() {
            let mut ddl = format!(
                "CREATE TABLE IF NOT EXISTS {} ({} VARCHAR PRIMARY KEY",
                quote(&table_name(entity)),
                quote(ID_FIELD)
            );
            for (name, _, _) in columns(declared) {
                ddl.push_str(", ");
                ddl.push_str(&quote(name));
                ddl.push_str(" VARCHAR");
            }
            ddl.push(')');
            self.conn.execute_batch(&ddl)?;

            for (name, def) in &declared.fields {
                if def.kind.is_collection() {
                    self.conn.execute_batch(&format!(
                        "CREATE TABLE IF NOT EXISTS {} (
                            owner_id VARCHAR NOT NULL,
                            member_id VARCHAR NOT NULL,
                            PRIMARY KEY (owner_id, member_id)
                        )",
                        quote(&link_table_name(entity, name))
                    ))?;
                }
            }
        }
        Ok(())
    }

    fn declared(&self, entity: &EntityType) -> Result<&EntitySchema, StoreError> {
        self.schema
            .entity(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.clone()))
    }

    fn next_id(&self) -> duckdb::Result<String> {
        let id: i64 = self
            .conn
            .query_row("SELECT nextval('dock_ids')", [], |row| row.get(0))?;
        Ok(id.to_string())
    }

    /// Load one row plus its collection members.
    fn load(&self, entity: &EntityType, id: &str) -> Result<Option<Instance>, StoreError> {
        let declared = self.declared(entity)?;
        let cols = columns(declared);

        let select = std::iter::once(quote(ID_FIELD))
            .chain(cols.iter().map(|(name, _, _)| quote(name)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {select} FROM {} WHERE {} = ?",
            quote(&table_name(entity)),
            quote(ID_FIELD)
        );

        let mut stmt = self.conn.prepare(&sql).map_err(backend)?;
        let mut rows = stmt.query(params![id]).map_err(backend)?;
        let Some(row) = rows.next().map_err(backend)? else {
            return Ok(None);
        };

        let mut fields = Fields::new();
        for (index, (name, kind, target)) in cols.iter().enumerate() {
            let raw: Option<String> = row.get(index + 1).map_err(backend)?;
            let Some(raw) = raw else { continue };
            let value = match (kind, target) {
                (FieldKind::Scalar, _) | (_, None) => Value::Text(raw),
                (_, Some(target)) => Value::Ref(Reference {
                    entity: (*target).clone(),
                    id: raw,
                }),
            };
            fields.insert((*name).to_string(), value);
        }

        for (name, def) in &declared.fields {
            let (true, Some(target)) = (def.kind.is_collection(), def.target.as_ref()) else {
                continue;
            };
            let sql = format!(
                "SELECT member_id FROM {} WHERE owner_id = ? ORDER BY rowid",
                quote(&link_table_name(entity, name))
            );
            let mut stmt = self.conn.prepare(&sql).map_err(backend)?;
            let members = stmt
                .query_map(params![id], |row| row.get::<_, String>(0))
                .map_err(backend)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(backend)?;
            if !members.is_empty() {
                let refs = members
                    .into_iter()
                    .map(|id| Reference {
                        entity: target.clone(),
                        id,
                    })
                    .collect();
                fields.insert(name.clone(), Value::Refs(refs));
            }
        }

        Ok(Some(Instance {
            entity: entity.clone(),
            id: id.to_string(),
            fields,
        }))
    }

    /// Column names and text values for a write.
    ///
    /// Fields are bound first, so reference columns only ever hold ids of
    /// existing target instances.
    fn column_values(
        &self,
        entity: &EntityType,
        fields: &Fields,
    ) -> Result<(Vec<String>, Vec<String>), StoreError> {
        let bound = fields::bind(self.declared(entity)?, entity, fields, |target, id| {
            Ok(self.load(target, id)?.is_some())
        })?;
        let mut names = Vec::with_capacity(bound.len());
        let mut values = Vec::with_capacity(bound.len());
        for (name, value) in &bound {
            if let Some(text) = value.column_text() {
                names.push(quote(name));
                values.push(text.to_string());
            }
        }
        Ok((names, values))
    }
}

impl Store for DuckStore {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn get(&self, entity: &EntityType, id: &str) -> Result<Option<Instance>, StoreError> {
        self.load(entity, id)
    }

    fn find(
        &self,
        entity: &EntityType,
        field: &str,
        value: &str,
    ) -> Result<Option<Instance>, StoreError> {
        if field == ID_FIELD {
            return self.load(entity, value);
        }

        let declared = self.declared(entity)?;
        if !declared
            .field(field)
            .is_some_and(|def| !def.kind.is_collection())
        {
            return Ok(None);
        }

        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?",
            quote(ID_FIELD),
            quote(&table_name(entity)),
            quote(field)
        );
        let mut stmt = self.conn.prepare(&sql).map_err(backend)?;
        let ids = stmt
            .query_map(params![value], |row| row.get::<_, String>(0))
            .map_err(backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(backend)?;

        match ids.as_slice() {
            [] => Ok(None),
            [id] => self.load(entity, id),
            many => Err(StoreError::Ambiguous {
                entity: entity.clone(),
                field: field.to_string(),
                value: value.to_string(),
                count: many.len(),
            }),
        }
    }

    fn create(&mut self, entity: &EntityType, fields: &Fields) -> Result<Instance, StoreError> {
        let (mut names, mut values) = self.column_values(entity, fields)?;
        let id = self.next_id().map_err(backend)?;
        names.insert(0, quote(ID_FIELD));
        values.insert(0, id.clone());

        let placeholders = vec!["?"; names.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            quote(&table_name(entity)),
            names.join(", ")
        );
        self.conn
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(backend)?;

        self.load(entity, &id)?.ok_or_else(|| StoreError::NotFound {
            entity: entity.clone(),
            id,
        })
    }

    fn update(&mut self, instance: &Instance, fields: &Fields) -> Result<Instance, StoreError> {
        let entity = &instance.entity;
        let (names, mut values) = self.column_values(entity, fields)?;

        if !names.is_empty() {
            let assignments = names
                .iter()
                .map(|name| format!("{name} = ?"))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "UPDATE {} SET {assignments} WHERE {} = ?",
                quote(&table_name(entity)),
                quote(ID_FIELD)
            );
            values.push(instance.id.clone());
            self.conn
                .execute(&sql, params_from_iter(values.iter()))
                .map_err(backend)?;
        }

        self.load(entity, &instance.id)?
            .ok_or_else(|| StoreError::NotFound {
                entity: entity.clone(),
                id: instance.id.clone(),
            })
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

        let sql = format!(
            "INSERT OR IGNORE INTO {} (owner_id, member_id) VALUES (?, ?)",
            quote(&link_table_name(&instance.entity, field))
        );
        let mut stmt = self.conn.prepare(&sql).map_err(backend)?;
        for member in members {
            stmt.execute(params![instance.id, member.id])
                .map_err(backend)?;
        }
        Ok(())
    }
}
