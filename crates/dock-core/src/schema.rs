//! Statically declared schema and relation introspection.
//!
//! The schema is plain data, loaded from TOML:
//!
//! ```toml
//! [entities."library.Author"]
//! fields = { name = "scalar" }
//! reverse = { books = { target = "library.Book", field = "author" } }
//!
//! [entities."library.Book"]
//! fields = { title = "scalar", author = { kind = "foreign_key", target = "library.Author" } }
//! ```
//!
//! A field is either a bare kind (`"scalar"`) or a table with `kind` and
//! `target`. Reverse accessors name the inverse side of a relation declared
//! on another entity type.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entity::EntityType;
use crate::errors::SchemaError;

// ---------------------------------------------------------------------------
// FieldKind
// ---------------------------------------------------------------------------

/// Storage kind of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Scalar,
    ForeignKey,
    OneToOne,
    ManyToMany,
}

impl FieldKind {
    /// Every relation kind; the default set treated as direct references.
    pub const RELATIONS: &'static [Self] = &[Self::ForeignKey, Self::OneToOne, Self::ManyToMany];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::ForeignKey => "foreign_key",
            Self::OneToOne => "one_to_one",
            Self::ManyToMany => "many_to_many",
        }
    }

    /// Many-valued kinds are attached after the owning instance exists.
    #[must_use]
    pub const fn is_collection(self) -> bool {
        matches!(self, Self::ManyToMany)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// A declared field: its kind and, for relations, the target entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FieldSpec")]
pub struct FieldDef {
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<EntityType>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldSpec {
    Kind(FieldKind),
    Full {
        kind: FieldKind,
        #[serde(default)]
        target: Option<EntityType>,
    },
}

impl From<FieldSpec> for FieldDef {
    fn from(spec: FieldSpec) -> Self {
        match spec {
            FieldSpec::Kind(kind) => Self { kind, target: None },
            FieldSpec::Full { kind, target } => Self { kind, target },
        }
    }
}

/// An inverse accessor: records of `target` whose `field` points back here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseDef {
    pub target: EntityType,
    pub field: String,
}

/// Declared fields and reverse accessors of one entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDef>,
    #[serde(default)]
    pub reverse: BTreeMap<String, ReverseDef>,
}

impl EntitySchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn scalar(mut self, name: &str) -> Self {
        self.fields.insert(
            name.to_string(),
            FieldDef {
                kind: FieldKind::Scalar,
                target: None,
            },
        );
        self
    }

    #[must_use]
    pub fn relation(mut self, name: &str, kind: FieldKind, target: &EntityType) -> Self {
        self.fields.insert(
            name.to_string(),
            FieldDef {
                kind,
                target: Some(target.clone()),
            },
        );
        self
    }

    #[must_use]
    pub fn reverse(mut self, accessor: &str, target: &EntityType, field: &str) -> Self {
        self.reverse.insert(
            accessor.to_string(),
            ReverseDef {
                target: target.clone(),
                field: field.to_string(),
            },
        );
        self
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }
}

// ---------------------------------------------------------------------------
// Relation
// ---------------------------------------------------------------------------

/// What a field means for resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    /// Stored as given.
    Plain,
    /// Single-valued reference, substituted before the owner is persisted.
    Direct(EntityType),
    /// Many-valued reference, attached after the owner is persisted.
    Collection(EntityType),
    /// Inverse side: `target` records are created with `back_field` set to the owner.
    Reverse {
        target: EntityType,
        back_field: String,
    },
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// The full schema: every entity type a store can hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    entities: BTreeMap<EntityType, EntitySchema>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entity(mut self, entity: EntityType, schema: EntitySchema) -> Self {
        self.entities.insert(entity, schema);
        self
    }

    /// Parse and validate a TOML schema document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Parse`] for malformed TOML, or a validation
    /// error from [`Schema::validate`].
    pub fn from_toml_str(source: &str) -> Result<Self, SchemaError> {
        let schema: Self = toml::from_str(source)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Read, parse, and validate a TOML schema file.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Io`] if the file cannot be read, otherwise as
    /// [`Schema::from_toml_str`].
    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Check that every relation target is declared and every reverse
    /// accessor names an existing back-reference field.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut entities: HashMap<(String, String), &EntityType> = HashMap::new();
        for entity in self.entities.keys() {
            let key = (
                entity.namespace().to_lowercase(),
                entity.name().to_lowercase(),
            );
            if let Some(first) = entities.insert(key, entity) {
                return Err(SchemaError::EntityCaseCollision {
                    first: first.clone(),
                    second: entity.clone(),
                });
            }
        }

        for (entity, declared) in &self.entities {
            let mut names: HashMap<String, &str> = HashMap::new();
            for name in declared.fields.keys().chain(declared.reverse.keys()) {
                if let Some(first) = names.insert(name.to_lowercase(), name) {
                    return Err(SchemaError::FieldCaseCollision {
                        entity: entity.clone(),
                        first: first.to_string(),
                        second: name.clone(),
                    });
                }
            }

            for (name, field) in &declared.fields {
                if field.kind == FieldKind::Scalar {
                    continue;
                }
                let target = field.target.as_ref().ok_or_else(|| SchemaError::MissingTarget {
                    entity: entity.clone(),
                    field: name.clone(),
                })?;
                if !self.entities.contains_key(target) {
                    return Err(SchemaError::UndeclaredTarget {
                        entity: entity.clone(),
                        field: name.clone(),
                        target: target.clone(),
                    });
                }
            }

            for (accessor, reverse) in &declared.reverse {
                let target = self.entities.get(&reverse.target).ok_or_else(|| {
                    SchemaError::UndeclaredTarget {
                        entity: entity.clone(),
                        field: accessor.clone(),
                        target: reverse.target.clone(),
                    }
                })?;
                if !target.fields.contains_key(&reverse.field) {
                    return Err(SchemaError::InvalidReverse {
                        entity: entity.clone(),
                        accessor: accessor.clone(),
                        target: reverse.target.clone(),
                        field: reverse.field.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn entity(&self, entity: &EntityType) -> Option<&EntitySchema> {
        self.entities.get(entity)
    }

    pub fn entities(&self) -> impl Iterator<Item = (&EntityType, &EntitySchema)> {
        self.entities.iter()
    }

    /// Resolve a namespace/name pair (case-insensitive) to a declared type.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownEntity`] when nothing matches.
    pub fn entity_type(&self, namespace: &str, name: &str) -> Result<EntityType, SchemaError> {
        self.entities
            .keys()
            .find(|entity| entity.matches(namespace, name))
            .cloned()
            .ok_or_else(|| SchemaError::UnknownEntity {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    /// Introspect `field` on `entity`.
    ///
    /// Declared fields whose kind is not in `direct_kinds` are plain. A name
    /// that is not a declared field may still be a reverse accessor. Returns
    /// `None` when the field is neither, or the entity type is unknown.
    #[must_use]
    pub fn relation(
        &self,
        entity: &EntityType,
        field: &str,
        direct_kinds: &[FieldKind],
    ) -> Option<Relation> {
        let declared = self.entities.get(entity)?;

        if let Some(def) = declared.fields.get(field) {
            if def.kind == FieldKind::Scalar || !direct_kinds.contains(&def.kind) {
                return Some(Relation::Plain);
            }
            let target = def.target.clone()?;
            return Some(if def.kind.is_collection() {
                Relation::Collection(target)
            } else {
                Relation::Direct(target)
            });
        }

        declared.reverse.get(field).map(|reverse| Relation::Reverse {
            target: reverse.target.clone(),
            back_field: reverse.field.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const LIBRARY: &str = r#"
[entities."geo.Country"]
fields = { code = "scalar", name = "scalar" }

[entities."library.Author"]
fields = { name = "scalar", country = { kind = "foreign_key", target = "geo.Country" } }
reverse = { books = { target = "library.Book", field = "author" } }

[entities."library.Book"]
fields.title = "scalar"
fields.author = { kind = "foreign_key", target = "library.Author" }
fields.tags = { kind = "many_to_many", target = "library.Tag" }

[entities."library.Tag"]
fields = { slug = "scalar" }
"#;

    fn library() -> Schema {
        Schema::from_toml_str(LIBRARY).expect("schema should parse")
    }

    #[test]
    fn parses_bare_and_table_fields() {
        let schema = library();
        let book = schema
            .entity(&EntityType::new("library", "Book"))
            .expect("book declared");

        assert_eq!(book.field("title").map(|f| f.kind), Some(FieldKind::Scalar));
        let author = book.field("author").expect("author declared");
        assert_eq!(author.kind, FieldKind::ForeignKey);
        assert_eq!(author.target, Some(EntityType::new("library", "Author")));
    }

    #[rstest]
    #[case("title", Some(Relation::Plain))]
    #[case("author", Some(Relation::Direct(EntityType::new("library", "Author"))))]
    #[case("tags", Some(Relation::Collection(EntityType::new("library", "Tag"))))]
    #[case("publisher", None)]
    fn introspects_book_fields(#[case] field: &str, #[case] expected: Option<Relation>) {
        let schema = library();
        let book = EntityType::new("library", "Book");
        assert_eq!(schema.relation(&book, field, FieldKind::RELATIONS), expected);
    }

    #[test]
    fn reverse_accessor_is_discovered_when_not_a_field() {
        let schema = library();
        let author = EntityType::new("library", "Author");
        assert_eq!(
            schema.relation(&author, "books", FieldKind::RELATIONS),
            Some(Relation::Reverse {
                target: EntityType::new("library", "Book"),
                back_field: "author".into(),
            })
        );
    }

    #[test]
    fn kinds_outside_the_direct_set_are_plain() {
        let schema = library();
        let book = EntityType::new("library", "Book");
        assert_eq!(
            schema.relation(&book, "author", &[FieldKind::ManyToMany]),
            Some(Relation::Plain)
        );
    }

    #[test]
    fn entity_type_lookup_is_case_insensitive() {
        let schema = library();
        assert_eq!(
            schema.entity_type("Library", "BOOK").unwrap(),
            EntityType::new("library", "Book")
        );
        assert!(matches!(
            schema.entity_type("library", "Books"),
            Err(SchemaError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn rejects_relation_without_target() {
        let result = Schema::from_toml_str(
            r#"
[entities."library.Book"]
fields = { author = "foreign_key" }
"#,
        );
        assert!(matches!(result, Err(SchemaError::MissingTarget { .. })));
    }

    #[test]
    fn rejects_undeclared_target() {
        let result = Schema::from_toml_str(
            r#"
[entities."library.Book"]
fields = { author = { kind = "foreign_key", target = "library.Author" } }
"#,
        );
        assert!(matches!(result, Err(SchemaError::UndeclaredTarget { .. })));
    }

    #[test]
    fn rejects_reverse_without_back_field() {
        let result = Schema::from_toml_str(
            r#"
[entities."library.Author"]
reverse = { books = { target = "library.Book", field = "writer" } }

[entities."library.Book"]
fields = { title = "scalar" }
"#,
        );
        assert!(matches!(result, Err(SchemaError::InvalidReverse { .. })));
    }

    #[test]
    fn rejects_entity_types_differing_only_by_case() {
        let result = Schema::from_toml_str(
            r#"
[entities."library.Book"]
fields = { title = "scalar" }

[entities."Library.book"]
fields = { title = "scalar" }
"#,
        );
        assert!(matches!(result, Err(SchemaError::EntityCaseCollision { .. })));
    }

    #[rstest]
    #[case(EntitySchema::new().scalar("title").scalar("Title"))]
    #[case(EntitySchema::new().scalar("books").reverse("books", &EntityType::new("library", "Book"), "title"))]
    fn rejects_fields_differing_only_by_case(#[case] declared: EntitySchema) {
        let schema = Schema::new().with_entity(EntityType::new("library", "Book"), declared);
        assert!(matches!(
            schema.validate(),
            Err(SchemaError::FieldCaseCollision { .. })
        ));
    }

    #[test]
    fn builder_matches_parsed_schema() {
        let country = EntityType::new("geo", "Country");
        let built = Schema::new()
            .with_entity(country.clone(), EntitySchema::new().scalar("code"))
            .with_entity(
                EntityType::new("geo", "City"),
                EntitySchema::new()
                    .scalar("name")
                    .relation("country", FieldKind::ForeignKey, &country),
            );
        let parsed = Schema::from_toml_str(
            r#"
[entities."geo.Country"]
fields = { code = "scalar" }

[entities."geo.City"]
fields = { name = "scalar", country = { kind = "foreign_key", target = "geo.Country" } }
"#,
        )
        .unwrap();
        assert_eq!(built, parsed);
    }
}
