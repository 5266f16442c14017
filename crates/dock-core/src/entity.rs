//! Entity type identifiers, raw records, and persisted instances.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A raw record: canonical field name to non-empty text value.
///
/// Absence of a key is how "not provided" is represented; records never
/// carry empty strings.
pub type Record = BTreeMap<String, String>;

/// Field values handed to a store on create/update, and read back from it.
pub type Fields = BTreeMap<String, Value>;

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Identifies an entity type as `namespace.Name`.
///
/// The namespace is the module that owns the type (the parent directory of a
/// data file); the name is the type itself (the title-cased file stem).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityType {
    namespace: String,
    name: String,
}

impl EntityType {
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive match against a namespace/name pair.
    #[must_use]
    pub fn matches(&self, namespace: &str, name: &str) -> bool {
        self.namespace.eq_ignore_ascii_case(namespace) && self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

impl FromStr for EntityType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((namespace, name))
                if !namespace.is_empty() && !name.is_empty() && !name.contains('.') =>
            {
                Ok(Self::new(namespace, name))
            }
            _ => Err(CoreError::InvalidEntityType(s.to_string())),
        }
    }
}

impl TryFrom<String> for EntityType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntityType> for String {
    fn from(value: EntityType) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Instances
// ---------------------------------------------------------------------------

/// A pointer to a persisted instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub entity: EntityType,
    pub id: String,
}

/// A field value as seen by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Ref(Reference),
    Refs(Vec<Reference>),
}

impl Value {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Ref(_) | Self::Refs(_) => None,
        }
    }

    #[must_use]
    pub const fn as_reference(&self) -> Option<&Reference> {
        match self {
            Self::Ref(reference) => Some(reference),
            Self::Text(_) | Self::Refs(_) => None,
        }
    }

    /// Text stored in a column: the text itself, or the id a reference holds.
    #[must_use]
    pub fn column_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Ref(reference) => Some(&reference.id),
            Self::Refs(_) => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Reference> for Value {
    fn from(value: Reference) -> Self {
        Self::Ref(value)
    }
}

/// A persisted instance, owned by the store; callers hold copies only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub entity: EntityType,
    pub id: String,
    pub fields: Fields,
}

impl Instance {
    #[must_use]
    pub fn reference(&self) -> Reference {
        Reference {
            entity: self.entity.clone(),
            id: self.id.clone(),
        }
    }

    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_text)
    }

    #[must_use]
    pub fn reference_of(&self, field: &str) -> Option<&Reference> {
        self.fields.get(field).and_then(Value::as_reference)
    }

    /// Members of a collection field, empty when nothing was attached.
    #[must_use]
    pub fn members(&self, field: &str) -> &[Reference] {
        match self.fields.get(field) {
            Some(Value::Refs(members)) => members,
            _ => &[],
        }
    }
}
