//! Declarative per-entity save overrides.

use std::collections::BTreeMap;

use dock_core::EntityType;
use serde::{Deserialize, Serialize};

const fn default_prepare() -> bool {
    true
}

/// Pre-processing applied to every record of one entity type before it is
/// saved.
///
/// ```toml
/// [[overrides]]
/// entity = "library.Book"
/// rename = { writer = "author" }
/// defaults = { status = "draft" }
/// drop = ["notes"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OverrideConfig {
    pub entity: EntityType,

    /// Field renames, old name to new name.
    #[serde(default)]
    pub rename: BTreeMap<String, String>,

    /// Values injected when the record does not provide the field.
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,

    /// Fields removed before saving.
    #[serde(default)]
    pub drop: Vec<String>,

    /// When false, relation resolution is skipped for this entity type.
    #[serde(default = "default_prepare")]
    pub prepare: bool,
}
