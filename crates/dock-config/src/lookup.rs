//! Relation lookup configuration.

use dock_core::FieldKind;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default ordered lookup fields.
fn default_fields() -> Vec<String> {
    vec![String::from("id"), String::from("name")]
}

/// Default delimiter between a header and its lookup-field arguments.
fn default_header_args_separator() -> String {
    String::from("|")
}

/// Default delimiter between multiple values (and multiple header arguments).
fn default_field_args_separator() -> String {
    String::from(";")
}

/// Default identity attribute.
fn default_identity_field() -> String {
    String::from("id")
}

fn default_direct_relation_kinds() -> Vec<FieldKind> {
    FieldKind::RELATIONS.to_vec()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LookupConfig {
    /// Fields tried, in order, to resolve a textual relation value.
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,

    /// Marks an inline lookup-field override in a header (`tags|slug`).
    #[serde(default = "default_header_args_separator")]
    pub header_args_separator: String,

    /// Splits multi-valued cells (`red;green`) and multiple header arguments.
    #[serde(default = "default_field_args_separator")]
    pub field_args_separator: String,

    /// A non-empty value here turns a save into an update of that instance.
    #[serde(default = "default_identity_field")]
    pub identity_field: String,

    /// Schema field kinds treated as references rather than scalars.
    #[serde(default = "default_direct_relation_kinds")]
    pub direct_relation_kinds: Vec<FieldKind>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            fields: default_fields(),
            header_args_separator: default_header_args_separator(),
            field_args_separator: default_field_args_separator(),
            identity_field: default_identity_field(),
            direct_relation_kinds: default_direct_relation_kinds(),
        }
    }
}

impl LookupConfig {
    /// Reject settings the resolver cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fields.is_empty() || self.fields.iter().any(String::is_empty) {
            return Err(ConfigError::invalid(
                "lookup.fields",
                "at least one non-empty lookup field is required",
            ));
        }
        if self.header_args_separator.is_empty() {
            return Err(ConfigError::invalid(
                "lookup.header_args_separator",
                "must not be empty",
            ));
        }
        if self.field_args_separator.is_empty() {
            return Err(ConfigError::invalid(
                "lookup.field_args_separator",
                "must not be empty",
            ));
        }
        if self.header_args_separator == self.field_args_separator {
            return Err(ConfigError::invalid(
                "lookup.field_args_separator",
                "must differ from lookup.header_args_separator",
            ));
        }
        if self.identity_field.is_empty() {
            return Err(ConfigError::invalid(
                "lookup.identity_field",
                "must not be empty",
            ));
        }
        Ok(())
    }
}
