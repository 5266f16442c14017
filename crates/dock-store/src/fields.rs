//! Write-side field checks shared by every backend.

use dock_core::{EntitySchema, EntityType, FieldKind, Fields, Reference, StoreError, Value};

/// Bind `fields` to the columns `declared` allows.
///
/// Scalar columns hold text. Single-valued reference columns hold a
/// [`Value::Ref`] to an existing instance of their target, whether the caller
/// passed a reference or a bare id. `exists` answers whether an instance is
/// present.
pub(crate) fn bind<F>(
    declared: &EntitySchema,
    entity: &EntityType,
    fields: &Fields,
    exists: F,
) -> Result<Fields, StoreError>
where
    F: Fn(&EntityType, &str) -> Result<bool, StoreError>,
{
    let mut bound = Fields::new();
    for (name, value) in fields {
        let unknown = || StoreError::UnknownField {
            entity: entity.clone(),
            field: name.clone(),
        };
        let def = declared
            .field(name)
            .filter(|def| !def.kind.is_collection())
            .ok_or_else(unknown)?;
        let text = value.column_text().ok_or_else(unknown)?;

        let value = match (def.kind, def.target.as_ref()) {
            (FieldKind::Scalar, _) | (_, None) => Value::Text(text.to_string()),
            (_, Some(target)) => {
                if !exists(target, text)? {
                    return Err(StoreError::DanglingReference {
                        entity: entity.clone(),
                        field: name.clone(),
                        target: target.clone(),
                        id: text.to_string(),
                    });
                }
                Value::Ref(Reference {
                    entity: target.clone(),
                    id: text.to_string(),
                })
            }
        };
        bound.insert(name.clone(), value);
    }
    Ok(bound)
}
