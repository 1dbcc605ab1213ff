//! Collection schema validation and mapping documents.
//!
//! The document kind is recorded under `_meta.kind` in the mappings, since the
//! engine no longer keeps mapping types of its own.

use std::collections::BTreeMap;

use guarded_store_shared::FieldType;
use serde_json::{json, Map, Value};

use crate::errors::GuardError;

/// Key under `mappings._meta` that records the collection kind.
pub const KIND_META_KEY: &str = "kind";

/// Validated field declarations, ordered by field name.
pub type FieldSchema = BTreeMap<String, FieldType>;

/// Check every declared type against the recognised set.
///
/// Fails on the first unrecognised type (in field-name order).
pub fn validate_fields(fields: &BTreeMap<String, String>) -> Result<FieldSchema, GuardError> {
    fields
        .iter()
        .map(|(field, declared)| {
            if field.is_empty() {
                return Err(GuardError::validation("field names must not be empty"));
            }
            FieldType::parse(declared)
                .map(|field_type| (field.clone(), field_type))
                .ok_or_else(|| GuardError::schema_invalid(field, declared))
        })
        .collect()
}

fn properties(fields: &FieldSchema) -> Map<String, Value> {
    fields
        .iter()
        .map(|(field, field_type)| (field.clone(), json!({ "type": field_type.as_str() })))
        .collect()
}

/// Body for creating a collection of `kind` with the given fields.
pub fn collection_body(kind: &str, fields: &FieldSchema) -> Value {
    json!({
        "mappings": {
            "_meta": { KIND_META_KEY: kind },
            "properties": properties(fields)
        }
    })
}

/// Body for adding or overwriting fields on an existing collection.
pub fn mapping_update_body(fields: &FieldSchema) -> Value {
    json!({ "properties": properties(fields) })
}

/// Read the kind recorded in a `mappings` object.
pub fn kind_of(mappings: &Value) -> Option<&str> {
    mappings
        .get("_meta")
        .and_then(|meta| meta.get(KIND_META_KEY))
        .and_then(Value::as_str)
}
