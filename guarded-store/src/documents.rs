//! Shaping of documents returned to callers.

use std::collections::HashSet;

use guarded_store_shared::DocumentBody;
use serde_json::Value;

use crate::types::MultiGetItem;

/// Field added to every document handed back to callers.
pub const ID_FIELD: &str = "id";

/// Add the document id to its body.
pub fn with_id(mut body: DocumentBody, id: &str) -> DocumentBody {
    body.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    body
}

/// Keep only the requested ids that came back with a body, each tagged with
/// its id. Store order is preserved.
pub fn select_requested(requested: &[String], items: Vec<MultiGetItem>) -> Vec<DocumentBody> {
    let wanted: HashSet<&str> = requested.iter().map(String::as_str).collect();

    items
        .into_iter()
        .filter(|item| wanted.contains(item.id.as_str()))
        .filter_map(|item| item.body.map(|body| with_id(body, &item.id)))
        .collect()
}
