//! OpenSearch request bodies and response parsing.
//!
//! Pure functions so the wire shapes can be tested without a cluster.

use guarded_store_shared::{BulkAction, DocumentVersion, StoredDocument};
use serde_json::{json, Value};

use crate::errors::StoreError;
use crate::schema::kind_of;
use crate::types::{BulkItemError, BulkResponse, CollectionSummary, MultiGetItem};

/// Newline-delimited bulk body: an action line, then the source line for
/// creates and updates.
pub fn bulk_lines(actions: &[BulkAction]) -> Vec<Value> {
    let mut lines = Vec::with_capacity(actions.len() * 2);
    for action in actions {
        lines.push(json!({
            action.op.as_str(): {
                "_index": action.collection.name,
                "_id": action.id
            }
        }));
        if let Some(body) = &action.body {
            lines.push(body.clone());
        }
    }
    lines
}

/// Body for `_count`; matches everything when no query is given.
pub fn count_body(query: Option<&Value>) -> Value {
    json!({
        "query": query.cloned().unwrap_or_else(|| json!({ "match_all": {} }))
    })
}

pub fn acknowledged(response: &Value) -> bool {
    response
        .get("acknowledged")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Kind recorded in a `GET /<index>/_mapping` response. The response is keyed
/// by concrete index name, so the first entry is used.
pub fn kind_from_mapping_response(response: &Value) -> Option<String> {
    response
        .as_object()?
        .values()
        .next()
        .and_then(|index| index.get("mappings"))
        .and_then(kind_of)
        .map(str::to_string)
}

pub fn parse_stored_document(id: &str, response: &Value) -> Result<StoredDocument, StoreError> {
    let seq_no = response
        .get("_seq_no")
        .and_then(Value::as_i64)
        .ok_or_else(|| StoreError::parse(format!("[{}]: response has no _seq_no", id)))?;
    let primary_term = response
        .get("_primary_term")
        .and_then(Value::as_i64)
        .ok_or_else(|| StoreError::parse(format!("[{}]: response has no _primary_term", id)))?;
    let body = response
        .get("_source")
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| StoreError::parse(format!("[{}]: response has no _source", id)))?;

    Ok(StoredDocument {
        id: id.to_string(),
        version: DocumentVersion::new(seq_no, primary_term),
        body,
    })
}

pub fn parse_version(response: &Value) -> Result<DocumentVersion, StoreError> {
    match (
        response.get("_seq_no").and_then(Value::as_i64),
        response.get("_primary_term").and_then(Value::as_i64),
    ) {
        (Some(seq_no), Some(primary_term)) => Ok(DocumentVersion::new(seq_no, primary_term)),
        _ => Err(StoreError::parse("write response has no _seq_no/_primary_term")),
    }
}

/// Count items with a 2xx status and no error; everything else is a failure.
pub fn parse_bulk_response(response: &Value) -> Result<BulkResponse, StoreError> {
    let items = response
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::parse("bulk response has no items"))?;

    let mut parsed = BulkResponse::default();
    for item in items {
        let Some(result) = item.as_object().and_then(|op| op.values().next()) else {
            return Err(StoreError::parse("bulk item is not an object"));
        };
        let id = result
            .get("_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let status = result.get("status").and_then(Value::as_u64).unwrap_or(500);

        match result.get("error") {
            None if (200..300).contains(&status) => parsed.success_count += 1,
            error => parsed.errors.push(BulkItemError {
                id,
                reason: error
                    .map(|e| {
                        e.get("reason")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                            .unwrap_or_else(|| e.to_string())
                    })
                    .unwrap_or_else(|| format!("status {}", status)),
            }),
        }
    }
    Ok(parsed)
}

pub fn parse_multi_get(response: &Value) -> Result<Vec<MultiGetItem>, StoreError> {
    let docs = response
        .get("docs")
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::parse("mget response has no docs"))?;

    Ok(docs
        .iter()
        .filter_map(|doc| {
            let id = doc.get("_id").and_then(Value::as_str)?.to_string();
            let found = doc.get("found").and_then(Value::as_bool).unwrap_or(false);
            let body = if found {
                doc.get("_source").and_then(Value::as_object).cloned()
            } else {
                None
            };
            Some(MultiGetItem { id, body })
        })
        .collect())
}

/// `_cat/indices?format=json` rows. Counts come back as strings.
pub fn parse_cat_indices(response: &Value) -> Result<Vec<CollectionSummary>, StoreError> {
    let rows = response
        .as_array()
        .ok_or_else(|| StoreError::parse("cat indices response is not an array"))?;

    let text = |row: &Value, key: &str| row.get(key).and_then(Value::as_str).map(str::to_string);

    Ok(rows
        .iter()
        .filter_map(|row| {
            Some(CollectionSummary {
                name: text(row, "index")?,
                health: text(row, "health"),
                status: text(row, "status"),
                docs_count: text(row, "docs.count").and_then(|count| count.parse().ok()),
            })
        })
        .collect())
}
