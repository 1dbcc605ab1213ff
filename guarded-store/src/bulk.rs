//! Bulk action assembly and response interpretation.

use std::collections::{BTreeMap, BTreeSet};

use guarded_store_shared::{BulkAction, BulkOp, CollectionId, DocumentBody};
use serde_json::Value;
use tracing::{debug, error};

use crate::errors::GuardError;
use crate::types::{BulkResponse, BulkSummary};
use crate::versioning::doc_envelope;

fn action(op: BulkOp, collection: &CollectionId, id: &str, body: Option<Value>) -> BulkAction {
    BulkAction {
        op,
        collection: collection.clone(),
        id: id.to_string(),
        body,
    }
}

/// One create action per document.
pub fn create_actions(
    collection: &CollectionId,
    documents: &BTreeMap<String, DocumentBody>,
) -> Vec<BulkAction> {
    documents
        .iter()
        .map(|(id, body)| {
            action(
                BulkOp::Create,
                collection,
                id,
                Some(Value::Object(body.clone())),
            )
        })
        .collect()
}

/// One update action per document, each carrying the `doc` envelope.
pub fn update_actions(
    collection: &CollectionId,
    partials: &BTreeMap<String, DocumentBody>,
) -> Vec<BulkAction> {
    partials
        .iter()
        .map(|(id, partial)| action(BulkOp::Update, collection, id, Some(doc_envelope(partial))))
        .collect()
}

/// One delete action per id.
pub fn delete_actions(collection: &CollectionId, ids: &[String]) -> Vec<BulkAction> {
    ids.iter()
        .map(|id| action(BulkOp::Delete, collection, id, None))
        .collect()
}

/// Decide whether a bulk request applied every action.
///
/// The request succeeded only if the store reports as many successes as
/// actions were submitted. Otherwise the failed ids come from the store's
/// per-item errors; when the store reports a shortfall without naming any
/// item, every submitted id is reported as failed.
pub fn interpret(
    collection: &CollectionId,
    actions: &[BulkAction],
    response: BulkResponse,
) -> Result<BulkSummary, GuardError> {
    let total = actions.len();

    if response.success_count == total && response.errors.is_empty() {
        debug!(collection = %collection, total = total, "Bulk request applied");
        return Ok(BulkSummary {
            total,
            succeeded: total,
        });
    }

    let mut failed_ids: BTreeSet<String> =
        response.errors.iter().map(|e| e.id.clone()).collect();
    if failed_ids.is_empty() {
        failed_ids = actions.iter().map(|a| a.id.clone()).collect();
    }

    for item in &response.errors {
        error!(collection = %collection, id = %item.id, reason = %item.reason, "Bulk item failed");
    }

    Err(GuardError::BulkPartialFailure {
        collection: collection.clone(),
        total,
        succeeded: response.success_count,
        failed_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::body;
    use crate::types::BulkItemError;
    use serde_json::json;

    fn people() -> CollectionId {
        CollectionId::new("people", "person")
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_update_actions_carry_envelope() {
        let partials = BTreeMap::from([("1".to_string(), body(json!({ "name": "x" })))]);
        let actions = update_actions(&people(), &partials);

        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].op, BulkOp::Update);
        assert_eq!(actions[0].collection, people());
        assert_eq!(actions[0].body, Some(json!({ "doc": { "name": "x" } })));
    }

    #[test]
    fn test_create_and_delete_actions() {
        let documents = BTreeMap::from([
            ("1".to_string(), body(json!({ "name": "a" }))),
            ("2".to_string(), body(json!({ "name": "b" }))),
        ]);
        let creates = create_actions(&people(), &documents);
        assert!(creates.iter().all(|a| a.op == BulkOp::Create && a.body.is_some()));
        assert_eq!(creates[1].id, "2");

        let deletes = delete_actions(&people(), &ids(&["1", "2"]));
        assert!(deletes.iter().all(|a| a.op == BulkOp::Delete && a.body.is_none()));
    }

    #[test]
    fn test_interpret_full_success() {
        let actions = delete_actions(&people(), &ids(&["1", "2", "3"]));
        let response = BulkResponse {
            success_count: 3,
            errors: vec![],
        };

        let summary = interpret(&people(), &actions, response).unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 3);
    }

    #[test]
    fn test_interpret_partial_failure_names_failed_id() {
        let actions = delete_actions(&people(), &ids(&["1", "2", "3"]));
        let response = BulkResponse {
            success_count: 2,
            errors: vec![BulkItemError {
                id: "3".to_string(),
                reason: "document missing".to_string(),
            }],
        };

        match interpret(&people(), &actions, response) {
            Err(GuardError::BulkPartialFailure {
                failed_ids,
                succeeded,
                total,
                ..
            }) => {
                assert_eq!(failed_ids, BTreeSet::from(["3".to_string()]));
                assert_eq!(succeeded, 2);
                assert_eq!(total, 3);
            }
            other => panic!("expected BulkPartialFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_interpret_unexplained_shortfall_reports_every_id() {
        let actions = delete_actions(&people(), &ids(&["1", "2"]));
        let response = BulkResponse {
            success_count: 1,
            errors: vec![],
        };

        match interpret(&people(), &actions, response) {
            Err(GuardError::BulkPartialFailure { failed_ids, .. }) => {
                assert_eq!(failed_ids.len(), 2);
            }
            other => panic!("expected BulkPartialFailure, got {:?}", other),
        }
    }
}
