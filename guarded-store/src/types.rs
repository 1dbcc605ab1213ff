//! Request and response types for guarded store operations.

use guarded_store_shared::{CollectionId, DocumentBody};
use serde::{Deserialize, Serialize};

/// Result of a conditional write that did not fail.
///
/// `NotPerformed` means the target document was absent (or, for creates,
/// already present). It is distinct from every error, including
/// `GuardError::VersionConflict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Performed,
    NotPerformed,
}

impl WriteOutcome {
    pub fn is_performed(&self) -> bool {
        matches!(self, WriteOutcome::Performed)
    }
}

/// Describes an operation to the gate and retry wrappers.
///
/// Every public operation builds its descriptor explicitly; nothing is
/// inferred from the operation's name.
#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    /// Operation name, used in logs.
    pub name: &'static str,
    /// The collection the operation targets, if any.
    pub collection: Option<CollectionId>,
    /// Whether the collection must exist before the operation runs.
    pub requires_collection: bool,
    /// Whether transient timeouts may be retried.
    pub retryable: bool,
}

impl OperationDescriptor {
    /// An operation that needs `collection` to exist.
    pub fn gated(name: &'static str, collection: &CollectionId) -> Self {
        Self {
            name,
            collection: Some(collection.clone()),
            requires_collection: true,
            retryable: true,
        }
    }

    /// An operation that runs without an existence check.
    pub fn ungated(name: &'static str, collection: Option<&CollectionId>) -> Self {
        Self {
            name,
            collection: collection.cloned(),
            requires_collection: false,
            retryable: true,
        }
    }

    /// Limit the operation to a single attempt.
    pub fn single_attempt(mut self) -> Self {
        self.retryable = false;
        self
    }
}

/// A single failed item reported by the store's bulk endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemError {
    pub id: String,
    pub reason: String,
}

/// What the store reports after executing a bulk request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkResponse {
    pub success_count: usize,
    pub errors: Vec<BulkItemError>,
}

/// Summary of a bulk operation that applied every action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkSummary {
    /// Number of actions submitted.
    pub total: usize,
    /// Number of actions the store applied.
    pub succeeded: usize,
}

impl BulkSummary {
    pub fn empty() -> Self {
        Self {
            total: 0,
            succeeded: 0,
        }
    }
}

/// One entry of a multi-get response. `body` is `None` when the store found
/// nothing for the id.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiGetItem {
    pub id: String,
    pub body: Option<DocumentBody>,
}

/// Summary row describing a collection known to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub name: String,
    pub health: Option<String>,
    pub status: Option<String>,
    pub docs_count: Option<u64>,
}
