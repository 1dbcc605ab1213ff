//! Guard error types.
//!
//! This module defines the errors callers of `GuardedDocumentStore` see.
//! Conflicts and partial bulk failures are errors in their own right and are
//! never folded into a "not performed" outcome.

use std::collections::BTreeSet;

use guarded_store_shared::{CollectionId, DocumentVersion};
use thiserror::Error;

use super::StoreError;

/// Errors that can occur during guarded store operations.
#[derive(Debug, Clone, Error)]
pub enum GuardError {
    /// The target collection does not exist.
    #[error("Collection does not exist: {0}")]
    NotExist(CollectionId),

    /// Creation was attempted on a collection that already exists.
    #[error("Collection already exists: {0}")]
    Exists(CollectionId),

    /// A schema declared a field type outside the recognised set.
    #[error("Invalid schema: field '{field}' has unrecognised type '{field_type}'")]
    SchemaInvalid { field: String, field_type: String },

    /// A conditional write lost the race against another writer.
    #[error("Version conflict on {collection} document '{id}' (expected {expected})")]
    VersionConflict {
        collection: CollectionId,
        id: String,
        expected: DocumentVersion,
    },

    /// The store timed out on every allowed attempt.
    #[error("Transient timeout: {0}")]
    TransientTimeout(String),

    /// A bulk request did not apply every action.
    #[error(
        "Bulk operation on {collection} applied {succeeded} of {total} actions; failed ids: {failed_ids:?}"
    )]
    BulkPartialFailure {
        collection: CollectionId,
        total: usize,
        succeeded: usize,
        failed_ids: BTreeSet<String>,
    },

    /// The store did not acknowledge a collection change.
    #[error("Store did not acknowledge {operation} on {collection}")]
    NotAcknowledged {
        operation: &'static str,
        collection: CollectionId,
    },

    /// Batch size exceeds configured maximum.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },

    /// Validation error (e.g., missing required fields, bad configuration).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Any other store failure.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl GuardError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a schema error for a single field.
    pub fn schema_invalid(field: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self::SchemaInvalid {
            field: field.into(),
            field_type: field_type.into(),
        }
    }

    /// Create a batch size exceeded error.
    pub fn batch_size_exceeded(provided: usize, max: usize) -> Self {
        Self::BatchSizeExceeded { provided, max }
    }

    /// Whether the retry wrapper may try the operation again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientTimeout(_))
    }
}

impl From<StoreError> for GuardError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Timeout(msg) => Self::TransientTimeout(msg),
            other => Self::Store(other),
        }
    }
}
