//! Optimistic version control for updates and deletes.
//!
//! Each conditional write reads the document's current version and submits
//! it as a precondition. If another writer moved the version in between, the
//! store rejects the write and the caller gets `GuardError::VersionConflict`.
//! Versions are read fresh for every call and never cached.

use guarded_store_shared::{CollectionId, DocumentBody, DocumentVersion, StoredDocument};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{GuardError, StoreError};
use crate::interfaces::DocumentStoreClient;
use crate::types::WriteOutcome;

/// Wrap a partial body in the `doc` envelope the store merges from.
pub fn doc_envelope(partial: &DocumentBody) -> Value {
    json!({ "doc": partial })
}

/// Existence check followed by a version read. `None` when the document is
/// absent at either step.
async fn read_current(
    store: &dyn DocumentStoreClient,
    collection: &CollectionId,
    id: &str,
) -> Result<Option<StoredDocument>, GuardError> {
    if !store.exists(collection, id).await? {
        return Ok(None);
    }

    match store.get(collection, id).await {
        Ok(document) => Ok(Some(document)),
        Err(StoreError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Translate the store's answer to a conditional write.
///
/// `NotFound` after a successful version read means another writer removed
/// the document, which is a lost race like any other version change.
fn conditional_write_error(
    err: StoreError,
    collection: &CollectionId,
    id: &str,
    expected: DocumentVersion,
) -> GuardError {
    match err {
        StoreError::VersionConflict(reason) | StoreError::NotFound(reason) => {
            warn!(
                collection = %collection,
                id = %id,
                expected = %expected,
                reason = %reason,
                "Conditional write lost to a concurrent writer"
            );
            GuardError::VersionConflict {
                collection: collection.clone(),
                id: id.to_string(),
                expected,
            }
        }
        other => other.into(),
    }
}

/// Merge `partial` into the document, conditioned on the version read just
/// before the write.
pub async fn conditional_update(
    store: &dyn DocumentStoreClient,
    collection: &CollectionId,
    id: &str,
    partial: &DocumentBody,
) -> Result<WriteOutcome, GuardError> {
    let Some(current) = read_current(store, collection, id).await? else {
        debug!(collection = %collection, id = %id, "Update skipped, document absent");
        return Ok(WriteOutcome::NotPerformed);
    };

    let envelope = doc_envelope(partial);
    match store
        .update(collection, id, &envelope, current.version)
        .await
    {
        Ok(version) => {
            debug!(collection = %collection, id = %id, version = %version, "Document updated");
            Ok(WriteOutcome::Performed)
        }
        Err(e) => Err(conditional_write_error(e, collection, id, current.version)),
    }
}

/// Delete the document, conditioned on the version read just before the
/// write.
pub async fn conditional_delete(
    store: &dyn DocumentStoreClient,
    collection: &CollectionId,
    id: &str,
) -> Result<WriteOutcome, GuardError> {
    let Some(current) = read_current(store, collection, id).await? else {
        debug!(collection = %collection, id = %id, "Delete skipped, document absent");
        return Ok(WriteOutcome::NotPerformed);
    };

    match store.delete(collection, id, current.version).await {
        Ok(()) => {
            debug!(collection = %collection, id = %id, "Document deleted");
            Ok(WriteOutcome::Performed)
        }
        Err(e) => Err(conditional_write_error(e, collection, id, current.version)),
    }
}
