//! Capability gate: existence checks run before collection-bound operations.

use tracing::{debug, warn};

use crate::errors::GuardError;
use crate::interfaces::DocumentStoreClient;
use crate::types::OperationDescriptor;

/// Verify the preconditions a descriptor declares.
///
/// Descriptors that do not require a collection pass straight through. For
/// the rest, the collection (index and kind) must exist or the call fails
/// with `GuardError::NotExist` before the operation is attempted.
pub async fn admit(
    store: &dyn DocumentStoreClient,
    descriptor: &OperationDescriptor,
) -> Result<(), GuardError> {
    if !descriptor.requires_collection {
        return Ok(());
    }

    let collection = descriptor.collection.as_ref().ok_or_else(|| {
        GuardError::validation(format!(
            "operation '{}' requires a collection but names none",
            descriptor.name
        ))
    })?;

    if store
        .collection_exists(&collection.name, &collection.kind)
        .await?
    {
        debug!(operation = descriptor.name, collection = %collection, "Collection present");
        Ok(())
    } else {
        warn!(operation = descriptor.name, collection = %collection, "Collection does not exist");
        Err(GuardError::NotExist(collection.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::testing::schema_for;
    use guarded_store_shared::CollectionId;

    #[tokio::test]
    async fn test_missing_collection_is_rejected() {
        let store = InMemoryStore::new();
        let collection = CollectionId::new("people", "person");

        let result = admit(&store, &OperationDescriptor::gated("get", &collection)).await;

        match result {
            Err(GuardError::NotExist(c)) => assert_eq!(c, collection),
            other => panic!("expected NotExist, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wrong_kind_is_rejected() {
        let store = InMemoryStore::new();
        store
            .create_collection("people", &schema_for("person", &[("name", "text")]))
            .await
            .unwrap();

        let other_kind = CollectionId::new("people", "company");
        let result = admit(&store, &OperationDescriptor::gated("get", &other_kind)).await;

        assert!(matches!(result, Err(GuardError::NotExist(_))));
    }

    #[tokio::test]
    async fn test_existing_collection_is_admitted() {
        let store = InMemoryStore::new();
        store
            .create_collection("people", &schema_for("person", &[("name", "text")]))
            .await
            .unwrap();

        let collection = CollectionId::new("people", "person");
        assert!(admit(&store, &OperationDescriptor::gated("get", &collection))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_ungated_descriptor_skips_the_check() {
        let store = InMemoryStore::new();
        let collection = CollectionId::new("people", "person");

        let descriptor = OperationDescriptor::ungated("create_collection", Some(&collection));
        assert!(admit(&store, &descriptor).await.is_ok());
    }

    #[tokio::test]
    async fn test_gated_descriptor_without_collection_is_invalid() {
        let store = InMemoryStore::new();
        let descriptor = OperationDescriptor {
            name: "broken",
            collection: None,
            requires_collection: true,
            retryable: true,
        };

        assert!(matches!(
            admit(&store, &descriptor).await,
            Err(GuardError::ValidationError(_))
        ));
    }
}
