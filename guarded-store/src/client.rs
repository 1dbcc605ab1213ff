//! Guarded document store client.
//!
//! Application code uses this to manage collections and to create, read,
//! update, delete and count documents. Every operation runs as
//! retry → capability gate → operation body → store.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use guarded_store_shared::{BulkAction, CollectionId, DocumentBody};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::bulk;
use crate::config::GuardConfig;
use crate::documents::{select_requested, with_id};
use crate::errors::{GuardError, StoreError};
use crate::gate;
use crate::interfaces::DocumentStoreClient;
use crate::retry::RetryPolicy;
use crate::schema::{collection_body, mapping_update_body, validate_fields};
use crate::types::{BulkSummary, CollectionSummary, OperationDescriptor, WriteOutcome};
use crate::versioning::{conditional_delete, conditional_update};

/// The main client for the guarded document store.
pub struct GuardedDocumentStore {
    store: Arc<dyn DocumentStoreClient>,
    config: GuardConfig,
    retry: RetryPolicy,
}

impl GuardedDocumentStore {
    /// Create a new GuardedDocumentStore with default configuration.
    pub fn new(store: Arc<dyn DocumentStoreClient>) -> Self {
        Self::with_config(store, GuardConfig::default())
    }

    /// Create a new GuardedDocumentStore with custom configuration.
    pub fn with_config(store: Arc<dyn DocumentStoreClient>, config: GuardConfig) -> Self {
        let retry = RetryPolicy::from_config(&config);
        Self {
            store,
            config,
            retry,
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Run `operation` behind the retry loop and the capability gate the
    /// descriptor asks for.
    async fn execute<'s, T, F, Fut>(
        &'s self,
        descriptor: OperationDescriptor,
        operation: F,
    ) -> Result<T, GuardError>
    where
        F: Fn(&'s dyn DocumentStoreClient) -> Fut,
        Fut: Future<Output = Result<T, GuardError>>,
    {
        let store: &'s dyn DocumentStoreClient = self.store.as_ref();
        let descriptor = &descriptor;
        let operation = &operation;

        self.retry
            .run(descriptor, move || async move {
                gate::admit(store, descriptor).await?;
                operation(store).await
            })
            .await
    }

    /// Check if batch size exceeds the configured limit.
    fn validate_batch_size(&self, size: usize) -> Result<(), GuardError> {
        if let Some(max) = self.config.max_batch_size {
            if size > max {
                return Err(GuardError::batch_size_exceeded(size, max));
            }
        }
        Ok(())
    }

    fn validate_id(id: &str) -> Result<(), GuardError> {
        if id.is_empty() {
            return Err(GuardError::validation("document id is required"));
        }
        Ok(())
    }

    /// Create a collection with the given field types.
    /// Input: collection (name, kind), fields (field name → type name)
    /// Output: Result<(), GuardError>
    ///
    /// Fails with `SchemaInvalid` before touching the store if any type is
    /// unrecognised, and with `Exists` if the collection is already there.
    #[instrument(skip_all, fields(collection = %collection))]
    pub async fn create_collection(
        &self,
        collection: &CollectionId,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), GuardError> {
        let schema = validate_fields(fields)?;
        let body = collection_body(&collection.kind, &schema);
        let body = &body;

        let descriptor = OperationDescriptor::ungated("create_collection", Some(collection));
        let acknowledged = self
            .execute(descriptor, move |store| async move {
                if store
                    .collection_exists(&collection.name, &collection.kind)
                    .await?
                {
                    return Err(GuardError::Exists(collection.clone()));
                }
                match store.create_collection(&collection.name, body).await {
                    Ok(acknowledged) => Ok(acknowledged),
                    Err(StoreError::AlreadyExists(_)) => {
                        Err(GuardError::Exists(collection.clone()))
                    }
                    Err(e) => Err(e.into()),
                }
            })
            .await?;

        if !acknowledged {
            return Err(GuardError::NotAcknowledged {
                operation: "create_collection",
                collection: collection.clone(),
            });
        }

        info!(collection = %collection, fields = schema.len(), "Collection created");
        Ok(())
    }

    /// Add or overwrite field types on an existing collection.
    /// Input: collection (name, kind), fields (field name → type name)
    /// Output: Result<(), GuardError>
    #[instrument(skip_all, fields(collection = %collection))]
    pub async fn update_schema(
        &self,
        collection: &CollectionId,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), GuardError> {
        let schema = validate_fields(fields)?;
        let body = mapping_update_body(&schema);
        let body = &body;

        let descriptor = OperationDescriptor::gated("update_schema", collection);
        let acknowledged = self
            .execute(descriptor, move |store| async move {
                store
                    .put_schema(&collection.name, &collection.kind, body)
                    .await
                    .map_err(GuardError::from)
            })
            .await?;

        if !acknowledged {
            return Err(GuardError::NotAcknowledged {
                operation: "update_schema",
                collection: collection.clone(),
            });
        }

        info!(collection = %collection, fields = schema.len(), "Collection schema updated");
        Ok(())
    }

    /// Raw settings and mappings of a collection, as the store reports them.
    #[instrument(skip_all, fields(collection = %collection))]
    pub async fn collection_info(&self, collection: &CollectionId) -> Result<Value, GuardError> {
        let descriptor = OperationDescriptor::gated("collection_info", collection);
        self.execute(descriptor, move |store| async move {
            store
                .collection_info(&collection.name)
                .await
                .map_err(GuardError::from)
        })
        .await
    }

    /// Every collection the store knows about.
    #[instrument(skip_all)]
    pub async fn list_collections(&self) -> Result<Vec<CollectionSummary>, GuardError> {
        let descriptor = OperationDescriptor::ungated("list_collections", None);
        self.execute(descriptor, |store| async move {
            store.list_collections().await.map_err(GuardError::from)
        })
        .await
    }

    /// Create a document.
    /// Input: collection, id, body
    /// Output: `Performed`, or `NotPerformed` if a document with the id exists
    ///
    /// A write applied by an attempt that then timed out is seen by the retry,
    /// which reports `NotPerformed`.
    #[instrument(skip(self, collection, body), fields(collection = %collection))]
    pub async fn create(
        &self,
        collection: &CollectionId,
        id: &str,
        body: &DocumentBody,
    ) -> Result<WriteOutcome, GuardError> {
        Self::validate_id(id)?;

        let descriptor = OperationDescriptor::gated("create", collection);
        self.execute(descriptor, move |store| async move {
            if store.exists(collection, id).await? {
                debug!(collection = %collection, id = %id, "Create skipped, document exists");
                return Ok(WriteOutcome::NotPerformed);
            }
            match store.create(collection, id, body).await {
                Ok(version) => {
                    debug!(collection = %collection, id = %id, version = %version, "Document created");
                    Ok(WriteOutcome::Performed)
                }
                Err(StoreError::VersionConflict(_)) => Ok(WriteOutcome::NotPerformed),
                Err(e) => Err(GuardError::from(e)),
            }
        })
        .await
    }

    /// Read a document.
    /// Output: the body with its `id` field added, or `None` when absent
    #[instrument(skip(self, collection), fields(collection = %collection))]
    pub async fn get(
        &self,
        collection: &CollectionId,
        id: &str,
    ) -> Result<Option<DocumentBody>, GuardError> {
        Self::validate_id(id)?;

        let descriptor = OperationDescriptor::gated("get", collection);
        self.execute(descriptor, move |store| async move {
            match store.get(collection, id).await {
                Ok(document) => Ok(Some(with_id(document.body, id))),
                Err(StoreError::NotFound(_)) => Ok(None),
                Err(e) => Err(GuardError::from(e)),
            }
        })
        .await
    }

    /// Read several documents in one round trip.
    ///
    /// Only documents whose id was requested are returned; ids the store has
    /// no body for are skipped.
    #[instrument(skip(self, collection, ids), fields(collection = %collection, requested = ids.len()))]
    pub async fn multi_get(
        &self,
        collection: &CollectionId,
        ids: &[String],
    ) -> Result<Vec<DocumentBody>, GuardError> {
        let descriptor = OperationDescriptor::gated("multi_get", collection);
        self.execute(descriptor, move |store| async move {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            store
                .multi_get(collection, ids)
                .await
                .map(|items| select_requested(ids, items))
                .map_err(GuardError::from)
        })
        .await
    }

    /// Merge `partial` into a document, conditioned on its current version.
    /// Output: `Performed`, `NotPerformed` when the document is absent, or
    /// `GuardError::VersionConflict` when another writer got there first
    #[instrument(skip(self, collection, partial), fields(collection = %collection))]
    pub async fn update(
        &self,
        collection: &CollectionId,
        id: &str,
        partial: &DocumentBody,
    ) -> Result<WriteOutcome, GuardError> {
        Self::validate_id(id)?;

        let descriptor = OperationDescriptor::gated("update", collection);
        self.execute(descriptor, move |store| {
            conditional_update(store, collection, id, partial)
        })
        .await
    }

    /// Delete a document, conditioned on its current version.
    /// Output: `Performed`, `NotPerformed` when the document is absent, or
    /// `GuardError::VersionConflict` when another writer got there first
    ///
    /// A delete applied by an attempt that then timed out is seen by the
    /// retry, which reports `NotPerformed`.
    #[instrument(skip(self, collection), fields(collection = %collection))]
    pub async fn delete(
        &self,
        collection: &CollectionId,
        id: &str,
    ) -> Result<WriteOutcome, GuardError> {
        Self::validate_id(id)?;

        let descriptor = OperationDescriptor::gated("delete", collection);
        self.execute(descriptor, move |store| {
            conditional_delete(store, collection, id)
        })
        .await
    }

    /// Count documents matching `query`, or every document when `None`.
    #[instrument(skip(self, collection, query), fields(collection = %collection))]
    pub async fn count(
        &self,
        collection: &CollectionId,
        query: Option<&Value>,
    ) -> Result<u64, GuardError> {
        let descriptor = OperationDescriptor::gated("count", collection);
        self.execute(descriptor, move |store| async move {
            store
                .count(collection, query)
                .await
                .map_err(GuardError::from)
        })
        .await
    }

    /// Create many documents in one bulk request.
    /// Input: collection, id → body
    /// Output: summary when every create applied, otherwise
    /// `GuardError::BulkPartialFailure` naming the failed ids
    ///
    /// The batch size is limited by the configured max_batch_size (default: 1000).
    #[instrument(skip(self, collection, documents), fields(collection = %collection, count = documents.len()))]
    pub async fn bulk_create(
        &self,
        collection: &CollectionId,
        documents: &BTreeMap<String, DocumentBody>,
    ) -> Result<BulkSummary, GuardError> {
        self.validate_batch_size(documents.len())?;
        documents.keys().try_for_each(|id| Self::validate_id(id))?;

        let actions = bulk::create_actions(collection, documents);
        self.submit_bulk("bulk_create", collection, actions).await
    }

    /// Update many documents in one bulk request.
    /// Input: collection, id → partial body
    /// Output: summary when every update applied, otherwise
    /// `GuardError::BulkPartialFailure` naming the failed ids
    ///
    /// Note: bulk updates are not version-checked; each merges into whatever
    /// the document holds when the store applies it.
    #[instrument(skip(self, collection, partials), fields(collection = %collection, count = partials.len()))]
    pub async fn bulk_update(
        &self,
        collection: &CollectionId,
        partials: &BTreeMap<String, DocumentBody>,
    ) -> Result<BulkSummary, GuardError> {
        self.validate_batch_size(partials.len())?;
        partials.keys().try_for_each(|id| Self::validate_id(id))?;

        let actions = bulk::update_actions(collection, partials);
        self.submit_bulk("bulk_update", collection, actions).await
    }

    /// Delete many documents in one bulk request.
    /// Output: summary when every delete applied, otherwise
    /// `GuardError::BulkPartialFailure` naming the failed ids
    #[instrument(skip(self, collection, ids), fields(collection = %collection, count = ids.len()))]
    pub async fn bulk_delete(
        &self,
        collection: &CollectionId,
        ids: &[String],
    ) -> Result<BulkSummary, GuardError> {
        self.validate_batch_size(ids.len())?;
        ids.iter().try_for_each(|id| Self::validate_id(id))?;

        let actions = bulk::delete_actions(collection, ids);
        self.submit_bulk("bulk_delete", collection, actions).await
    }

    async fn submit_bulk(
        &self,
        name: &'static str,
        collection: &CollectionId,
        actions: Vec<BulkAction>,
    ) -> Result<BulkSummary, GuardError> {
        let actions = &actions;
        let descriptor = OperationDescriptor::gated(name, collection);
        self.execute(descriptor, move |store| async move {
            if actions.is_empty() {
                return Ok(BulkSummary::empty());
            }
            let response = store.bulk(actions).await?;
            bulk::interpret(collection, actions, response)
        })
        .await
    }
}
