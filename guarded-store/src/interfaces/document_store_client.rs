//! Document store client trait definition.

use async_trait::async_trait;
use guarded_store_shared::{BulkAction, CollectionId, DocumentBody, DocumentVersion, StoredDocument};
use serde_json::Value;

use crate::errors::StoreError;
use crate::types::{BulkResponse, CollectionSummary, MultiGetItem};

/// Abstract interface for the external document store.
///
/// The guard layer treats the store as a black box reached through this trait.
/// Each method is a single round trip; no method retries on its own.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// Timeouts must be reported as `StoreError::Timeout`, since that is the only
/// kind the guard layer retries.
#[async_trait]
pub trait DocumentStoreClient: Send + Sync {
    /// Whether the index exists and holds documents of the given kind.
    async fn collection_exists(&self, name: &str, kind: &str) -> Result<bool, StoreError>;

    /// Create an index from a schema document.
    ///
    /// # Returns
    ///
    /// * `Ok(acknowledged)` - The store's acknowledgment flag
    /// * `Err(StoreError::AlreadyExists)` - If the index already exists
    async fn create_collection(&self, name: &str, schema: &Value) -> Result<bool, StoreError>;

    /// Add or overwrite field declarations on an existing index.
    ///
    /// # Returns
    ///
    /// * `Ok(acknowledged)` - The store's acknowledgment flag
    async fn put_schema(&self, name: &str, kind: &str, schema: &Value)
        -> Result<bool, StoreError>;

    /// Raw description (settings and mappings) of an index.
    async fn collection_info(&self, name: &str) -> Result<Value, StoreError>;

    /// Every index the store knows about.
    async fn list_collections(&self) -> Result<Vec<CollectionSummary>, StoreError>;

    /// Whether a document exists.
    async fn exists(&self, collection: &CollectionId, id: &str) -> Result<bool, StoreError>;

    /// Read a document and its current version.
    ///
    /// # Returns
    ///
    /// * `Ok(StoredDocument)` - The document body and version
    /// * `Err(StoreError::NotFound)` - If the document does not exist
    async fn get(&self, collection: &CollectionId, id: &str)
        -> Result<StoredDocument, StoreError>;

    /// Create a document.
    ///
    /// # Returns
    ///
    /// * `Ok(version)` - The version assigned to the new document
    /// * `Err(StoreError::VersionConflict)` - If a document with the id exists
    async fn create(
        &self,
        collection: &CollectionId,
        id: &str,
        body: &DocumentBody,
    ) -> Result<DocumentVersion, StoreError>;

    /// Apply an update envelope (`{"doc": {...}}`) if the document is still at
    /// `expected_version`.
    ///
    /// # Returns
    ///
    /// * `Ok(version)` - The version after the write
    /// * `Err(StoreError::VersionConflict)` - If the version moved
    /// * `Err(StoreError::NotFound)` - If the document is gone
    async fn update(
        &self,
        collection: &CollectionId,
        id: &str,
        update: &Value,
        expected_version: DocumentVersion,
    ) -> Result<DocumentVersion, StoreError>;

    /// Delete a document if it is still at `expected_version`.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was deleted
    /// * `Err(StoreError::VersionConflict)` - If the version moved
    /// * `Err(StoreError::NotFound)` - If the document is gone
    async fn delete(
        &self,
        collection: &CollectionId,
        id: &str,
        expected_version: DocumentVersion,
    ) -> Result<(), StoreError>;

    /// Count documents matching `query`, or all documents when `None`.
    async fn count(&self, collection: &CollectionId, query: Option<&Value>)
        -> Result<u64, StoreError>;

    /// Execute a batch of actions in one request.
    async fn bulk(&self, actions: &[BulkAction]) -> Result<BulkResponse, StoreError>;

    /// Fetch several documents in one round trip.
    async fn multi_get(
        &self,
        collection: &CollectionId,
        ids: &[String],
    ) -> Result<Vec<MultiGetItem>, StoreError>;
}
