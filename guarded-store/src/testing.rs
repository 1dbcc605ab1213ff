//! Test fixtures and store wrappers shared by the unit tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use guarded_store_shared::{BulkAction, CollectionId, DocumentBody, DocumentVersion, StoredDocument};
use serde_json::Value;
use tokio::sync::Barrier;

use crate::errors::StoreError;
use crate::interfaces::DocumentStoreClient;
use crate::memory::InMemoryStore;
use crate::schema::{collection_body, validate_fields};
use crate::types::{BulkResponse, CollectionSummary, MultiGetItem};

pub fn body(value: Value) -> DocumentBody {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

pub fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(name, field_type)| (name.to_string(), field_type.to_string()))
        .collect()
}

pub fn schema_for(kind: &str, pairs: &[(&str, &str)]) -> Value {
    collection_body(kind, &validate_fields(&fields(pairs)).unwrap())
}

/// An in-memory store holding an empty `people/person` collection.
pub async fn people_store() -> (InMemoryStore, CollectionId) {
    let store = InMemoryStore::new();
    store
        .create_collection("people", &schema_for("person", &[("name", "text")]))
        .await
        .unwrap();
    (store, CollectionId::new("people", "person"))
}

/// Records every call and injects timeouts or extra multi-get entries.
pub struct ProbeStore {
    inner: InMemoryStore,
    calls: Mutex<Vec<&'static str>>,
    timeouts: Mutex<HashMap<&'static str, u32>>,
    late_timeouts: Mutex<HashMap<&'static str, u32>>,
    vanished: Mutex<HashSet<String>>,
    extra_items: Mutex<Vec<MultiGetItem>>,
    bulk_override: Mutex<Option<BulkResponse>>,
}

impl ProbeStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            timeouts: Mutex::new(HashMap::new()),
            late_timeouts: Mutex::new(HashMap::new()),
            vanished: Mutex::new(HashSet::new()),
            extra_items: Mutex::new(Vec::new()),
            bulk_override: Mutex::new(None),
        }
    }

    /// Make the next `times` calls of `method` time out.
    pub fn time_out(&self, method: &'static str, times: u32) {
        self.timeouts.lock().unwrap().insert(method, times);
    }

    /// Apply the next `times` calls of `method` in the inner store, then
    /// report a timeout anyway. Only `create` and `delete` honour this.
    pub fn time_out_after_write(&self, method: &'static str, times: u32) {
        self.late_timeouts.lock().unwrap().insert(method, times);
    }

    /// Answer `get` for `id` with not-found while `exists` still sees it.
    pub fn vanish_on_get(&self, id: &str) {
        self.vanished.lock().unwrap().insert(id.to_string());
    }

    /// Append an entry to every multi-get response.
    pub fn add_multi_get_item(&self, item: MultiGetItem) {
        self.extra_items.lock().unwrap().push(item);
    }

    /// Answer bulk requests with `response` instead of executing them.
    pub fn override_bulk(&self, response: BulkResponse) {
        *self.bulk_override.lock().unwrap() = Some(response);
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == method)
            .count()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn enter(&self, method: &'static str) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(method);
        let mut timeouts = self.timeouts.lock().unwrap();
        if let Some(remaining) = timeouts.get_mut(method) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StoreError::timeout(format!("{} timed out", method)));
            }
        }
        Ok(())
    }

    fn leave(&self, method: &'static str) -> Result<(), StoreError> {
        let mut late = self.late_timeouts.lock().unwrap();
        if let Some(remaining) = late.get_mut(method) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StoreError::timeout(format!("{} timed out after applying", method)));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStoreClient for ProbeStore {
    async fn collection_exists(&self, name: &str, kind: &str) -> Result<bool, StoreError> {
        self.enter("collection_exists")?;
        self.inner.collection_exists(name, kind).await
    }

    async fn create_collection(&self, name: &str, schema: &Value) -> Result<bool, StoreError> {
        self.enter("create_collection")?;
        self.inner.create_collection(name, schema).await
    }

    async fn put_schema(
        &self,
        name: &str,
        kind: &str,
        schema: &Value,
    ) -> Result<bool, StoreError> {
        self.enter("put_schema")?;
        self.inner.put_schema(name, kind, schema).await
    }

    async fn collection_info(&self, name: &str) -> Result<Value, StoreError> {
        self.enter("collection_info")?;
        self.inner.collection_info(name).await
    }

    async fn list_collections(&self) -> Result<Vec<CollectionSummary>, StoreError> {
        self.enter("list_collections")?;
        self.inner.list_collections().await
    }

    async fn exists(&self, collection: &CollectionId, id: &str) -> Result<bool, StoreError> {
        self.enter("exists")?;
        self.inner.exists(collection, id).await
    }

    async fn get(
        &self,
        collection: &CollectionId,
        id: &str,
    ) -> Result<StoredDocument, StoreError> {
        self.enter("get")?;
        let vanished = self.vanished.lock().unwrap().contains(id);
        if vanished {
            return Err(StoreError::not_found(format!("[{}]: document missing", id)));
        }
        self.inner.get(collection, id).await
    }

    async fn create(
        &self,
        collection: &CollectionId,
        id: &str,
        body: &DocumentBody,
    ) -> Result<DocumentVersion, StoreError> {
        self.enter("create")?;
        let version = self.inner.create(collection, id, body).await?;
        self.leave("create")?;
        Ok(version)
    }

    async fn update(
        &self,
        collection: &CollectionId,
        id: &str,
        update: &Value,
        expected_version: DocumentVersion,
    ) -> Result<DocumentVersion, StoreError> {
        self.enter("update")?;
        self.inner
            .update(collection, id, update, expected_version)
            .await
    }

    async fn delete(
        &self,
        collection: &CollectionId,
        id: &str,
        expected_version: DocumentVersion,
    ) -> Result<(), StoreError> {
        self.enter("delete")?;
        self.inner.delete(collection, id, expected_version).await?;
        self.leave("delete")
    }

    async fn count(
        &self,
        collection: &CollectionId,
        query: Option<&Value>,
    ) -> Result<u64, StoreError> {
        self.enter("count")?;
        self.inner.count(collection, query).await
    }

    async fn bulk(&self, actions: &[BulkAction]) -> Result<BulkResponse, StoreError> {
        self.enter("bulk")?;
        let scripted = self.bulk_override.lock().unwrap().clone();
        match scripted {
            Some(response) => Ok(response),
            None => self.inner.bulk(actions).await,
        }
    }

    async fn multi_get(
        &self,
        collection: &CollectionId,
        ids: &[String],
    ) -> Result<Vec<MultiGetItem>, StoreError> {
        self.enter("multi_get")?;
        let mut items = self.inner.multi_get(collection, ids).await?;
        items.extend(self.extra_items.lock().unwrap().iter().cloned());
        Ok(items)
    }
}

/// Holds every reader at a barrier right after `get`, so that concurrent
/// conditional writes all observe the same version before any of them writes.
pub struct RaceStore {
    inner: InMemoryStore,
    barrier: Barrier,
}

impl RaceStore {
    pub fn new(inner: InMemoryStore, racers: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(racers),
        }
    }
}

#[async_trait]
impl DocumentStoreClient for RaceStore {
    async fn collection_exists(&self, name: &str, kind: &str) -> Result<bool, StoreError> {
        self.inner.collection_exists(name, kind).await
    }

    async fn create_collection(&self, name: &str, schema: &Value) -> Result<bool, StoreError> {
        self.inner.create_collection(name, schema).await
    }

    async fn put_schema(
        &self,
        name: &str,
        kind: &str,
        schema: &Value,
    ) -> Result<bool, StoreError> {
        self.inner.put_schema(name, kind, schema).await
    }

    async fn collection_info(&self, name: &str) -> Result<Value, StoreError> {
        self.inner.collection_info(name).await
    }

    async fn list_collections(&self) -> Result<Vec<CollectionSummary>, StoreError> {
        self.inner.list_collections().await
    }

    async fn exists(&self, collection: &CollectionId, id: &str) -> Result<bool, StoreError> {
        self.inner.exists(collection, id).await
    }

    async fn get(
        &self,
        collection: &CollectionId,
        id: &str,
    ) -> Result<StoredDocument, StoreError> {
        let document = self.inner.get(collection, id).await;
        self.barrier.wait().await;
        document
    }

    async fn create(
        &self,
        collection: &CollectionId,
        id: &str,
        body: &DocumentBody,
    ) -> Result<DocumentVersion, StoreError> {
        self.inner.create(collection, id, body).await
    }

    async fn update(
        &self,
        collection: &CollectionId,
        id: &str,
        update: &Value,
        expected_version: DocumentVersion,
    ) -> Result<DocumentVersion, StoreError> {
        self.inner
            .update(collection, id, update, expected_version)
            .await
    }

    async fn delete(
        &self,
        collection: &CollectionId,
        id: &str,
        expected_version: DocumentVersion,
    ) -> Result<(), StoreError> {
        self.inner.delete(collection, id, expected_version).await
    }

    async fn count(
        &self,
        collection: &CollectionId,
        query: Option<&Value>,
    ) -> Result<u64, StoreError> {
        self.inner.count(collection, query).await
    }

    async fn bulk(&self, actions: &[BulkAction]) -> Result<BulkResponse, StoreError> {
        self.inner.bulk(actions).await
    }

    async fn multi_get(
        &self,
        collection: &CollectionId,
        ids: &[String],
    ) -> Result<Vec<MultiGetItem>, StoreError> {
        self.inner.multi_get(collection, ids).await
    }
}
