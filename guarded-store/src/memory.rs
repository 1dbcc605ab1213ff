//! InMemoryStore - in-process document store for testing and development.
//!
//! Mirrors the semantics the guard layer relies on from the search engine:
//! per-collection kinds recorded in the mappings, store-assigned versions,
//! compare-and-swap on conditional writes and deep-merge of `doc` envelopes.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use guarded_store_shared::{
    BulkAction, BulkOp, CollectionId, DocumentBody, DocumentVersion, StoredDocument,
};
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;

use crate::errors::StoreError;
use crate::interfaces::DocumentStoreClient;
use crate::schema::{kind_of, KIND_META_KEY};
use crate::types::{BulkItemError, BulkResponse, CollectionSummary, MultiGetItem};

/// The in-memory store never fails over, so the primary term is fixed.
const PRIMARY_TERM: i64 = 1;

struct MemoryDocument {
    version: DocumentVersion,
    body: DocumentBody,
}

struct MemoryCollection {
    kind: String,
    properties: Map<String, Value>,
    documents: BTreeMap<String, MemoryDocument>,
    seq_no: i64,
}

impl MemoryCollection {
    fn next_version(&mut self) -> DocumentVersion {
        self.seq_no += 1;
        DocumentVersion::new(self.seq_no, PRIMARY_TERM)
    }

    fn check_version(
        document: &MemoryDocument,
        id: &str,
        expected: Option<DocumentVersion>,
    ) -> Result<(), StoreError> {
        match expected {
            Some(expected) if expected != document.version => {
                Err(StoreError::version_conflict(format!(
                    "[{}]: required {}, current {}",
                    id, expected, document.version
                )))
            }
            _ => Ok(()),
        }
    }

    fn create(&mut self, id: &str, body: DocumentBody) -> Result<DocumentVersion, StoreError> {
        if self.documents.contains_key(id) {
            return Err(StoreError::version_conflict(format!(
                "[{}]: document already exists",
                id
            )));
        }
        let version = self.next_version();
        self.documents
            .insert(id.to_string(), MemoryDocument { version, body });
        Ok(version)
    }

    fn update(
        &mut self,
        id: &str,
        update: &Value,
        expected: Option<DocumentVersion>,
    ) -> Result<DocumentVersion, StoreError> {
        let partial = update
            .get("doc")
            .and_then(Value::as_object)
            .ok_or_else(|| StoreError::request("update body must carry a 'doc' object"))?;

        let current = self
            .documents
            .get(id)
            .ok_or_else(|| StoreError::not_found(format!("[{}]: document missing", id)))?;
        Self::check_version(current, id, expected)?;

        let version = self.next_version();
        if let Some(document) = self.documents.get_mut(id) {
            deep_merge(&mut document.body, partial);
            document.version = version;
        }
        Ok(version)
    }

    fn delete(&mut self, id: &str, expected: Option<DocumentVersion>) -> Result<(), StoreError> {
        let current = self
            .documents
            .get(id)
            .ok_or_else(|| StoreError::not_found(format!("[{}]: document missing", id)))?;
        Self::check_version(current, id, expected)?;

        self.next_version();
        self.documents.remove(id);
        Ok(())
    }

    fn matches(body: &DocumentBody, query: Option<&Value>) -> Result<bool, StoreError> {
        let Some(query) = query else {
            return Ok(true);
        };
        if query.get("match_all").is_some() {
            return Ok(true);
        }
        if let Some(term) = query.get("term").and_then(Value::as_object) {
            let (field, expected) = term
                .iter()
                .next()
                .ok_or_else(|| StoreError::request("term query names no field"))?;
            let expected = expected.get("value").unwrap_or(expected);
            return Ok(body.get(field) == Some(expected));
        }
        Err(StoreError::request(format!(
            "unsupported query: {}",
            query
        )))
    }
}

/// Recursively merge `patch` into `target`. Objects merge key by key; any
/// other value replaces what was there.
pub fn deep_merge(target: &mut DocumentBody, patch: &DocumentBody) {
    for (key, value) in patch {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

fn index_missing(name: &str) -> StoreError {
    StoreError::not_found(format!("no such index [{}]", name))
}

/// In-memory document store backed by a HashMap of collections.
///
/// Clone-friendly via Arc; clones share the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<String, MemoryCollection>>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStoreClient for InMemoryStore {
    async fn collection_exists(&self, name: &str, kind: &str) -> Result<bool, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(name)
            .map(|collection| collection.kind == kind)
            .unwrap_or(false))
    }

    async fn create_collection(&self, name: &str, schema: &Value) -> Result<bool, StoreError> {
        let mappings = schema.get("mappings").cloned().unwrap_or_else(|| json!({}));
        let kind = kind_of(&mappings)
            .ok_or_else(|| StoreError::request("mappings carry no kind"))?
            .to_string();
        let properties = mappings
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            return Err(StoreError::already_exists(format!(
                "index [{}] already exists",
                name
            )));
        }
        collections.insert(
            name.to_string(),
            MemoryCollection {
                kind,
                properties,
                documents: BTreeMap::new(),
                seq_no: -1,
            },
        );
        Ok(true)
    }

    async fn put_schema(
        &self,
        name: &str,
        kind: &str,
        schema: &Value,
    ) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(name)
            .filter(|collection| collection.kind == kind)
            .ok_or_else(|| index_missing(name))?;

        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            for (field, declaration) in properties {
                collection
                    .properties
                    .insert(field.clone(), declaration.clone());
            }
        }
        Ok(true)
    }

    async fn collection_info(&self, name: &str) -> Result<Value, StoreError> {
        let collections = self.collections.read().await;
        let collection = collections.get(name).ok_or_else(|| index_missing(name))?;

        Ok(json!({
            name: {
                "mappings": {
                    "_meta": { KIND_META_KEY: collection.kind },
                    "properties": collection.properties
                },
                "settings": {
                    "index": { "number_of_shards": "1", "number_of_replicas": "0" }
                }
            }
        }))
    }

    async fn list_collections(&self) -> Result<Vec<CollectionSummary>, StoreError> {
        let collections = self.collections.read().await;
        let mut summaries: Vec<CollectionSummary> = collections
            .iter()
            .map(|(name, collection)| CollectionSummary {
                name: name.clone(),
                health: Some("green".to_string()),
                status: Some("open".to_string()),
                docs_count: Some(collection.documents.len() as u64),
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }

    async fn exists(&self, collection: &CollectionId, id: &str) -> Result<bool, StoreError> {
        let collections = self.collections.read().await;
        let stored = collections
            .get(&collection.name)
            .ok_or_else(|| index_missing(&collection.name))?;
        Ok(stored.documents.contains_key(id))
    }

    async fn get(
        &self,
        collection: &CollectionId,
        id: &str,
    ) -> Result<StoredDocument, StoreError> {
        let collections = self.collections.read().await;
        let stored = collections
            .get(&collection.name)
            .ok_or_else(|| index_missing(&collection.name))?;
        let document = stored
            .documents
            .get(id)
            .ok_or_else(|| StoreError::not_found(format!("[{}]: document missing", id)))?;

        Ok(StoredDocument {
            id: id.to_string(),
            version: document.version,
            body: document.body.clone(),
        })
    }

    async fn create(
        &self,
        collection: &CollectionId,
        id: &str,
        body: &DocumentBody,
    ) -> Result<DocumentVersion, StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .get_mut(&collection.name)
            .ok_or_else(|| index_missing(&collection.name))?
            .create(id, body.clone())
    }

    async fn update(
        &self,
        collection: &CollectionId,
        id: &str,
        update: &Value,
        expected_version: DocumentVersion,
    ) -> Result<DocumentVersion, StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .get_mut(&collection.name)
            .ok_or_else(|| index_missing(&collection.name))?
            .update(id, update, Some(expected_version))
    }

    async fn delete(
        &self,
        collection: &CollectionId,
        id: &str,
        expected_version: DocumentVersion,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .get_mut(&collection.name)
            .ok_or_else(|| index_missing(&collection.name))?
            .delete(id, Some(expected_version))
    }

    async fn count(
        &self,
        collection: &CollectionId,
        query: Option<&Value>,
    ) -> Result<u64, StoreError> {
        let collections = self.collections.read().await;
        let stored = collections
            .get(&collection.name)
            .ok_or_else(|| index_missing(&collection.name))?;

        let mut count = 0;
        for document in stored.documents.values() {
            if MemoryCollection::matches(&document.body, query)? {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn bulk(&self, actions: &[BulkAction]) -> Result<BulkResponse, StoreError> {
        let mut collections = self.collections.write().await;
        let mut response = BulkResponse::default();

        for action in actions {
            let result = match collections.get_mut(&action.collection.name) {
                None => Err(index_missing(&action.collection.name)),
                Some(stored) => match action.op {
                    BulkOp::Create => match action.body.as_ref().and_then(Value::as_object) {
                        Some(body) => stored.create(&action.id, body.clone()).map(|_| ()),
                        None => Err(StoreError::request("create action carries no document")),
                    },
                    BulkOp::Update => match action.body.as_ref() {
                        Some(update) => stored.update(&action.id, update, None).map(|_| ()),
                        None => Err(StoreError::request("update action carries no body")),
                    },
                    BulkOp::Delete => stored.delete(&action.id, None),
                },
            };

            match result {
                Ok(()) => response.success_count += 1,
                Err(e) => response.errors.push(BulkItemError {
                    id: action.id.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        Ok(response)
    }

    async fn multi_get(
        &self,
        collection: &CollectionId,
        ids: &[String],
    ) -> Result<Vec<MultiGetItem>, StoreError> {
        let collections = self.collections.read().await;
        let stored = collections
            .get(&collection.name)
            .ok_or_else(|| index_missing(&collection.name))?;

        Ok(ids
            .iter()
            .map(|id| MultiGetItem {
                id: id.clone(),
                body: stored.documents.get(id).map(|document| document.body.clone()),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{body, people_store};

    #[test]
    fn test_deep_merge_nested_objects() {
        let mut target = body(json!({ "a": 1, "nested": { "x": 1, "y": 2 }, "list": [1, 2] }));
        deep_merge(
            &mut target,
            &body(json!({ "b": 2, "nested": { "y": 3 }, "list": [3] })),
        );

        assert_eq!(
            Value::Object(target),
            json!({ "a": 1, "b": 2, "nested": { "x": 1, "y": 3 }, "list": [3] })
        );
    }

    #[tokio::test]
    async fn test_versions_increase_on_every_write() {
        let (store, people) = people_store().await;

        let created = store
            .create(&people, "1", &body(json!({ "name": "a" })))
            .await
            .unwrap();
        let updated = store
            .update(&people, "1", &json!({ "doc": { "name": "b" } }), created)
            .await
            .unwrap();

        assert!(updated > created);
        assert_eq!(store.get(&people, "1").await.unwrap().version, updated);
    }

    #[tokio::test]
    async fn test_create_existing_document_conflicts() {
        let (store, people) = people_store().await;
        store
            .create(&people, "1", &body(json!({ "name": "a" })))
            .await
            .unwrap();

        let err = store
            .create(&people, "1", &body(json!({ "name": "b" })))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict(_)));
    }

    #[tokio::test]
    async fn test_create_collection_twice() {
        let (store, _) = people_store().await;
        let err = store
            .create_collection(
                "people",
                &json!({ "mappings": { "_meta": { "kind": "person" } } }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_count_with_term_query() {
        let (store, people) = people_store().await;
        for (id, city) in [("1", "Oslo"), ("2", "Bergen"), ("3", "Oslo")] {
            store
                .create(&people, id, &body(json!({ "city": city })))
                .await
                .unwrap();
        }

        assert_eq!(store.count(&people, None).await.unwrap(), 3);
        let oslo = json!({ "term": { "city": "Oslo" } });
        assert_eq!(store.count(&people, Some(&oslo)).await.unwrap(), 2);
        let unsupported = json!({ "match": { "city": "Oslo" } });
        assert!(store.count(&people, Some(&unsupported)).await.is_err());
    }

    #[tokio::test]
    async fn test_bulk_reports_failed_items() {
        let (store, people) = people_store().await;
        store
            .create(&people, "1", &body(json!({ "name": "a" })))
            .await
            .unwrap();

        let actions = vec![
            BulkAction {
                op: BulkOp::Delete,
                collection: people.clone(),
                id: "1".to_string(),
                body: None,
            },
            BulkAction {
                op: BulkOp::Delete,
                collection: people.clone(),
                id: "2".to_string(),
                body: None,
            },
        ];
        let response = store.bulk(&actions).await.unwrap();

        assert_eq!(response.success_count, 1);
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].id, "2");
    }

    #[tokio::test]
    async fn test_put_schema_and_info() {
        let (store, _) = people_store().await;
        store
            .put_schema(
                "people",
                "person",
                &json!({ "properties": { "age": { "type": "integer" } } }),
            )
            .await
            .unwrap();

        let info = store.collection_info("people").await.unwrap();
        assert_eq!(info["people"]["mappings"]["_meta"]["kind"], "person");
        assert_eq!(
            info["people"]["mappings"]["properties"]["age"]["type"],
            "integer"
        );

        let wrong_kind = store
            .put_schema("people", "company", &json!({ "properties": {} }))
            .await;
        assert!(matches!(wrong_kind, Err(StoreError::NotFound(_))));
    }
}
