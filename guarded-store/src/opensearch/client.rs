//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `DocumentStoreClient`
//! using the OpenSearch Rust client. Each trait method is one HTTP request
//! (two for `collection_exists`); retries belong to the guard layer.

use std::time::Duration;

use async_trait::async_trait;
use guarded_store_shared::{BulkAction, CollectionId, DocumentBody, DocumentVersion, StoredDocument};
use opensearch::{
    cat::CatIndicesParts,
    http::{
        request::JsonBody,
        response::Response,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
    indices::{
        IndicesCreateParts, IndicesExistsParts, IndicesGetMappingParts, IndicesGetParts,
        IndicesPutMappingParts,
    },
    BulkParts, CountParts, CreateParts, DeleteParts, ExistsParts, GetParts, MgetParts, OpenSearch,
    UpdateParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::errors::StoreError;
use crate::interfaces::DocumentStoreClient;
use crate::opensearch::payloads;
use crate::types::{BulkResponse, CollectionSummary, MultiGetItem};

/// OpenSearch-backed document store.
///
/// Collections map to indices; the collection kind is stored in the index
/// mapping under `_meta.kind`. Document versions are the pair
/// (`_seq_no`, `_primary_term`), and conditional writes send both.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use guarded_store::{GuardedDocumentStore, OpenSearchStore};
///
/// let backend = OpenSearchStore::new("http://localhost:9200", Duration::from_secs(30))?;
/// let store = GuardedDocumentStore::new(Arc::new(backend));
/// ```
pub struct OpenSearchStore {
    client: OpenSearch,
}

impl OpenSearchStore {
    /// Create a new store client for the node at `url`.
    ///
    /// No request is sent; an unreachable node surfaces on the first call.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `request_timeout` - Per-request timeout; expiry is reported as `StoreError::Timeout`
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchStore)` - A new client instance
    /// * `Err(StoreError::ConnectionError)` - If the URL or transport is invalid
    pub fn new(url: &str, request_timeout: Duration) -> Result<Self, StoreError> {
        let parsed_url = Url::parse(url).map_err(|e| StoreError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .timeout(request_timeout)
            .build()
            .map_err(|e| StoreError::connection(e.to_string()))?;

        info!(
            url = %url,
            timeout_ms = request_timeout.as_millis() as u64,
            "Created OpenSearch store client"
        );

        Ok(Self {
            client: OpenSearch::new(transport),
        })
    }

    /// Classify a transport-level failure.
    fn transport_error(context: &str, err: opensearch::Error) -> StoreError {
        if err.is_timeout() {
            StoreError::timeout(format!("{}: {}", context, err))
        } else {
            StoreError::connection(format!("{}: {}", context, err))
        }
    }

    /// Classify a non-2xx response by status code.
    async fn status_error(context: &str, response: Response) -> StoreError {
        let status = response.status_code();
        let error_body = response.text().await.unwrap_or_default();
        let message = format!("{} failed with status {}: {}", context, status, error_body);

        match status.as_u16() {
            404 => StoreError::not_found(message),
            409 => StoreError::version_conflict(message),
            408 | 504 => StoreError::timeout(message),
            400 if error_body.contains("resource_already_exists_exception") => {
                StoreError::already_exists(message)
            }
            _ => {
                error!(status = %status, body = %error_body, "{} request failed", context);
                StoreError::request(message)
            }
        }
    }

    /// Send-side result to a JSON body, mapping every failure to a `StoreError`.
    async fn json_body(
        context: &str,
        sent: Result<Response, opensearch::Error>,
    ) -> Result<Value, StoreError> {
        let response = sent.map_err(|e| Self::transport_error(context, e))?;
        if !response.status_code().is_success() {
            return Err(Self::status_error(context, response).await);
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| StoreError::parse(format!("{}: {}", context, e)))
    }

    /// For HEAD requests: 2xx is true, 404 is false.
    async fn presence(
        context: &str,
        sent: Result<Response, opensearch::Error>,
    ) -> Result<bool, StoreError> {
        let response = sent.map_err(|e| Self::transport_error(context, e))?;
        let status = response.status_code();
        if status.is_success() {
            Ok(true)
        } else if status.as_u16() == 404 {
            Ok(false)
        } else {
            Err(Self::status_error(context, response).await)
        }
    }
}

#[async_trait]
impl DocumentStoreClient for OpenSearchStore {
    #[instrument(skip(self))]
    async fn collection_exists(&self, name: &str, kind: &str) -> Result<bool, StoreError> {
        let sent = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[name]))
            .send()
            .await;
        if !Self::presence("index exists", sent).await? {
            return Ok(false);
        }

        let sent = self
            .client
            .indices()
            .get_mapping(IndicesGetMappingParts::Index(&[name]))
            .send()
            .await;
        let mapping = Self::json_body("get mapping", sent).await?;
        let stored_kind = payloads::kind_from_mapping_response(&mapping);

        debug!(stored_kind = ?stored_kind, "Checked index kind");
        Ok(stored_kind.as_deref() == Some(kind))
    }

    #[instrument(skip(self, schema))]
    async fn create_collection(&self, name: &str, schema: &Value) -> Result<bool, StoreError> {
        let sent = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(name))
            .body(schema.clone())
            .send()
            .await;
        let response = Self::json_body("create index", sent).await?;

        info!("Index created");
        Ok(payloads::acknowledged(&response))
    }

    #[instrument(skip(self, schema))]
    async fn put_schema(
        &self,
        name: &str,
        kind: &str,
        schema: &Value,
    ) -> Result<bool, StoreError> {
        let sent = self
            .client
            .indices()
            .put_mapping(IndicesPutMappingParts::Index(&[name]))
            .body(schema.clone())
            .send()
            .await;
        let response = Self::json_body("put mapping", sent).await?;

        Ok(payloads::acknowledged(&response))
    }

    #[instrument(skip(self))]
    async fn collection_info(&self, name: &str) -> Result<Value, StoreError> {
        let sent = self
            .client
            .indices()
            .get(IndicesGetParts::Index(&[name]))
            .send()
            .await;
        Self::json_body("get index", sent).await
    }

    #[instrument(skip(self))]
    async fn list_collections(&self) -> Result<Vec<CollectionSummary>, StoreError> {
        let sent = self
            .client
            .cat()
            .indices(CatIndicesParts::None)
            .format("json")
            .send()
            .await;
        let rows = Self::json_body("cat indices", sent).await?;
        payloads::parse_cat_indices(&rows)
    }

    #[instrument(skip(self, collection), fields(collection = %collection))]
    async fn exists(&self, collection: &CollectionId, id: &str) -> Result<bool, StoreError> {
        let sent = self
            .client
            .exists(ExistsParts::IndexId(&collection.name, id))
            .send()
            .await;
        Self::presence("document exists", sent).await
    }

    #[instrument(skip(self, collection), fields(collection = %collection))]
    async fn get(
        &self,
        collection: &CollectionId,
        id: &str,
    ) -> Result<StoredDocument, StoreError> {
        let sent = self
            .client
            .get(GetParts::IndexId(&collection.name, id))
            .send()
            .await;
        let response = Self::json_body("get document", sent).await?;
        payloads::parse_stored_document(id, &response)
    }

    #[instrument(skip(self, body, collection), fields(collection = %collection))]
    async fn create(
        &self,
        collection: &CollectionId,
        id: &str,
        body: &DocumentBody,
    ) -> Result<DocumentVersion, StoreError> {
        let sent = self
            .client
            .create(CreateParts::IndexId(&collection.name, id))
            .body(body.clone())
            .send()
            .await;
        let response = Self::json_body("create document", sent).await?;

        debug!("Document created");
        payloads::parse_version(&response)
    }

    #[instrument(skip(self, update, collection, expected_version),
        fields(collection = %collection, expected = %expected_version)
    )]
    async fn update(
        &self,
        collection: &CollectionId,
        id: &str,
        update: &Value,
        expected_version: DocumentVersion,
    ) -> Result<DocumentVersion, StoreError> {
        let sent = self
            .client
            .update(UpdateParts::IndexId(&collection.name, id))
            .if_seq_no(expected_version.seq_no)
            .if_primary_term(expected_version.primary_term)
            .body(update.clone())
            .send()
            .await;
        let response = Self::json_body("update document", sent).await?;

        debug!("Document updated");
        payloads::parse_version(&response)
    }

    #[instrument(skip(self, collection, expected_version),
        fields(collection = %collection, expected = %expected_version)
    )]
    async fn delete(
        &self,
        collection: &CollectionId,
        id: &str,
        expected_version: DocumentVersion,
    ) -> Result<(), StoreError> {
        let sent = self
            .client
            .delete(DeleteParts::IndexId(&collection.name, id))
            .if_seq_no(expected_version.seq_no)
            .if_primary_term(expected_version.primary_term)
            .send()
            .await;
        Self::json_body("delete document", sent).await?;

        debug!("Document deleted");
        Ok(())
    }

    #[instrument(skip(self, query, collection), fields(collection = %collection))]
    async fn count(
        &self,
        collection: &CollectionId,
        query: Option<&Value>,
    ) -> Result<u64, StoreError> {
        let sent = self
            .client
            .count(CountParts::Index(&[collection.name.as_str()]))
            .body(payloads::count_body(query))
            .send()
            .await;
        let response = Self::json_body("count", sent).await?;

        response
            .get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| StoreError::parse("count response has no count"))
    }

    #[instrument(skip(self, actions), fields(actions = actions.len()))]
    async fn bulk(&self, actions: &[BulkAction]) -> Result<BulkResponse, StoreError> {
        let lines: Vec<JsonBody<Value>> = payloads::bulk_lines(actions)
            .into_iter()
            .map(JsonBody::new)
            .collect();

        let sent = self.client.bulk(BulkParts::None).body(lines).send().await;
        let response = Self::json_body("bulk", sent).await?;
        let parsed = payloads::parse_bulk_response(&response)?;

        debug!(
            succeeded = parsed.success_count,
            failed = parsed.errors.len(),
            "Bulk request executed"
        );
        Ok(parsed)
    }

    #[instrument(skip(self, ids, collection), fields(collection = %collection, ids = ids.len()))]
    async fn multi_get(
        &self,
        collection: &CollectionId,
        ids: &[String],
    ) -> Result<Vec<MultiGetItem>, StoreError> {
        let sent = self
            .client
            .mget(MgetParts::Index(&collection.name))
            .body(json!({ "ids": ids }))
            .send()
            .await;
        let response = Self::json_body("mget", sent).await?;
        payloads::parse_multi_get(&response)
    }
}
