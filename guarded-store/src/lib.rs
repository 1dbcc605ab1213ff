//! # Guarded Store
//!
//! A guard layer over a search-engine document store. Every operation on a
//! collection is gated on the collection existing with the expected kind,
//! transient timeouts are retried with a fixed backoff, and single-document
//! writes use optimistic version control.
//!
//! The store itself is reached through [`DocumentStoreClient`]. This crate
//! ships an OpenSearch backend and an in-memory backend.

pub mod bulk;
pub mod client;
pub mod config;
pub mod documents;
pub mod errors;
pub mod gate;
pub mod interfaces;
pub mod memory;
pub mod opensearch;
pub mod retry;
pub mod schema;
pub mod types;
pub mod versioning;

#[cfg(test)]
mod testing;

pub use client::GuardedDocumentStore;
pub use config::GuardConfig;
pub use errors::{GuardError, StoreError};
pub use interfaces::DocumentStoreClient;
pub use memory::InMemoryStore;
pub use opensearch::OpenSearchStore;
pub use retry::RetryPolicy;
pub use types::{
    BulkItemError, BulkResponse, BulkSummary, CollectionSummary, MultiGetItem,
    OperationDescriptor, WriteOutcome,
};

pub use guarded_store_shared::{
    BulkAction, BulkOp, CollectionId, DocumentBody, DocumentVersion, FieldType, StoredDocument,
};
