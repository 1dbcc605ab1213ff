//! Interface definitions for the document store client.
//!
//! This module defines the abstract `DocumentStoreClient` trait that the guard
//! layer drives, so backends can be swapped (OpenSearch, in-memory, mocks).

mod document_store_client;

pub use document_store_client::DocumentStoreClient;
