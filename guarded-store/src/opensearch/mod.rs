//! OpenSearch implementation of the document store client.
//!
//! This module provides a concrete implementation of `DocumentStoreClient`
//! using OpenSearch as the backend.

mod client;
mod payloads;

pub use client::OpenSearchStore;
