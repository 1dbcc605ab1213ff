use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A document body: field name to JSON value.
pub type DocumentBody = Map<String, Value>;

/// Version the store assigns to a document on every write.
///
/// Ordered by primary term first, then by sequence number, which matches how
/// the search engine orders writes across primary changes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct DocumentVersion {
    pub primary_term: i64,
    pub seq_no: i64,
}

impl DocumentVersion {
    pub fn new(seq_no: i64, primary_term: i64) -> Self {
        Self {
            primary_term,
            seq_no,
        }
    }
}

impl fmt::Display for DocumentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seq_no={}, primary_term={}", self.seq_no, self.primary_term)
    }
}

/// A document as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub version: DocumentVersion,
    pub body: DocumentBody,
}
