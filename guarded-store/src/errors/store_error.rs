//! Store error types.
//!
//! Errors reported by a `DocumentStoreClient` backend. The guard layer
//! translates them into `GuardError` values for callers.

use thiserror::Error;

/// Errors that can occur while talking to the underlying document store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The request timed out. This is the only kind the guard layer retries.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The addressed document does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A conditional write was rejected because the document version moved.
    #[error("Version conflict: {0}")]
    VersionConflict(String),

    /// The collection being created already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Failed to establish a connection to the store.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The store rejected or failed the request.
    #[error("Request error: {0}")]
    RequestError(String),

    /// Failed to parse a response from the store.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl StoreError {
    /// Create a timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a version conflict error.
    pub fn version_conflict(msg: impl Into<String>) -> Self {
        Self::VersionConflict(msg.into())
    }

    /// Create an already exists error.
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a request error.
    pub fn request(msg: impl Into<String>) -> Self {
        Self::RequestError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
