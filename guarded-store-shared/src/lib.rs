//! # Guarded Store Shared
//!
//! Data types shared between the guarded document store and its consumers:
//! collection identity, the recognised field types, document versions and
//! bulk action descriptors.

mod bulk;
mod collection;
mod document;

pub use bulk::{BulkAction, BulkOp};
pub use collection::{CollectionId, FieldType};
pub use document::{DocumentBody, DocumentVersion, StoredDocument};
