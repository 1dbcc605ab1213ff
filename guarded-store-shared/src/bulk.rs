use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::CollectionId;

/// Kind of write carried by a bulk action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkOp {
    Create,
    Update,
    Delete,
}

impl BulkOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkOp::Create => "create",
            BulkOp::Update => "update",
            BulkOp::Delete => "delete",
        }
    }
}

impl fmt::Display for BulkOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a bulk request.
///
/// `body` holds the full document for creates and the `{"doc": ...}` envelope
/// for updates. Deletes carry no body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkAction {
    pub op: BulkOp,
    pub collection: CollectionId,
    pub id: String,
    pub body: Option<Value>,
}
