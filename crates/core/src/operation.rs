//! Operation kinds and the record kept per pending document

use crate::document::Document;
use crate::error::QueueError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Kind of write intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OpKind {
    /// Document is new
    Create,
    /// Partial change to a document
    Update,
    /// Document is going away
    Delete,
}

impl OpKind {
    /// Wire name of the kind
    pub const fn as_str(&self) -> &'static str {
        match self {
            OpKind::Create => "CREATE",
            OpKind::Update => "UPDATE",
            OpKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpKind {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(OpKind::Create),
            "UPDATE" => Ok(OpKind::Update),
            "DELETE" => Ok(OpKind::Delete),
            other => Err(QueueError::UnsupportedOperation(other.to_string())),
        }
    }
}

/// Net operation waiting to be flushed for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOperation {
    #[serde(rename = "operation")]
    pub kind: OpKind,
    #[serde(rename = "doc")]
    pub document: Document,
    /// Opaque caller data, last writer wins
    #[serde(rename = "metaData", default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl PendingOperation {
    pub fn new(kind: OpKind, document: Document, metadata: Option<Value>) -> Self {
        Self {
            kind,
            document,
            metadata,
        }
    }
}
