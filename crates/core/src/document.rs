//! Documents and their coalescing keys

use crate::error::QueueError;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::fmt;

/// A document is an arbitrary JSON object
///
/// No schema is enforced beyond the presence of the identifier field.
pub type Document = Map<String, Value>;

/// Coalescing key taken from a document's identifier field
///
/// Strings are used verbatim, every other value by its compact JSON text,
/// so `1` and `"1"` address the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Derive an id from an identifier value
    ///
    /// Returns `None` for `null`, which counts as absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(Self(s.clone())),
            other => Some(Self(other.to_string())),
        }
    }

    /// Extract the id stored at `field`
    pub fn extract(document: &Document, field: &str) -> Result<Self> {
        document
            .get(field)
            .and_then(Self::from_value)
            .ok_or_else(|| QueueError::MissingIdentifier(field.to_string()))
    }

    /// Textual form of the id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for DocumentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test documents must be objects"),
        }
    }

    #[test]
    fn test_extract_string_id() {
        let id = DocumentId::extract(&doc(json!({"_id": "abc", "v": 1})), "_id").unwrap();
        assert_eq!(id.as_str(), "abc");
    }

    #[test]
    fn test_numeric_and_string_ids_collide() {
        let numeric = DocumentId::extract(&doc(json!({"_id": 1})), "_id").unwrap();
        let text = DocumentId::extract(&doc(json!({"_id": "1"})), "_id").unwrap();
        assert_eq!(numeric, text);
    }

    #[test]
    fn test_missing_identifier() {
        let err = DocumentId::extract(&doc(json!({"value": 3})), "_id").unwrap_err();
        assert_eq!(err, QueueError::MissingIdentifier("_id".to_string()));
    }

    #[test]
    fn test_null_identifier_is_absent() {
        let err = DocumentId::extract(&doc(json!({"_id": null})), "_id").unwrap_err();
        assert!(matches!(err, QueueError::MissingIdentifier(_)));
    }

    #[test]
    fn test_falsy_values_are_present() {
        assert_eq!(
            DocumentId::extract(&doc(json!({"_id": 0})), "_id").unwrap().as_str(),
            "0"
        );
        assert_eq!(
            DocumentId::extract(&doc(json!({"_id": false})), "_id").unwrap().as_str(),
            "false"
        );
        assert_eq!(
            DocumentId::extract(&doc(json!({"_id": ""})), "_id").unwrap().as_str(),
            ""
        );
    }
}
