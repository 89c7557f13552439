//! Deep merge for accumulating partial updates
//!
//! Objects merge field by field, recursively. Every other value (scalars,
//! arrays, `null`) coming from the incoming side replaces whatever was
//! stored under the same name. Fields the incoming side does not mention
//! are left untouched.

use crate::document::Document;
use serde_json::Value;

/// Merge `incoming` into `target`, incoming winning at the leaves
pub fn deep_merge(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(fields)) => merge_documents(existing, fields),
        (slot, value) => *slot = value,
    }
}

/// Merge the fields of `incoming` into `target`
pub fn merge_documents(target: &mut Document, incoming: Document) {
    for (key, value) in incoming {
        match target.get_mut(&key) {
            Some(slot) => deep_merge(slot, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}
