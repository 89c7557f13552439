//! JSON-lines input
//!
//! One intent per line: `{"operation": "UPDATE", "doc": {...}, "metaData": ...}`.
//! Blank lines and lines starting with `#` are skipped.

use anyhow::{bail, Context, Result};
use opque::Document;
use serde::Deserialize;
use serde_json::Value;

/// One parsed input line
#[derive(Debug, Deserialize)]
pub struct Intent {
    pub operation: String,
    #[serde(default)]
    pub doc: Value,
    #[serde(rename = "metaData", default)]
    pub metadata: Option<Value>,
}

impl Intent {
    /// The document, which must be a JSON object
    pub fn into_parts(self) -> Result<(String, Document, Option<Value>)> {
        match self.doc {
            Value::Object(document) => Ok((self.operation, document, self.metadata)),
            Value::Null => bail!("missing \"doc\""),
            other => bail!("\"doc\" must be a JSON object, got {}", other),
        }
    }
}

/// Parse a line, `None` for blanks and comments
pub fn parse_line(line: &str) -> Result<Option<Intent>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let intent = serde_json::from_str(line).context("Invalid JSON")?;
    Ok(Some(intent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_line() {
        let intent = parse_line(r#"{"operation":"CREATE","doc":{"_id":1},"metaData":"Content"}"#)
            .unwrap()
            .unwrap();
        let (operation, document, metadata) = intent.into_parts().unwrap();
        assert_eq!(operation, "CREATE");
        assert_eq!(document["_id"], json!(1));
        assert_eq!(metadata, Some(json!("Content")));
    }

    #[test]
    fn test_skips_blank_and_comment_lines() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   ").unwrap().is_none());
        assert!(parse_line("# seed data").unwrap().is_none());
    }

    #[test]
    fn test_rejects_bad_lines() {
        assert!(parse_line("{not json").is_err());
        assert!(parse_line(r#"{"doc":{"_id":1}}"#).is_err());

        let no_doc = parse_line(r#"{"operation":"DELETE"}"#).unwrap().unwrap();
        assert!(no_doc.into_parts().is_err());

        let scalar_doc = parse_line(r#"{"operation":"DELETE","doc":5}"#).unwrap().unwrap();
        assert!(scalar_doc.into_parts().is_err());
    }
}
