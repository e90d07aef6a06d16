//! Import and export of quote files
//!
//! Export writes a pretty-printed JSON array. Import is all-or-nothing:
//! one bad element rejects the whole file.

use serde_json::Value;

use crate::error::{QuoteError, Result};
use crate::models::Quote;

/// Default export file name
pub const EXPORT_FILE_NAME: &str = "quotes.json";

/// Serialize quotes as a JSON array with 2-space indentation
pub fn export_json(quotes: &[Quote]) -> Result<String> {
    Ok(serde_json::to_string_pretty(quotes)?)
}

/// Parse and validate an import payload
///
/// The payload must be a JSON array whose elements all carry non-empty
/// `text` and `category` strings. Values are trimmed.
pub fn parse_import(content: &str) -> Result<Vec<Quote>> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| QuoteError::MalformedImport(format!("not valid JSON: {}", e)))?;

    let Value::Array(items) = value else {
        return Err(QuoteError::MalformedImport(
            "expected an array of quotes".to_string(),
        ));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let text = string_field(item, "text");
            let category = string_field(item, "category");
            match (text, category) {
                (Some(text), Some(category)) => Ok(Quote::new(text, category)),
                _ => Err(QuoteError::MalformedImport(format!(
                    "entry {} must have non-empty text and category",
                    i
                ))),
            }
        })
        .collect()
}

fn string_field<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_uses_two_space_indent() {
        let json = export_json(&[Quote::new("A", "X")]).unwrap();
        assert_eq!(
            json,
            "[\n  {\n    \"text\": \"A\",\n    \"category\": \"X\"\n  }\n]"
        );
    }

    #[test]
    fn test_export_then_import() {
        let quotes = vec![Quote::new("A", "X"), Quote::new("B", "Y")];
        let parsed = parse_import(&export_json(&quotes).unwrap()).unwrap();
        assert_eq!(parsed, quotes);
    }

    #[test]
    fn test_import_rejects_empty_category() {
        let err = parse_import(r#"[{"text":"Q","category":""}]"#).unwrap_err();
        assert!(matches!(err, QuoteError::MalformedImport(_)));
    }

    #[test]
    fn test_import_rejects_non_array() {
        let err = parse_import(r#"{"text":"Q","category":"C"}"#).unwrap_err();
        match err {
            QuoteError::MalformedImport(msg) => assert!(msg.contains("array")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_import_names_offending_entry() {
        let err = parse_import(r#"[{"text":"ok","category":"C"},{"text":"missing"}]"#)
            .unwrap_err();
        assert!(err.to_string().contains("entry 1"));
    }

    #[test]
    fn test_import_rejects_wrong_types_and_garbage() {
        assert!(parse_import(r#"[{"text":5,"category":"C"}]"#).is_err());
        assert!(parse_import("not json").is_err());
    }

    #[test]
    fn test_import_ignores_extra_fields() {
        let quotes = parse_import(r#"[{"text":" Q ","category":"C","author":"me"}]"#).unwrap();
        assert_eq!(quotes, vec![Quote::new("Q", "C")]);
    }

    #[test]
    fn test_import_empty_array_is_ok() {
        assert!(parse_import("[]").unwrap().is_empty());
    }
}
