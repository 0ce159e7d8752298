//! Record snapshot offered to the model as context
//!
//! Only a trimmed copy of the record leaves the process: the field being
//! translated is dropped, strings are cut short, and localized values are
//! reduced to their English entry.

use crate::tree::ContentTree;
use serde_json::{Map, Value};

/// Longest string kept verbatim in the snapshot
pub const MAX_CONTEXT_CHARS: usize = 50;

const ELLIPSIS: &str = "...";

/// Locale whose entry represents a localized value
const CONTEXT_LOCALE: &str = "en";

/// Trim `record` for use as model context, leaving out `field`
///
/// The top-level object is always kept (possibly empty). Nested objects
/// survive only as `{"en": ...}` when they carry an English entry.
pub fn trim_record(record: &ContentTree, field: &str) -> ContentTree {
    match record {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| key.as_str() != field)
                .filter_map(|(key, value)| trim_value(value).map(|v| (key.clone(), v)))
                .collect(),
        ),
        other => trim_value(other).unwrap_or(Value::Null),
    }
}

fn trim_value(value: &ContentTree) -> Option<ContentTree> {
    match value {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(Value::String(truncate(text))),
        Value::Bool(_) | Value::Number(_) => Some(value.clone()),
        Value::Object(map) => {
            let english = trim_value(map.get(CONTEXT_LOCALE)?)?;
            let mut collapsed = Map::new();
            collapsed.insert(CONTEXT_LOCALE.to_string(), english);
            Some(Value::Object(collapsed))
        }
        Value::Array(items) => {
            let kept: Vec<_> = items.iter().filter_map(trim_value).collect();
            (!kept.is_empty()).then_some(Value::Array(kept))
        }
    }
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_CONTEXT_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_drops_translated_field_and_empty_values() {
        let record = json!({"title": {"en": "Hi"}, "subtitle": "", "hero": null, "price": 10});
        assert_eq!(trim_record(&record, "title"), json!({"price": 10}));
    }

    #[test]
    fn test_truncates_long_strings() {
        let long = "a".repeat(60);
        let trimmed = trim_record(&json!({"body": long}), "title");
        assert_eq!(trimmed["body"], json!(format!("{}...", "a".repeat(50))));

        let exact = "b".repeat(50);
        assert_eq!(trim_record(&json!({"body": exact}), "x")["body"], json!("b".repeat(50)));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let text = "é".repeat(55);
        let trimmed = trim_record(&json!({"body": text}), "x");
        assert_eq!(trimmed["body"], json!(format!("{}...", "é".repeat(50))));
    }

    #[test]
    fn test_collapses_localized_objects_to_english() {
        let record = json!({
            "name": {"en": "Hotel", "fr": "Hôtel", "de": "Hotel"},
            "author": {"fr": "Jean"},
            "gallery": [{"en": "one", "it": "uno"}, {"it": "due"}]
        });
        assert_eq!(
            trim_record(&record, "title"),
            json!({"name": {"en": "Hotel"}, "gallery": [{"en": "one"}]})
        );
    }

    #[test]
    fn test_empty_english_entry_drops_object() {
        let record = json!({"name": {"en": "", "fr": "x"}, "tags": []});
        assert_eq!(trim_record(&record, "title"), json!({}));
    }
}
