//! Field schema lookups supplied by the host CMS
//!
//! The engine never loads schemas itself. Callers hand in something that can
//! answer "what kind of field is `api_key`?", which the classifier uses to skip
//! enum/select fields and to pick the right sub-translator for a string value.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Editor kind and validators of one CMS field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Editor appearance, e.g. `single_line`, `wysiwyg`, `markdown`
    #[serde(default)]
    pub editor: Option<String>,
    /// Raw validator configuration keyed by validator name
    #[serde(default)]
    pub validators: serde_json::Map<String, serde_json::Value>,
}

impl FieldSchema {
    pub fn with_editor(editor: &str) -> Self {
        Self {
            editor: Some(editor.to_string()),
            validators: serde_json::Map::new(),
        }
    }

    /// A field restricted to a fixed set of values (select / enum)
    pub fn enumeration(values: &[&str]) -> Self {
        let mut validators = serde_json::Map::new();
        validators.insert(
            "enum".to_string(),
            serde_json::json!({ "values": values }),
        );
        Self {
            editor: None,
            validators,
        }
    }

    pub fn is_enum(&self) -> bool {
        self.validators.contains_key("enum")
    }
}

/// Host collaborator answering field-schema questions by field API key
pub trait SchemaLookup: Send + Sync {
    fn field(&self, api_key: &str) -> Option<&FieldSchema>;
}

/// Lookup that knows no fields
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSchema;

impl SchemaLookup for NoSchema {
    fn field(&self, _api_key: &str) -> Option<&FieldSchema> {
        None
    }
}

impl SchemaLookup for HashMap<String, FieldSchema> {
    fn field(&self, api_key: &str) -> Option<&FieldSchema> {
        self.get(api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_detection() {
        assert!(FieldSchema::enumeration(&["red", "blue"]).is_enum());
        assert!(!FieldSchema::with_editor("single_line").is_enum());
    }

    #[test]
    fn test_map_lookup() {
        let mut fields = HashMap::new();
        fields.insert("colour".to_string(), FieldSchema::enumeration(&["red"]));
        assert!(fields.field("colour").is_some_and(FieldSchema::is_enum));
        assert!(fields.field("title").is_none());
        assert!(NoSchema.field("colour").is_none());
    }

    #[test]
    fn test_deserialize_from_host_shape() {
        let schema: FieldSchema = serde_json::from_str(
            r#"{"editor": "single_line", "validators": {"enum": {"values": ["a"]}}}"#,
        )
        .unwrap();
        assert_eq!(schema.editor.as_deref(), Some("single_line"));
        assert!(schema.is_enum());
    }
}
