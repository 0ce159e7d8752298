//! Translatable path discovery
//!
//! [`walk`] enumerates every candidate leaf or node of a content tree and tags
//! it with a [`PathType`] decided by [`classify`]. Translators then fetch each
//! node by path, translate it with the sub-translator its type calls for, and
//! merge the result back at the same path. Enumeration order carries no
//! meaning: consumers merge strictly by path.

use crate::schema::SchemaLookup;
use crate::tree::{ContentTree, PathSegment, TreePath};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which sub-translator handles a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathType {
    Text,
    Html,
    Markdown,
    StructuredText,
    StructuredTextBlock,
    Seo,
    Ignored,
}

/// A classified location in a content tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    pub path: TreePath,
    /// Name of the closest keyed segment (array elements report their array's key)
    pub key: String,
    pub path_type: PathType,
}

/// Keys holding literal text in structured text, HTML and Markdown ASTs
const TEXT_KEYS: &[&str] = &["text", "value"];

/// Identifier and structural keys whose values are never translation targets
const NON_TRANSLATABLE_KEYS: &[&str] = &[
    "id",
    "itemId",
    "itemTypeId",
    "blockModelId",
    "type",
    "url",
    "href",
    "src",
    "meta",
    "marks",
    "twitter_card",
    "image",
];

/// Attributes of typed structured-text nodes (`code.language`, `list.style`,
/// `link.target`...). The same names are ordinary fields on a record.
const NODE_ATTRIBUTE_KEYS: &[&str] = &["code", "language", "style", "target", "rel"];

const SEO_KEYS: &[&str] = &["title", "description", "image", "twitter_card", "no_index"];

const BLOCK_NODE_TYPES: &[&str] = &["block", "inlineBlock"];

/// Whether `key` can never lead to a translation target
pub fn is_excluded_key(key: &str, schema: &dyn SchemaLookup) -> bool {
    NON_TRANSLATABLE_KEYS.contains(&key) || schema.field(key).is_some_and(|f| f.is_enum())
}

/// Classify one node of a content tree
///
/// Priority: enum/select fields and identifier keys are `Ignored`; literal text
/// slots are `Text`; SEO-shaped objects are `Seo`; sequences of typed nodes are
/// `StructuredText`; block nodes inside such sequences are `StructuredTextBlock`.
/// Other strings are text unless the field editor says HTML or Markdown. Every
/// other shape is `Ignored`.
pub fn classify(key: Option<&str>, value: &ContentTree, schema: &dyn SchemaLookup) -> PathType {
    if let Some(key) = key {
        if is_excluded_key(key, schema) {
            return PathType::Ignored;
        }
    }
    let editor = key
        .and_then(|k| schema.field(k))
        .and_then(|f| f.editor.as_deref());

    match value {
        Value::String(text) => {
            if key.is_some_and(|k| TEXT_KEYS.contains(&k)) {
                return PathType::Text;
            }
            if looks_like_url(text) {
                return PathType::Ignored;
            }
            match editor {
                Some("wysiwyg") => PathType::Html,
                Some("markdown") => PathType::Markdown,
                _ => PathType::Text,
            }
        }
        Value::Object(map) => {
            if editor == Some("seo") || is_seo_shape(map) {
                PathType::Seo
            } else if is_block_node(map) {
                PathType::StructuredTextBlock
            } else {
                PathType::Ignored
            }
        }
        Value::Array(items) => {
            let structural_children = key == Some("children");
            if editor == Some("structured_text")
                || (!structural_children && is_typed_node_sequence(items))
            {
                PathType::StructuredText
            } else {
                PathType::Ignored
            }
        }
        _ => PathType::Ignored,
    }
}

fn looks_like_url(text: &str) -> bool {
    let trimmed = text.trim();
    (trimmed.starts_with("http://") || trimmed.starts_with("https://"))
        && !trimmed.contains(char::is_whitespace)
}

fn is_seo_shape(map: &serde_json::Map<String, Value>) -> bool {
    !map.is_empty()
        && map.keys().all(|k| SEO_KEYS.contains(&k.as_str()))
        && (map.contains_key("title") || map.contains_key("description"))
}

fn is_block_node(map: &serde_json::Map<String, Value>) -> bool {
    map.get("type")
        .and_then(Value::as_str)
        .is_some_and(|t| BLOCK_NODE_TYPES.contains(&t))
}

fn is_typed_node_sequence(items: &[Value]) -> bool {
    !items.is_empty()
        && items.iter().all(|item| {
            item.get("type").is_some_and(Value::is_string) && item.get("children").is_some()
        })
}

/// Enumerate every candidate node below the root of `tree`
///
/// Null and empty-string leaves are skipped. Nodes classified as `Seo`,
/// `StructuredText` or `StructuredTextBlock` are reported whole and not
/// descended into; their sub-translator owns their contents.
pub fn walk(tree: &ContentTree, schema: &dyn SchemaLookup) -> Vec<Path> {
    let mut paths = Vec::new();
    walk_children(tree, &mut Vec::new(), None, schema, &mut paths);
    paths
}

fn walk_children(
    node: &ContentTree,
    prefix: &mut TreePath,
    key: Option<&str>,
    schema: &dyn SchemaLookup,
    out: &mut Vec<Path>,
) {
    match node {
        Value::Object(map) => {
            let typed_node = map.get("type").is_some_and(Value::is_string);
            for (child_key, child) in map {
                let attribute = typed_node && NODE_ATTRIBUTE_KEYS.contains(&child_key.as_str());
                prefix.push(PathSegment::Key(child_key.clone()));
                visit(child, prefix, Some(child_key.as_str()), attribute, schema, out);
                prefix.pop();
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                prefix.push(PathSegment::Index(index));
                visit(child, prefix, key, false, schema, out);
                prefix.pop();
            }
        }
        _ => {}
    }
}

/// `node_attribute` marks a [`NODE_ATTRIBUTE_KEYS`] entry of a typed node
fn visit(
    node: &ContentTree,
    prefix: &mut TreePath,
    key: Option<&str>,
    node_attribute: bool,
    schema: &dyn SchemaLookup,
    out: &mut Vec<Path>,
) {
    match node {
        Value::Null => {}
        Value::String(text) if text.is_empty() => {}
        Value::String(_) => out.push(Path {
            path: prefix.clone(),
            key: key.unwrap_or_default().to_string(),
            path_type: if node_attribute {
                PathType::Ignored
            } else {
                classify(key, node, schema)
            },
        }),
        Value::Object(_) | Value::Array(_) => {
            if node_attribute || key.is_some_and(|k| is_excluded_key(k, schema)) {
                return;
            }
            match classify(key, node, schema) {
                PathType::Ignored => walk_children(node, prefix, key, schema, out),
                path_type => out.push(Path {
                    path: prefix.clone(),
                    key: key.unwrap_or_default().to_string(),
                    path_type,
                }),
            }
        }
        Value::Bool(_) | Value::Number(_) => {}
    }
}
