//! Identifier and structural field handling around translation
//!
//! Identifiers (`itemId`, `id`) must never reach a translation backend but
//! must come back byte-for-byte, and block nodes are translated as plain
//! records with their `type`/`children` set aside. Everything here is
//! copy-on-write: inputs are never mutated.

use crate::tree::ContentTree;
use serde_json::{Map, Value};

/// Keys dropped before and restored after a translation pass
#[derive(Debug, Clone, Copy)]
pub struct StripRules<'a> {
    /// Removed at every nesting level
    pub keys_to_remove: &'a [&'a str],
    /// Containers copied verbatim, nothing inside them is removed
    pub keys_to_skip: &'a [&'a str],
}

impl<'a> StripRules<'a> {
    pub const fn new(keys_to_remove: &'a [&'a str], keys_to_skip: &'a [&'a str]) -> Self {
        Self {
            keys_to_remove,
            keys_to_skip,
        }
    }
}

/// Deep copy of `tree` without any property named in `rules.keys_to_remove`
pub fn strip(tree: &ContentTree, rules: StripRules<'_>) -> ContentTree {
    match tree {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !rules.keys_to_remove.contains(&key.as_str()))
                .map(|(key, value)| {
                    let value = if rules.keys_to_skip.contains(&key.as_str()) {
                        value.clone()
                    } else {
                        strip(value, rules)
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|item| strip(item, rules)).collect()),
        other => other.clone(),
    }
}

/// Put back everything [`strip`] removed from `original`
///
/// Walks `original` and `translated` side by side. Removed properties are
/// copied from `original` at their original position in key order; every other
/// property comes from `translated`. Where the two trees disagree in kind or
/// length, `translated` is returned as is.
pub fn restore(original: &ContentTree, translated: ContentTree, rules: StripRules<'_>) -> ContentTree {
    match (original, translated) {
        (Value::Object(source), Value::Object(mut done)) => {
            let mut merged = Map::with_capacity(source.len());
            for (key, source_value) in source {
                if rules.keys_to_remove.contains(&key.as_str()) {
                    merged.insert(key.clone(), source_value.clone());
                } else if let Some(value) = done.remove(key) {
                    let value = if rules.keys_to_skip.contains(&key.as_str()) {
                        value
                    } else {
                        restore(source_value, value, rules)
                    };
                    merged.insert(key.clone(), value);
                }
            }
            merged.extend(done);
            Value::Object(merged)
        }
        (Value::Array(source), Value::Array(done)) if source.len() == done.len() => Value::Array(
            source
                .iter()
                .zip(done)
                .map(|(source_item, item)| restore(source_item, item, rules))
                .collect(),
        ),
        (_, translated) => translated,
    }
}

/// Split the top-level `keys` off an object node
///
/// Returns the remaining record and the detached properties. Non-object nodes
/// are returned unchanged with nothing detached.
pub fn detach(node: &ContentTree, keys: &[&str]) -> (ContentTree, Map<String, Value>) {
    match node {
        Value::Object(map) => {
            let mut rest = Map::with_capacity(map.len());
            let mut detached = Map::new();
            for (key, value) in map {
                if keys.contains(&key.as_str()) {
                    detached.insert(key.clone(), value.clone());
                } else {
                    rest.insert(key.clone(), value.clone());
                }
            }
            (Value::Object(rest), detached)
        }
        other => (other.clone(), Map::new()),
    }
}

/// Reverse of [`detach`], keeping the key order of `original`
pub fn reattach(
    original: &ContentTree,
    translated: ContentTree,
    mut detached: Map<String, Value>,
) -> ContentTree {
    let (Value::Object(source), Value::Object(mut done)) = (original, translated.clone()) else {
        return translated;
    };
    let mut merged = Map::with_capacity(source.len());
    for key in source.keys() {
        if let Some(value) = detached.remove(key).or_else(|| done.remove(key)) {
            merged.insert(key.clone(), value);
        }
    }
    merged.extend(done);
    Value::Object(merged)
}
