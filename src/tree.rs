//! Content tree values and path addressing
//!
//! Every document format is handled as a [`ContentTree`]: a tagged value of
//! `Null | Bool | Number | String | Array | Object` whose object keys keep
//! their insertion order. Locations inside a tree are addressed with a
//! [`TreePath`], a sequence of key and index segments, and read or written
//! with [`get_at`] / [`set_at`].

use serde_json::Value;
use std::fmt;

/// A structured document value (structured text, Markdown AST, HTML AST, record)
pub type ContentTree = Value;

/// One step into a [`ContentTree`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Ordered segments from the root of a tree to one of its nodes
pub type TreePath = Vec<PathSegment>;

/// Parse a dotted path such as `blocks.0.title.en`
///
/// Purely numeric components become index segments. Empty components are dropped.
pub fn parse_dotted(path: &str) -> TreePath {
    path.split('.')
        .filter(|part| !part.is_empty())
        .map(|part| match part.parse::<usize>() {
            Ok(index) => PathSegment::Index(index),
            Err(_) => PathSegment::Key(part.to_string()),
        })
        .collect()
}

/// Render a path back to its dotted form
pub fn to_dotted(path: &[PathSegment]) -> String {
    path.iter()
        .map(|segment| segment.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// Deep-get: the node at `path`, if every segment resolves
pub fn get_at<'a>(tree: &'a ContentTree, path: &[PathSegment]) -> Option<&'a ContentTree> {
    path.iter().try_fold(tree, |node, segment| match (segment, node) {
        (PathSegment::Key(key), Value::Object(map)) => map.get(key),
        (PathSegment::Index(index), Value::Array(items)) => items.get(*index),
        // Records coming from form state sometimes key arrays by string index
        (PathSegment::Index(index), Value::Object(map)) => map.get(&index.to_string()),
        _ => None,
    })
}

/// Deep-set: write `value` at `path`, creating intermediate objects as needed
///
/// Returns `false` when the path runs through a scalar or past the end of an
/// array, in which case the tree is left unchanged.
pub fn set_at(tree: &mut ContentTree, path: &[PathSegment], value: ContentTree) -> bool {
    let Some((last, parents)) = path.split_last() else {
        *tree = value;
        return true;
    };

    let mut node = tree;
    for segment in parents {
        if node.is_null() {
            *node = Value::Object(serde_json::Map::new());
        }
        node = match (segment, node) {
            (PathSegment::Key(key), Value::Object(map)) => {
                map.entry(key.clone()).or_insert(Value::Null)
            }
            (PathSegment::Index(index), Value::Array(items)) => match items.get_mut(*index) {
                Some(item) => item,
                None => return false,
            },
            (PathSegment::Index(index), Value::Object(map)) => {
                map.entry(index.to_string()).or_insert(Value::Null)
            }
            _ => return false,
        };
    }

    if node.is_null() {
        *node = Value::Object(serde_json::Map::new());
    }
    match (last, node) {
        (PathSegment::Key(key), Value::Object(map)) => {
            map.insert(key.clone(), value);
            true
        }
        (PathSegment::Index(index), Value::Array(items)) if *index < items.len() => {
            items[*index] = value;
            true
        }
        (PathSegment::Index(index), Value::Object(map)) => {
            map.insert(index.to_string(), value);
            true
        }
        _ => false,
    }
}

/// Whether two trees have the same shape: same keys, same array lengths and
/// same node kinds at every level. String contents are not compared.
pub fn same_shape(left: &ContentTree, right: &ContentTree) -> bool {
    match (left, right) {
        (Value::Null, Value::Null)
        | (Value::Bool(_), Value::Bool(_))
        | (Value::Number(_), Value::Number(_))
        | (Value::String(_), Value::String(_)) => true,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_shape(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| same_shape(x, y)))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_dotted_mixes_keys_and_indexes() {
        assert_eq!(
            parse_dotted("blocks.0.title.en"),
            vec![
                PathSegment::from("blocks"),
                PathSegment::from(0),
                PathSegment::from("title"),
                PathSegment::from("en"),
            ]
        );
        assert_eq!(to_dotted(&parse_dotted("a.1.b")), "a.1.b");
    }

    #[test]
    fn test_get_at_nested() {
        let tree = json!({"a": [{"b": "x"}, {"b": "y"}]});
        assert_eq!(get_at(&tree, &parse_dotted("a.1.b")), Some(&json!("y")));
        assert_eq!(get_at(&tree, &parse_dotted("a.2.b")), None);
        assert_eq!(get_at(&tree, &parse_dotted("a.b")), None);
    }

    #[test]
    fn test_set_at_replaces_leaf() {
        let mut tree = json!({"a": [{"b": "x"}]});
        assert!(set_at(&mut tree, &parse_dotted("a.0.b"), json!("z")));
        assert_eq!(tree, json!({"a": [{"b": "z"}]}));
    }

    #[test]
    fn test_set_at_creates_missing_objects() {
        let mut tree = json!({});
        assert!(set_at(&mut tree, &parse_dotted("title.fr"), json!("Bonjour")));
        assert_eq!(tree, json!({"title": {"fr": "Bonjour"}}));
    }

    #[test]
    fn test_set_at_refuses_out_of_range_index() {
        let mut tree = json!({"a": ["x"]});
        assert!(!set_at(&mut tree, &parse_dotted("a.3"), json!("y")));
        assert_eq!(tree, json!({"a": ["x"]}));
    }

    #[test]
    fn test_set_at_refuses_to_descend_into_scalars() {
        let mut tree = json!({"a": "x"});
        assert!(!set_at(&mut tree, &parse_dotted("a.b"), json!("y")));
    }

    #[test]
    fn test_same_shape_ignores_string_contents() {
        let a = json!({"t": "Hello", "n": [1, {"x": null}]});
        let b = json!({"t": "Bonjour", "n": [2, {"x": null}]});
        assert!(same_shape(&a, &b));
        assert!(!same_shape(&a, &json!({"t": "Hello", "n": [1]})));
        assert!(!same_shape(&a, &json!({"t": 1, "n": [1, {"x": null}]})));
    }
}
