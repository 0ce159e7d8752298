//! HTML fragments, translated text node by text node
//!
//! The fragment is parsed with scraper (html5ever) in a `<body>` context. The
//! DOM is walked in document order and every non-blank text node outside
//! `script` and `style` is a leaf. Leaves are translated concurrently, written
//! into a fresh parse of the same input and the fragment is serialized back.

use crate::error::TranslateResult;
use crate::format::DocumentTranslator;
use crate::tree::PathSegment;
use scraper::{Html, Node};
use serde_json::Value;

/// Elements whose text content is never translated
fn is_skip_element(name: &str) -> bool {
    matches!(name, "script" | "style" | "noscript" | "template")
}

fn is_translatable<'a>(node: &Node, mut ancestors: impl Iterator<Item = &'a Node>) -> bool {
    let Some(text) = node.as_text() else {
        return false;
    };
    !text.trim().is_empty()
        && !ancestors.any(|ancestor| {
            ancestor
                .as_element()
                .is_some_and(|element| is_skip_element(element.name()))
        })
}

/// Text of every translatable node, in document order
fn text_nodes(html: &str) -> Vec<Value> {
    let fragment = Html::parse_fragment(html);
    fragment
        .tree
        .root()
        .descendants()
        .filter(|node| is_translatable(node.value(), node.ancestors().map(|a| a.value())))
        .filter_map(|node| node.value().as_text().map(|text| Value::String(text.to_string())))
        .collect()
}

/// Parse `html` again, replace its translatable text nodes with `texts` and
/// serialize the fragment
fn write_back(html: &str, texts: &[Value]) -> String {
    let mut fragment = Html::parse_fragment(html);
    let ids: Vec<_> = fragment
        .tree
        .root()
        .descendants()
        .filter(|node| is_translatable(node.value(), node.ancestors().map(|a| a.value())))
        .map(|node| node.id())
        .collect();

    for (id, text) in ids.into_iter().zip(texts) {
        let (Some(mut node), Some(text)) = (fragment.tree.get_mut(id), text.as_str()) else {
            continue;
        };
        if let Node::Text(current) = node.value() {
            current.text = text.into();
        }
    }
    fragment.root_element().inner_html()
}

impl DocumentTranslator {
    /// Translate the text nodes of an HTML fragment
    ///
    /// Tags, attributes, comments and `script`/`style` content are left as
    /// parsed. The markup is normalized the way html5ever serializes it.
    pub async fn translate_html(&self, html: &str) -> TranslateResult<String> {
        if html.trim().is_empty() {
            return Ok(html.to_string());
        }
        // The DOM is not `Send`, so it is rebuilt after the backend calls.
        let texts = text_nodes(html);
        if texts.is_empty() {
            return Ok(html.to_string());
        }
        let leaves = (0..texts.len()).map(|i| vec![PathSegment::Index(i)]).collect();
        let translated = self.translate_leaves(Value::Array(texts), leaves).await?;
        let texts = match translated {
            Value::Array(texts) => texts,
            _ => Vec::new(),
        };
        Ok(write_back(html, &texts))
    }
}
