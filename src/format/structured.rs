//! Structured text and rich text translation
//!
//! Both formats are content trees translated path by path:
//!
//! 1. strip identifiers (`id` for structured text, keeping `meta` intact;
//!    `itemId` for rich text) with [`crate::sanitize::strip`]
//! 2. enumerate candidate nodes with [`walk`]
//! 3. translate every selected node concurrently with the sub-translator its
//!    [`PathType`] calls for, recursing into nested structured text and block
//!    nodes
//! 4. merge each result into the stripped copy at its path, then put the
//!    identifiers back with [`crate::sanitize::restore`]
//!
//! A block node is translated as a rich-text record with its `type` and
//! `children` set aside and reattached unchanged.

use crate::error::{TranslateError, TranslateResult};
use crate::format::DocumentTranslator;
use crate::paths::{PathType, walk};
use crate::sanitize::{self, StripRules};
use crate::tree::{ContentTree, TreePath, get_at, set_at};
use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use serde_json::Value;
use tracing::debug;

/// Identifiers removed from structured text; `meta` is copied verbatim
const STRUCTURED_RULES: StripRules<'static> = StripRules::new(&["id"], &["meta"]);

/// Record identifiers removed from rich text
const RICH_RULES: StripRules<'static> = StripRules::new(&["itemId"], &[]);

/// Structural keys of a block node, never sent for translation
const BLOCK_STRUCTURE: &[&str] = &["type", "children"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Structured,
    Rich,
}

impl Mode {
    fn rules(self) -> StripRules<'static> {
        match self {
            Mode::Structured => STRUCTURED_RULES,
            Mode::Rich => RICH_RULES,
        }
    }

    /// Whether a walked node is translated in this mode
    fn selects(self, path_type: PathType, key: &str) -> bool {
        match (self, path_type) {
            (_, PathType::Ignored) => false,
            (_, PathType::StructuredText | PathType::StructuredTextBlock) => true,
            (Mode::Structured, PathType::Text) => key == "text",
            (Mode::Structured, _) => false,
            (Mode::Rich, _) => true,
        }
    }
}

impl DocumentTranslator {
    /// Translate a structured-text value (a sequence of typed nodes)
    pub fn translate_structured_text<'a>(
        &'a self,
        document: &'a ContentTree,
    ) -> BoxFuture<'a, TranslateResult<ContentTree>> {
        self.translate_tree(document, Mode::Structured)
    }

    /// Translate a rich-text value (records, modular content, nested blocks)
    pub fn translate_rich_text<'a>(
        &'a self,
        document: &'a ContentTree,
    ) -> BoxFuture<'a, TranslateResult<ContentTree>> {
        self.translate_tree(document, Mode::Rich)
    }

    fn translate_tree<'a>(
        &'a self,
        document: &'a ContentTree,
        mode: Mode,
    ) -> BoxFuture<'a, TranslateResult<ContentTree>> {
        async move {
            if document.is_null() {
                return Ok(Value::Null);
            }
            let rules = mode.rules();
            let stripped = sanitize::strip(document, rules);

            let nodes: Vec<(TreePath, PathType, ContentTree)> = walk(&stripped, self.schema.as_ref())
                .into_iter()
                .filter(|path| mode.selects(path.path_type, &path.key))
                .filter_map(|path| {
                    let node = get_at(&stripped, &path.path)?.clone();
                    Some((path.path, path.path_type, node))
                })
                .collect();
            debug!(?mode, nodes = nodes.len(), "translating tree");

            let translated = try_join_all(nodes.into_iter().map(|(path, path_type, node)| {
                async move {
                    let value = self.translate_node(path_type, &node).await?;
                    Ok::<_, TranslateError>((path, value))
                }
                .boxed()
            }))
            .await?;

            let mut merged = stripped;
            for (path, value) in translated {
                set_at(&mut merged, &path, value);
            }
            Ok(sanitize::restore(document, merged, rules))
        }
        .boxed()
    }

    async fn translate_node(&self, path_type: PathType, node: &ContentTree) -> TranslateResult<ContentTree> {
        let Some(text) = node.as_str() else {
            return match path_type {
                PathType::Seo => self.translate_seo(node).await,
                PathType::StructuredText => self.translate_structured_text(node).await,
                PathType::StructuredTextBlock => self.translate_block(node).await,
                _ => Ok(node.clone()),
            };
        };
        let translated = match path_type {
            PathType::Html => self.translate_html(text).await?,
            PathType::Markdown => self.translate_markdown(text).await?,
            PathType::Text => self.translate_text(text).await?,
            _ => return Ok(node.clone()),
        };
        Ok(Value::String(translated))
    }

    async fn translate_block(&self, block: &ContentTree) -> TranslateResult<ContentTree> {
        let (record, structure) = sanitize::detach(block, BLOCK_STRUCTURE);
        let translated = self.translate_rich_text(&record).await?;
        Ok(sanitize::reattach(block, translated, structure))
    }
}
