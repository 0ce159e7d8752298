//! Format translators
//!
//! [`DocumentTranslator`] turns one document into its translation for one
//! target locale. Each format is decomposed, its literal-text leaves are sent
//! to the backend concurrently, and the results are merged back by path into
//! a fresh copy of the document:
//!
//! | Format | Decomposition |
//! |---|---|
//! | text | none, one backend call |
//! | html | html5ever DOM (scraper), text nodes outside `script`/`style` |
//! | markdown | pulldown-cmark event tree, merged text runs outside code |
//! | seo | `title` and `description` |
//! | slug | hyphens to spaces, translate, re-slugify |
//! | structured text / rich text | [`crate::paths::walk`] with per-type dispatch |
//!
//! Any leaf failure fails the whole document; nothing partially translated is
//! returned.

pub mod html;
pub mod markdown;
pub mod seo;
pub mod slug;
pub mod structured;
pub mod text;


use crate::backend::{self, TranslationBackend, TranslationRequest};
use crate::error::{TranslateError, TranslateResult};
use crate::options::{TranslationFormat, TranslationOptions};
use crate::paths::{PathType, walk};
use crate::schema::{NoSchema, SchemaLookup};
use crate::tree::{ContentTree, PathSegment, TreePath, get_at, set_at};
use futures::future::try_join_all;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Translates documents of any format for one `from → to` request
#[derive(Clone)]
pub struct DocumentTranslator {
    backend: Arc<dyn TranslationBackend>,
    request: Arc<TranslationRequest>,
    schema: Arc<dyn SchemaLookup>,
}

impl DocumentTranslator {
    pub fn new(backend: Arc<dyn TranslationBackend>, request: TranslationRequest) -> Self {
        Self {
            backend,
            request: Arc::new(request),
            schema: Arc::new(NoSchema),
        }
    }

    /// Translator using the backend the options select
    pub fn for_options(options: TranslationOptions, convert_currency: bool) -> TranslateResult<Self> {
        let backend = backend::for_options(&options)?;
        Ok(Self::new(backend, TranslationRequest::new(options, convert_currency)))
    }

    /// Field schemas used to skip enum/select fields in rich text
    pub fn with_schema(mut self, schema: Arc<dyn SchemaLookup>) -> Self {
        self.schema = schema;
        self
    }

    pub fn request(&self) -> &TranslationRequest {
        &self.request
    }

    pub fn format(&self) -> TranslationFormat {
        self.request.options.format
    }

    /// Translate `document` according to the options' format
    pub async fn translate_document(&self, document: &ContentTree) -> TranslateResult<ContentTree> {
        let format = self.format();
        info!(
            provider = self.backend.provider_name(),
            from = self.request.from_locale(),
            to = self.request.to_locale(),
            ?format,
            "translating document"
        );

        if format.is_string() {
            let text = match document {
                Value::Null => return Ok(Value::Null),
                Value::String(text) => text,
                other => {
                    return Err(TranslateError::Parse(format!(
                        "{:?} documents must be strings, got {}",
                        format, other
                    )));
                }
            };
            let translated = match format {
                TranslationFormat::Html => self.translate_html(text).await?,
                TranslationFormat::Markdown => self.translate_markdown(text).await?,
                TranslationFormat::Slug => self.translate_slug(text).await?,
                _ => self.translate_text(text).await?,
            };
            return Ok(Value::String(translated));
        }

        match format {
            TranslationFormat::Seo => self.translate_seo(document).await,
            TranslationFormat::StructuredText => self.translate_structured_text(document).await,
            _ => self.translate_rich_text(document).await,
        }
    }

    /// Translate the string leaves at `leaves` and merge them into `tree`
    ///
    /// Leaves that are not strings or hold only whitespace are left as they are.
    /// Surrounding whitespace of each leaf survives translation.
    pub(crate) async fn translate_leaves(
        &self,
        mut tree: ContentTree,
        leaves: Vec<TreePath>,
    ) -> TranslateResult<ContentTree> {
        let jobs: Vec<_> = leaves
            .into_iter()
            .filter_map(|path| {
                let text = get_at(&tree, &path)?.as_str()?.to_string();
                (!text.trim().is_empty()).then_some((path, text))
            })
            .collect();

        let translated = try_join_all(jobs.into_iter().map(|(path, text)| async move {
            let output = self.translate_padded(&text).await?;
            Ok::<_, TranslateError>((path, output))
        }))
        .await?;

        for (path, text) in translated {
            set_at(&mut tree, &path, Value::String(text));
        }
        Ok(tree)
    }
}

impl std::fmt::Debug for DocumentTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentTranslator")
            .field("backend", &self.backend.provider_name())
            .field("request", &self.request)
            .finish()
    }
}

/// Paths of the `field` entries of AST nodes whose `kind_key` is `kind`
///
/// Used for the Markdown outline (`type: "text"` / `value`).
pub(crate) fn text_leaves(tree: &ContentTree, field: &str, kind_key: &str, kind: &str) -> Vec<TreePath> {
    walk(tree, &NoSchema)
        .into_iter()
        .filter(|path| path.path_type == PathType::Text && path.key == field)
        .filter(|path| {
            matches!(path.path.last(), Some(PathSegment::Key(key)) if key == field)
                && get_at(tree, &path.path[..path.path.len() - 1])
                    .and_then(|node| node.get(kind_key))
                    .and_then(Value::as_str)
                    == Some(kind)
        })
        .map(|path| path.path)
        .collect()
}

/// Translate `document` from `options.from_locale` to `options.to_locale`
///
/// Dispatches on `options.format` and uses the backend the options select.
pub async fn translate(
    document: &ContentTree,
    options: &TranslationOptions,
    convert_currency: bool,
) -> TranslateResult<ContentTree> {
    DocumentTranslator::for_options(options.clone(), convert_currency)?
        .translate_document(document)
        .await
}
