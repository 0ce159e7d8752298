//! Translate structured CMS content between locales
//!
//! A document is one of plain text, HTML, Markdown, an SEO record, a URL
//! slug, structured text or rich text. Each format is decomposed into the
//! strings worth translating, those strings are sent concurrently to a
//! [`backend::TranslationBackend`], and the results are merged back into a
//! document of the same shape.
//!
//! ```ignore
//! use cms_translate::format::translate;
//! use cms_translate::options::{TranslationFormat, TranslationOptions};
//! use serde_json::json;
//!
//! let options = TranslationOptions::new("en", "fr")
//!     .with_format(TranslationFormat::Html)
//!     .with_mock();
//! let html = translate(&json!("<p>Hello</p>"), &options, false).await?;
//! assert_eq!(html, json!("<p>Translated Hello</p>"));
//! ```

pub mod backend;
pub mod error;
pub mod field;
pub mod format;
pub mod options;
pub mod paths;
pub mod sanitize;
pub mod schema;
pub mod settings;
pub mod tree;

pub use backend::{TranslationBackend, TranslationRequest};
pub use error::{TranslateError, TranslateResult};
pub use field::{FieldOutcome, FieldTranslationSession};
pub use format::{DocumentTranslator, translate};
pub use options::{TranslationFormat, TranslationOptions, TranslationService};
pub use paths::{Path, PathType, classify, walk};
pub use tree::{ContentTree, PathSegment, TreePath};
