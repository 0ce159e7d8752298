//! Translation backend trait and utilities
//!
//! This module defines the `TranslationBackend` trait that every provider
//! (mock, Yandex, DeepL, OpenAI) implements, the per-call
//! [`TranslationRequest`], and [`for_options`], which picks the backend the
//! options ask for.
//!
//! # Example
//!
//! ```ignore
//! use cms_translate::backend::{for_options, TranslationRequest};
//! use cms_translate::options::TranslationOptions;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = TranslationOptions::new("en", "fr").with_mock();
//!     let backend = for_options(&options)?;
//!     let request = TranslationRequest::new(options, false);
//!
//!     let result = backend.translate("Hello", &request).await?;
//!     println!("{}", result); // "Translated Hello"
//!     Ok(())
//! }
//! ```

use crate::backend::deepl::{DeeplPlan, DeeplProvider};
use crate::backend::mock::{MockBackend, MockMode};
use crate::backend::openai::OpenAIProvider;
use crate::backend::yandex::YandexProvider;
use crate::error::{TranslateError, TranslateResult};
use crate::options::{TranslationOptions, TranslationService};
use crate::tree::ContentTree;
use async_trait::async_trait;
use std::sync::Arc;

/// Generic trait for text translation providers
///
/// Implementations translate one string per call. Format translators fan
/// leaves out concurrently, so implementations must be `Send + Sync`.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Translate a single text string as described by `request`
    ///
    /// # Arguments
    ///
    /// * `text` - The text to translate
    /// * `request` - Locales, provider settings and currency handling for this call
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The translated text
    /// * `Err(TranslateError)` - If the provider rejects the call or its reply is unusable
    async fn translate(&self, text: &str, request: &TranslationRequest) -> TranslateResult<String>;

    /// Name of this provider, used in logs
    fn provider_name(&self) -> &str;
}

/// The record a field belongs to, offered to providers as context
#[derive(Debug, Clone, PartialEq)]
pub struct FieldContext {
    /// Machine name of the field being translated
    pub api_key: String,
    /// Snapshot of the whole record being edited
    pub record: ContentTree,
}

/// Per-call inputs shared by every leaf of one document translation
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRequest {
    pub options: TranslationOptions,
    /// Rewrite currency amounts into the target locale's currency
    pub convert_currency: bool,
    pub field: Option<FieldContext>,
}

impl TranslationRequest {
    pub fn new(options: TranslationOptions, convert_currency: bool) -> Self {
        Self {
            options,
            convert_currency,
            field: None,
        }
    }

    pub fn with_field(mut self, api_key: &str, record: ContentTree) -> Self {
        self.field = Some(FieldContext {
            api_key: api_key.to_string(),
            record,
        });
        self
    }

    pub fn from_locale(&self) -> &str {
        &self.options.from_locale
    }

    pub fn to_locale(&self) -> &str {
        &self.options.to_locale
    }
}

/// Build the backend `options` select
///
/// Mock mode wins over the configured service. Fails with a configuration
/// error when no service is selected or the provider's API key is empty.
pub fn for_options(options: &TranslationOptions) -> TranslateResult<Arc<dyn TranslationBackend>> {
    let backend: Arc<dyn TranslationBackend> = match options.effective_service() {
        Some(TranslationService::Mock) => Arc::new(MockBackend::new(MockMode::Prefix)),
        Some(TranslationService::Yandex) => Arc::new(YandexProvider::new(options.api_key.clone())?),
        Some(TranslationService::Deepl) => {
            Arc::new(DeeplProvider::new(options.api_key.clone(), DeeplPlan::Pro)?)
        }
        Some(TranslationService::DeeplFree) => {
            Arc::new(DeeplProvider::new(options.api_key.clone(), DeeplPlan::Free)?)
        }
        Some(TranslationService::OpenAI) => Arc::new(OpenAIProvider::new(options.api_key.clone())?),
        None => {
            return Err(TranslateError::Configuration(
                "No translation service added in the settings".to_string(),
            ));
        }
    };
    Ok(backend)
}

/// Validate that a locale code is in acceptable format
///
/// Checks that the locale code contains only alphanumeric characters,
/// hyphens, and underscores.
pub fn validate_locale(locale: &str) -> TranslateResult<()> {
    if locale.is_empty() {
        return Err(TranslateError::InvalidLocale(
            "Locale code is empty".to_string(),
        ));
    }

    if !locale
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(TranslateError::InvalidLocale(format!(
            "Invalid characters in locale code: {}",
            locale
        )));
    }

    Ok(())
}

/// Map a non-success provider status onto the crate error
///
/// A rejected API key is still a remote failure; only a missing key is a
/// configuration error.
pub(crate) fn status_error(provider: &str, status: reqwest::StatusCode, body: &str) -> TranslateError {
    TranslateError::RemoteService(format!("{} request failed ({}): {}", provider, status, body))
}
