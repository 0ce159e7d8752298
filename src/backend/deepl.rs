//! DeepL provider (Pro and Free plans)
//!
//! Both plans share the `/v2/translate` API and differ only in host. Requests
//! carry the glossary id and formality level from [`DeeplOptions`].
//!
//! [`DeeplOptions`]: crate::options::DeeplOptions

use crate::backend::translator::{TranslationBackend, TranslationRequest, status_error, validate_locale};
use crate::error::{TranslateError, TranslateResult};
use crate::options::Formality;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// DeepL subscription plan, which decides the API host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeeplPlan {
    Pro,
    Free,
}

impl DeeplPlan {
    fn base_url(&self) -> &'static str {
        match self {
            DeeplPlan::Pro => "https://api.deepl.com/v2/translate",
            DeeplPlan::Free => "https://api-free.deepl.com/v2/translate",
        }
    }

    fn env_var(&self) -> &'static str {
        match self {
            DeeplPlan::Pro => "DEEPL_API_KEY",
            DeeplPlan::Free => "DEEPL_FREE_API_KEY",
        }
    }
}

#[derive(Debug, Serialize)]
struct DeeplRequest<'a> {
    text: [&'a str; 1],
    source_lang: &'a str,
    target_lang: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    glossary_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    formality: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct DeeplResponse {
    translations: Vec<DeeplTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeeplTranslation {
    text: String,
}

/// DeepL API provider
#[derive(Clone)]
pub struct DeeplProvider {
    api_key: String,
    plan: DeeplPlan,
    client: reqwest::Client,
    base_url: String,
}

impl DeeplProvider {
    pub fn new(api_key: String, plan: DeeplPlan) -> TranslateResult<Self> {
        if api_key.trim().is_empty() {
            return Err(TranslateError::Configuration(
                "DeepL API key cannot be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| TranslateError::RemoteService(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            plan,
            client,
            base_url: plan.base_url().to_string(),
        })
    }

    /// Create a provider from `DEEPL_API_KEY` or `DEEPL_FREE_API_KEY`
    pub fn from_env(plan: DeeplPlan) -> TranslateResult<Self> {
        let api_key = std::env::var(plan.env_var()).map_err(|_| {
            TranslateError::Configuration(format!("{} environment variable not set", plan.env_var()))
        })?;
        Self::new(api_key, plan)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    fn build_body<'a>(text: &'a str, request: &'a TranslationRequest) -> DeeplRequest<'a> {
        let deepl = &request.options.deepl_options;
        DeeplRequest {
            text: [text],
            source_lang: request.from_locale(),
            target_lang: request.to_locale(),
            glossary_id: deepl.glossary_id.as_deref().filter(|id| !id.is_empty()),
            // DeepL rejects an explicit formality for languages without one
            formality: match deepl.formality {
                Formality::Default => None,
                other => Some(other.as_str()),
            },
        }
    }
}

impl std::fmt::Debug for DeeplProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeeplProvider")
            .field("api_key", &"***")
            .field("plan", &self.plan)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl TranslationBackend for DeeplProvider {
    async fn translate(&self, text: &str, request: &TranslationRequest) -> TranslateResult<String> {
        validate_locale(request.from_locale())?;
        validate_locale(request.to_locale())?;

        if text.is_empty() {
            return Ok(String::new());
        }

        let body = Self::build_body(text, request);
        debug!(
            provider = self.provider_name(),
            source = body.source_lang,
            target = body.target_lang,
            chars = text.len(),
            "translating"
        );

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error(self.provider_name(), status, &error_text));
        }

        let parsed: DeeplResponse = response.json().await.map_err(|e| {
            TranslateError::RemoteService(format!("Failed to parse DeepL response: {}", e))
        })?;

        parsed
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| {
                TranslateError::RemoteService(
                    "Invalid DeepL response: empty 'translations' array".to_string(),
                )
            })
    }

    fn provider_name(&self) -> &str {
        match self.plan {
            DeeplPlan::Pro => "DeepL",
            DeeplPlan::Free => "DeepL Free",
        }
    }
}
