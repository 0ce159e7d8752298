//! Yandex Translate provider
//!
//! Uses the v1.5 JSON API: one GET per string with `lang=<from>-<to>`.
//! The provider loads its key from `YANDEX_API_KEY` when built with
//! [`YandexProvider::from_env`].

use crate::backend::translator::{TranslationBackend, TranslationRequest, status_error, validate_locale};
use crate::error::{TranslateError, TranslateResult};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct YandexResponse {
    #[serde(default)]
    text: Vec<String>,
}

/// Yandex Translate API provider
#[derive(Clone)]
pub struct YandexProvider {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl YandexProvider {
    const DEFAULT_BASE_URL: &'static str = "https://translate.yandex.net/api/v1.5/tr.json/translate";

    /// Create a provider with an explicit API key
    ///
    /// Fails with a configuration error when the key is empty.
    pub fn new(api_key: String) -> TranslateResult<Self> {
        if api_key.trim().is_empty() {
            return Err(TranslateError::Configuration(
                "Yandex API key cannot be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| TranslateError::RemoteService(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            client,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Create a provider from the `YANDEX_API_KEY` environment variable
    pub fn from_env() -> TranslateResult<Self> {
        let api_key = std::env::var("YANDEX_API_KEY").map_err(|_| {
            TranslateError::Configuration("YANDEX_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key)
    }

    /// Point the provider at another endpoint (proxies, tests)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }
}

impl std::fmt::Debug for YandexProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YandexProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl TranslationBackend for YandexProvider {
    async fn translate(&self, text: &str, request: &TranslationRequest) -> TranslateResult<String> {
        validate_locale(request.from_locale())?;
        validate_locale(request.to_locale())?;

        if text.is_empty() {
            return Ok(String::new());
        }

        let lang = format!("{}-{}", request.from_locale(), request.to_locale());
        debug!(provider = "yandex", %lang, chars = text.len(), "translating");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("lang", lang.as_str()),
                ("text", text),
                ("format", "plain"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error("Yandex", status, &body));
        }

        let body: YandexResponse = response.json().await.map_err(|e| {
            TranslateError::RemoteService(format!("Failed to parse Yandex response: {}", e))
        })?;

        body.text.into_iter().next().ok_or_else(|| {
            TranslateError::RemoteService("Invalid Yandex response: missing 'text' array".to_string())
        })
    }

    fn provider_name(&self) -> &str {
        "Yandex"
    }
}
