//! Mock translation backend for testing
//!
//! Deterministic, API-free backend for exercising the format translators
//! without API keys or network access. [`MockMode::Prefix`] is what mock mode
//! in the settings selects; the other modes exist for tests.
//!
//! # Example
//!
//! ```ignore
//! use cms_translate::backend::{MockBackend, MockMode, TranslationBackend, TranslationRequest};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockBackend::new(MockMode::Prefix);
//!     let request = TranslationRequest::new(TranslationOptions::new("en", "fr"), false);
//!     let result = mock.translate("Hello", &request).await.unwrap();
//!     assert_eq!(result, "Translated Hello");
//! }
//! ```

use crate::backend::translator::{TranslationBackend, TranslationRequest};
use crate::error::{TranslateError, TranslateResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// "Hello" → "Translated Hello"
    Prefix,

    /// Predefined translations keyed by (text, target_locale), falling back to `Prefix`
    Mappings(HashMap<(String, String), String>),

    /// Fail every call with a remote service error
    Error(String),

    /// Return input unchanged
    NoOp,
}

/// Mock backend that simulates provider behaviour
#[derive(Debug, Clone)]
pub struct MockBackend {
    mode: MockMode,
    /// Optional simulated network delay (in milliseconds)
    delay_ms: u64,
}

impl MockBackend {
    pub fn new(mode: MockMode) -> Self {
        Self { mode, delay_ms: 0 }
    }

    /// Create a MockBackend with simulated network delay
    ///
    /// ```ignore
    /// let mock = MockBackend::with_delay(MockMode::Prefix, 50);
    /// // Each translation will have ~50ms delay
    /// ```
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self { mode, delay_ms }
    }

    async fn apply_delay(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    fn apply_translation(&self, text: &str, target: &str) -> TranslateResult<String> {
        match &self.mode {
            MockMode::Prefix => Ok(format!("Translated {}", text)),
            MockMode::Mappings(map) => {
                let key = (text.to_string(), target.to_string());
                Ok(map
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| format!("Translated {}", text)))
            }
            MockMode::Error(msg) => Err(TranslateError::RemoteService(msg.clone())),
            MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    async fn translate(&self, text: &str, request: &TranslationRequest) -> TranslateResult<String> {
        self.apply_delay().await;
        self.apply_translation(text, request.to_locale())
    }

    fn provider_name(&self) -> &str {
        "Mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TranslationOptions;

    fn request(to: &str) -> TranslationRequest {
        TranslationRequest::new(TranslationOptions::new("en", to), false)
    }

    #[tokio::test]
    async fn test_prefix_mode() {
        let mock = MockBackend::new(MockMode::Prefix);
        let result = mock.translate("Hello", &request("fr")).await.unwrap();
        assert_eq!(result, "Translated Hello");
    }

    #[tokio::test]
    async fn test_mappings_mode() {
        let mut map = HashMap::new();
        map.insert(
            ("Hello".to_string(), "fr".to_string()),
            "Bonjour".to_string(),
        );
        let mock = MockBackend::new(MockMode::Mappings(map));

        assert_eq!(mock.translate("Hello", &request("fr")).await.unwrap(), "Bonjour");
        assert_eq!(
            mock.translate("Hello", &request("de")).await.unwrap(),
            "Translated Hello"
        );
    }

    #[tokio::test]
    async fn test_error_mode() {
        let mock = MockBackend::new(MockMode::Error("quota exceeded".to_string()));
        let result = mock.translate("Hello", &request("fr")).await;
        assert_eq!(
            result,
            Err(TranslateError::RemoteService("quota exceeded".to_string()))
        );
    }

    #[tokio::test]
    async fn test_noop_mode() {
        let mock = MockBackend::new(MockMode::NoOp);
        assert_eq!(mock.translate("Hello", &request("fr")).await.unwrap(), "Hello");
    }

    #[tokio::test]
    async fn test_delay() {
        let mock = MockBackend::with_delay(MockMode::Prefix, 20);
        let start = std::time::Instant::now();
        mock.translate("Hello", &request("fr")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
