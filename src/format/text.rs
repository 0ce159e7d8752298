use crate::error::TranslateResult;
use crate::format::DocumentTranslator;
use tracing::debug;

impl DocumentTranslator {
    /// Translate a plain string with a single backend call
    pub async fn translate_text(&self, text: &str) -> TranslateResult<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }
        debug!(provider = self.backend.provider_name(), chars = text.len(), "translating leaf");
        self.backend.translate(text, &self.request).await
    }

    /// Translate the core of `text`, keeping its leading and trailing whitespace
    pub async fn translate_padded(&self, text: &str) -> TranslateResult<String> {
        let (leading, core, trailing) = split_padding(text);
        if core.is_empty() {
            return Ok(text.to_string());
        }
        let translated = self.translate_text(core).await?;
        Ok(format!("{}{}{}", leading, translated, trailing))
    }
}

/// `"  Hello world \n"` → `("  ", "Hello world", " \n")`
pub(crate) fn split_padding(text: &str) -> (&str, &str, &str) {
    let start = text.len() - text.trim_start().len();
    let end = text.trim_end().len().max(start);
    (&text[..start], &text[start..end], &text[end..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockBackend, MockMode, TranslationRequest};
    use crate::options::TranslationOptions;
    use std::sync::Arc;

    fn translator() -> DocumentTranslator {
        DocumentTranslator::new(
            Arc::new(MockBackend::new(MockMode::Prefix)),
            TranslationRequest::new(TranslationOptions::new("en", "fr"), false),
        )
    }

    #[test]
    fn test_split_padding() {
        assert_eq!(split_padding("  Hello world \n"), ("  ", "Hello world", " \n"));
        assert_eq!(split_padding("Hello"), ("", "Hello", ""));
        assert_eq!(split_padding("   "), ("   ", "", ""));
        assert_eq!(split_padding(""), ("", "", ""));
    }

    #[tokio::test]
    async fn test_plain_text() {
        assert_eq!(translator().translate_text("Hello").await.unwrap(), "Translated Hello");
    }

    #[tokio::test]
    async fn test_whitespace_is_not_sent() {
        let translator = DocumentTranslator::new(
            Arc::new(MockBackend::new(MockMode::Error("should not be called".to_string()))),
            TranslationRequest::new(TranslationOptions::new("en", "fr"), false),
        );
        assert_eq!(translator.translate_text(" \n ").await.unwrap(), " \n ");
    }

    #[tokio::test]
    async fn test_padding_survives() {
        assert_eq!(
            translator().translate_padded(" Hello \n").await.unwrap(),
            " Translated Hello \n"
        );
    }
}
