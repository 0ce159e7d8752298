use crate::error::{TranslateError, TranslateResult};
use crate::format::DocumentTranslator;
use crate::tree::ContentTree;
use serde_json::Value;

impl DocumentTranslator {
    /// Translate the `title` and `description` of an SEO object
    ///
    /// Both are translated concurrently. Empty strings stay empty and null
    /// stays null; `image`, `twitter_card` and any other key are copied.
    pub async fn translate_seo(&self, seo: &ContentTree) -> TranslateResult<ContentTree> {
        let map = match seo {
            Value::Null => return Ok(Value::Null),
            Value::Object(map) => map,
            other => {
                return Err(TranslateError::Parse(format!("SEO value must be an object, got {}", other)));
            }
        };

        let (title, description) = futures::try_join!(
            self.translate_seo_entry(map.get("title")),
            self.translate_seo_entry(map.get("description")),
        )?;

        let mut translated = map.clone();
        if let Some(title) = title {
            translated.insert("title".to_string(), Value::String(title));
        }
        if let Some(description) = description {
            translated.insert("description".to_string(), Value::String(description));
        }
        Ok(Value::Object(translated))
    }

    async fn translate_seo_entry(&self, value: Option<&Value>) -> TranslateResult<Option<String>> {
        match value.and_then(Value::as_str) {
            Some(text) if !text.is_empty() => Ok(Some(self.translate_text(text).await?)),
            _ => Ok(None),
        }
    }
}
