//! Translation options shared by every format and backend
//!
//! Field names follow the camelCase wire shape the host CMS stores
//! (`fromLocale`, `openAIOptions`, ...), so an options blob can be passed
//! through unchanged.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Translation provider selected in the settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TranslationService {
    #[serde(rename = "mock")]
    Mock,
    #[serde(rename = "yandex")]
    Yandex,
    #[serde(rename = "deepl")]
    Deepl,
    #[serde(rename = "deeplFree")]
    DeeplFree,
    #[serde(rename = "openAI")]
    OpenAI,
}

impl TranslationService {
    /// Every selectable service, in settings order (the first one is the default)
    pub const ALL: [TranslationService; 4] = [
        TranslationService::Yandex,
        TranslationService::Deepl,
        TranslationService::DeeplFree,
        TranslationService::OpenAI,
    ];

    /// Human-readable name used in settings and error messages
    pub fn label(&self) -> &'static str {
        match self {
            TranslationService::Mock => "Mock",
            TranslationService::Yandex => "Yandex",
            TranslationService::Deepl => "DeepL",
            TranslationService::DeeplFree => "DeepL Free",
            TranslationService::OpenAI => "OpenAI",
        }
    }

    /// Environment variable a provider reads its key from
    pub fn env_var(&self) -> Option<&'static str> {
        match self {
            TranslationService::Mock => None,
            TranslationService::Yandex => Some("YANDEX_API_KEY"),
            TranslationService::Deepl => Some("DEEPL_API_KEY"),
            TranslationService::DeeplFree => Some("DEEPL_FREE_API_KEY"),
            TranslationService::OpenAI => Some("OPENAI_API_KEY"),
        }
    }

    /// Parse the CLI spelling (`mock`, `yandex`, `deepl`, `deepl-free`, `openai`)
    pub fn from_cli_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "mock" => Some(TranslationService::Mock),
            "yandex" => Some(TranslationService::Yandex),
            "deepl" => Some(TranslationService::Deepl),
            "deepl-free" | "deeplfree" => Some(TranslationService::DeeplFree),
            "openai" => Some(TranslationService::OpenAI),
            _ => None,
        }
    }
}

/// Document format, which picks the format translator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TranslationFormat {
    #[default]
    Text,
    Html,
    Markdown,
    Seo,
    Slug,
    StructuredText,
    RichText,
}

impl TranslationFormat {
    /// Map a field editor appearance to the format it stores
    pub fn from_editor(editor: &str) -> Option<Self> {
        match editor {
            "single_line" | "textarea" => Some(TranslationFormat::Text),
            "wysiwyg" => Some(TranslationFormat::Html),
            "markdown" => Some(TranslationFormat::Markdown),
            "seo" => Some(TranslationFormat::Seo),
            "slug" => Some(TranslationFormat::Slug),
            "structured_text" => Some(TranslationFormat::StructuredText),
            "rich_text" => Some(TranslationFormat::RichText),
            _ => None,
        }
    }

    /// Whether documents of this format are plain strings
    pub fn is_string(&self) -> bool {
        matches!(
            self,
            TranslationFormat::Text
                | TranslationFormat::Html
                | TranslationFormat::Markdown
                | TranslationFormat::Slug
        )
    }

    /// Parse the CLI spelling (`structured-text`, `rich-text`, ...)
    pub fn from_cli_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace('_', "-").as_str() {
            "text" => Some(TranslationFormat::Text),
            "html" => Some(TranslationFormat::Html),
            "markdown" | "md" => Some(TranslationFormat::Markdown),
            "seo" => Some(TranslationFormat::Seo),
            "slug" => Some(TranslationFormat::Slug),
            "structured-text" | "structuredtext" => Some(TranslationFormat::StructuredText),
            "rich-text" | "richtext" => Some(TranslationFormat::RichText),
            _ => None,
        }
    }
}

/// DeepL formality level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formality {
    #[default]
    Default,
    More,
    Less,
    PreferMore,
    PreferLess,
}

impl Formality {
    /// Value of the `formality` request parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Formality::Default => "default",
            Formality::More => "more",
            Formality::Less => "less",
            Formality::PreferMore => "prefer_more",
            Formality::PreferLess => "prefer_less",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeeplOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glossary_id: Option<String>,
    #[serde(default)]
    pub formality: Formality,
}

/// A locale's currency: ISO code and display template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// Three-letter ISO 4217 code, e.g. `EUR`
    pub code: String,
    /// Display template containing [`Currency::AMOUNT_PLACEHOLDER`], e.g. `€{{amount}}`
    pub format: String,
}

impl Currency {
    pub const AMOUNT_PLACEHOLDER: &'static str = "{{amount}}";

    pub fn new(code: &str, format: &str) -> Self {
        Self {
            code: code.to_string(),
            format: format.to_string(),
        }
    }

    /// Render a formatted amount through the display template
    pub fn render(&self, amount: &str) -> String {
        if self.format.contains(Self::AMOUNT_PLACEHOLDER) {
            self.format.replace(Self::AMOUNT_PLACEHOLDER, amount)
        } else {
            format!("{} {}", amount, self.code)
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::new("EUR", "€{{amount}}")
    }
}

/// Generation parameters and currency table for the OpenAI provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenAIOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    /// Free-form description of the site the content belongs to
    pub context: String,
    /// Currency per locale code
    pub currencies: HashMap<String, Currency>,
}

impl OpenAIOptions {
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";
    pub const DEFAULT_TEMPERATURE: f32 = 0.5;
    pub const DEFAULT_MAX_TOKENS: u32 = 1000;
    pub const DEFAULT_TOP_P: f32 = 1.0;
}

impl Default for OpenAIOptions {
    fn default() -> Self {
        Self {
            model: Self::DEFAULT_MODEL.to_string(),
            temperature: Self::DEFAULT_TEMPERATURE,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            top_p: Self::DEFAULT_TOP_P,
            context: String::new(),
            currencies: HashMap::new(),
        }
    }
}

/// Everything a translation call needs besides the document itself
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationOptions {
    pub from_locale: String,
    pub to_locale: String,
    #[serde(default)]
    pub format: TranslationFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_service: Option<TranslationService>,
    #[serde(default)]
    pub api_key: String,
    /// Project locales; the first one is the default locale
    #[serde(default)]
    pub locales: Vec<String>,
    #[serde(default)]
    pub deepl_options: DeeplOptions,
    #[serde(default, rename = "openAIOptions")]
    pub openai_options: OpenAIOptions,
    /// Route every call to the mock backend regardless of `translation_service`
    #[serde(default)]
    pub use_mock: bool,
}

impl TranslationOptions {
    pub fn new(from_locale: &str, to_locale: &str) -> Self {
        Self {
            from_locale: from_locale.to_string(),
            to_locale: to_locale.to_string(),
            format: TranslationFormat::default(),
            translation_service: None,
            api_key: String::new(),
            locales: vec![from_locale.to_string(), to_locale.to_string()],
            deepl_options: DeeplOptions::default(),
            openai_options: OpenAIOptions::default(),
            use_mock: false,
        }
    }

    pub fn with_format(mut self, format: TranslationFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_service(mut self, service: TranslationService, api_key: &str) -> Self {
        self.translation_service = Some(service);
        self.api_key = api_key.to_string();
        self
    }

    pub fn with_mock(mut self) -> Self {
        self.use_mock = true;
        self
    }

    /// The service that will actually run, honouring mock mode
    pub fn effective_service(&self) -> Option<TranslationService> {
        if self.use_mock {
            Some(TranslationService::Mock)
        } else {
            self.translation_service
        }
    }

    /// Currency configured for `locale`
    pub fn currency_for(&self, locale: &str) -> Option<&Currency> {
        self.openai_options.currencies.get(locale)
    }
}

impl std::fmt::Debug for TranslationOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationOptions")
            .field("from_locale", &self.from_locale)
            .field("to_locale", &self.to_locale)
            .field("format", &self.format)
            .field("translation_service", &self.translation_service)
            .field("api_key", &"***")
            .field("locales", &self.locales)
            .field("deepl_options", &self.deepl_options)
            .field("openai_options", &self.openai_options)
            .field("use_mock", &self.use_mock)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_wire_shape() {
        let options: TranslationOptions = serde_json::from_value(json!({
            "fromLocale": "en",
            "toLocale": "fr",
            "format": "structuredText",
            "translationService": "deeplFree",
            "apiKey": "k",
            "locales": ["en", "fr"],
            "deeplOptions": {"glossaryId": "g1", "formality": "prefer_less"},
            "openAIOptions": {
                "model": "gpt-4o",
                "temperature": 0.2,
                "maxTokens": 500,
                "topP": 0.9,
                "context": "Travel agency",
                "currencies": {"en": {"code": "USD", "format": "${{amount}}"}}
            }
        }))
        .unwrap();

        assert_eq!(options.format, TranslationFormat::StructuredText);
        assert_eq!(options.translation_service, Some(TranslationService::DeeplFree));
        assert_eq!(options.deepl_options.glossary_id.as_deref(), Some("g1"));
        assert_eq!(options.deepl_options.formality, Formality::PreferLess);
        assert_eq!(options.openai_options.max_tokens, 500);
        assert_eq!(options.currency_for("en").map(|c| c.code.as_str()), Some("USD"));
        assert!(!options.use_mock);
    }

    #[test]
    fn test_missing_sections_take_defaults() {
        let options: TranslationOptions =
            serde_json::from_value(json!({"fromLocale": "en", "toLocale": "de"})).unwrap();
        assert_eq!(options.format, TranslationFormat::Text);
        assert_eq!(options.translation_service, None);
        assert_eq!(options.openai_options.model, OpenAIOptions::DEFAULT_MODEL);
        assert_eq!(options.deepl_options.formality, Formality::Default);
    }

    #[test]
    fn test_mock_overrides_selected_service() {
        let options = TranslationOptions::new("en", "fr")
            .with_service(TranslationService::OpenAI, "key")
            .with_mock();
        assert_eq!(options.effective_service(), Some(TranslationService::Mock));
    }

    #[test]
    fn test_debug_masks_api_key() {
        let options = TranslationOptions::new("en", "fr").with_service(TranslationService::Yandex, "secret");
        let debug = format!("{:?}", options);
        assert!(debug.contains("***"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_editor_mapping() {
        assert_eq!(TranslationFormat::from_editor("wysiwyg"), Some(TranslationFormat::Html));
        assert_eq!(TranslationFormat::from_editor("rich_text"), Some(TranslationFormat::RichText));
        assert_eq!(TranslationFormat::from_editor("textarea"), Some(TranslationFormat::Text));
        assert_eq!(TranslationFormat::from_editor("color_picker"), None);
    }

    #[test]
    fn test_currency_render() {
        assert_eq!(Currency::default().render("1,000"), "€1,000");
        assert_eq!(Currency::new("SEK", "kr").render("50"), "50 SEK");
    }

    #[test]
    fn test_cli_names() {
        assert_eq!(TranslationService::from_cli_name("deepl-free"), Some(TranslationService::DeeplFree));
        assert_eq!(TranslationService::from_cli_name("OpenAI"), Some(TranslationService::OpenAI));
        assert_eq!(TranslationFormat::from_cli_name("structured-text"), Some(TranslationFormat::StructuredText));
        assert_eq!(TranslationFormat::from_cli_name("rich_text"), Some(TranslationFormat::RichText));
    }
}
