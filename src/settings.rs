//! Plugin parameters and their resolution into [`TranslationOptions`]
//!
//! The host stores two parameter blobs: global plugin settings and per-field
//! overrides. Each setting resolves field first, then global, then a built-in
//! default. Locale codes are then mapped onto what the chosen provider accepts.

use crate::error::{TranslateError, TranslateResult};
use crate::options::{
    Currency, DeeplOptions, Formality, OpenAIOptions, TranslationFormat, TranslationOptions,
    TranslationService,
};
use icu_locale::Locale;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A select option as the host stores it: `{value, label}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingOption<T> {
    pub value: T,
    pub label: String,
}

/// One parameter blob (global plugin settings or per-field overrides)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginParameters {
    pub translation_service: Option<SettingOption<TranslationService>>,
    pub yandex_api_key: Option<String>,
    pub deepl_api_key: Option<String>,
    pub deepl_free_api_key: Option<String>,
    #[serde(rename = "openAIApiKey")]
    pub openai_api_key: Option<String>,
    pub deepl_glossary_id: Option<String>,
    pub deepl_formality_level: Option<SettingOption<Formality>>,
    pub model: Option<SettingOption<String>>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub context: Option<String>,
    pub currencies: Option<HashMap<String, Currency>>,
}

impl PluginParameters {
    /// Non-empty API key stored for `service`
    pub fn api_key_for(&self, service: TranslationService) -> Option<&str> {
        let key = match service {
            TranslationService::Mock => None,
            TranslationService::Yandex => self.yandex_api_key.as_deref(),
            TranslationService::Deepl => self.deepl_api_key.as_deref(),
            TranslationService::DeeplFree => self.deepl_free_api_key.as_deref(),
            TranslationService::OpenAI => self.openai_api_key.as_deref(),
        };
        key.filter(|k| !k.trim().is_empty())
    }

    /// Store `api_key` as the key of `service`
    pub fn with_api_key(mut self, service: TranslationService, api_key: &str) -> Self {
        let slot = match service {
            TranslationService::Mock => return self,
            TranslationService::Yandex => &mut self.yandex_api_key,
            TranslationService::Deepl => &mut self.deepl_api_key,
            TranslationService::DeeplFree => &mut self.deepl_free_api_key,
            TranslationService::OpenAI => &mut self.openai_api_key,
        };
        *slot = Some(api_key.to_string());
        self
    }

    /// Select `service` as the translation service
    pub fn with_service(mut self, service: TranslationService) -> Self {
        self.translation_service = Some(SettingOption {
            value: service,
            label: service.label().to_string(),
        });
        self
    }

    /// Service these parameters select, before field overrides
    pub fn selected_service(&self) -> TranslationService {
        self.translation_service
            .as_ref()
            .map(|option| option.value)
            .unwrap_or(TranslationService::ALL[0])
    }
}

/// Inputs of [`resolve_options`] that come from the field being edited
#[derive(Debug, Clone)]
pub struct FieldSettings<'a> {
    pub field: &'a PluginParameters,
    pub global: &'a PluginParameters,
    /// Project locales, default locale first
    pub locales: &'a [String],
    pub format: TranslationFormat,
    pub use_mock: bool,
}

/// Build the options for one `from → to` call, applying field → global → default
/// precedence and the provider's locale rules
///
/// Fails with a configuration error naming the service when no API key is set and
/// mock mode is off.
pub fn resolve_options(
    settings: &FieldSettings<'_>,
    from_locale: &str,
    to_locale: &str,
) -> TranslateResult<TranslationOptions> {
    let FieldSettings { field, global, .. } = settings;

    let selected = field
        .translation_service
        .as_ref()
        .or(global.translation_service.as_ref())
        .map(|option| option.value)
        .unwrap_or(TranslationService::ALL[0]);
    let service = if settings.use_mock {
        TranslationService::Mock
    } else {
        selected
    };

    let api_key = field
        .api_key_for(service)
        .or_else(|| global.api_key_for(service))
        .unwrap_or_default()
        .to_string();
    if api_key.is_empty() && !settings.use_mock {
        return Err(TranslateError::Configuration(format!(
            "Set {} API key in the settings",
            selected.label()
        )));
    }

    let currencies = field
        .currencies
        .clone()
        .or_else(|| global.currencies.clone())
        .unwrap_or_else(|| default_currencies(settings.locales));

    let openai_options = OpenAIOptions {
        model: field
            .model
            .as_ref()
            .or(global.model.as_ref())
            .map(|m| m.value.clone())
            .unwrap_or_else(|| OpenAIOptions::DEFAULT_MODEL.to_string()),
        temperature: field
            .temperature
            .or(global.temperature)
            .unwrap_or(OpenAIOptions::DEFAULT_TEMPERATURE),
        max_tokens: field
            .max_tokens
            .or(global.max_tokens)
            .unwrap_or(OpenAIOptions::DEFAULT_MAX_TOKENS),
        top_p: field.top_p.or(global.top_p).unwrap_or(OpenAIOptions::DEFAULT_TOP_P),
        context: field
            .context
            .clone()
            .or_else(|| global.context.clone())
            .unwrap_or_default(),
        currencies,
    };

    // Formality is a global-only setting
    let deepl_options = DeeplOptions {
        glossary_id: field
            .deepl_glossary_id
            .clone()
            .or_else(|| global.deepl_glossary_id.clone())
            .filter(|id| !id.is_empty()),
        formality: global
            .deepl_formality_level
            .as_ref()
            .map(|level| level.value)
            .unwrap_or_default(),
    };

    Ok(TranslationOptions {
        from_locale: supported_from_locale(from_locale, service)?,
        to_locale: supported_to_locale(to_locale, service)?,
        format: settings.format,
        translation_service: Some(service),
        api_key,
        locales: settings.locales.to_vec(),
        deepl_options,
        openai_options,
        use_mock: settings.use_mock,
    })
}

/// `{EUR, €{{amount}}}` for every locale
pub fn default_currencies(locales: &[String]) -> HashMap<String, Currency> {
    locales
        .iter()
        .map(|locale| (locale.clone(), Currency::default()))
        .collect()
}

/// DeepL target languages that keep their region
const DEEPL_REGIONAL_TARGETS: &[&str] = &["EN-GB", "EN-US", "PT-PT", "PT-BR"];

fn parse_locale(locale: &str) -> TranslateResult<Locale> {
    Locale::try_from_str(&locale.replace('_', "-"))
        .map_err(|e| TranslateError::InvalidLocale(format!("{}: {:?}", locale, e)))
}

fn base_language(locale: &str) -> TranslateResult<String> {
    Ok(parse_locale(locale)?.id.language.as_str().to_string())
}

/// Source locale code in the form `service` accepts
pub fn supported_from_locale(locale: &str, service: TranslationService) -> TranslateResult<String> {
    match service {
        TranslationService::Deepl | TranslationService::DeeplFree => {
            Ok(base_language(locale)?.to_uppercase())
        }
        TranslationService::Yandex => base_language(locale),
        TranslationService::Mock | TranslationService::OpenAI => Ok(locale.to_string()),
    }
}

/// Target locale code in the form `service` accepts
pub fn supported_to_locale(locale: &str, service: TranslationService) -> TranslateResult<String> {
    match service {
        TranslationService::Deepl | TranslationService::DeeplFree => {
            let parsed = parse_locale(locale)?;
            let language = parsed.id.language.as_str().to_uppercase();
            if let Some(region) = parsed.id.region {
                let regional = format!("{}-{}", language, region.as_str());
                if DEEPL_REGIONAL_TARGETS.contains(&regional.as_str()) {
                    return Ok(regional);
                }
            }
            Ok(language)
        }
        TranslationService::Yandex => base_language(locale),
        TranslationService::Mock | TranslationService::OpenAI => Ok(locale.to_string()),
    }
}
