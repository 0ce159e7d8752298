//! Field-level orchestration
//!
//! A [`FieldTranslationSession`] is bound to one localized field of one record
//! being edited. It fans a translation out to every requested locale, writes
//! each successful result back into the record under `<field>.<locale>`, and
//! keeps the two bits of state an editor UI shows: whether a translation is in
//! flight and the message of the last failure.

use crate::backend::{self, TranslationBackend, TranslationRequest};
use crate::error::{TranslateError, TranslateResult};
use crate::format::DocumentTranslator;
use crate::options::TranslationFormat;
use crate::paths::{PathType, walk};
use crate::schema::{NoSchema, SchemaLookup};
use crate::settings::{FieldSettings, PluginParameters, resolve_options};
use crate::tree::{ContentTree, PathSegment, TreePath, get_at, parse_dotted, set_at};
use futures::future::join_all;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info, warn};

/// Result of a [`FieldTranslationSession::translate_field`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    /// Locales written back into the record
    Translated(Vec<String>),
    /// Another translation of this field was still running; nothing was done
    AlreadyRunning,
}

/// Clears the in-flight flag when dropped
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Translation state for one localized field
pub struct FieldTranslationSession {
    field: PluginParameters,
    global: PluginParameters,
    locales: Vec<String>,
    format: TranslationFormat,
    use_mock: bool,
    schema: Arc<dyn SchemaLookup>,
    backend: Option<Arc<dyn TranslationBackend>>,
    in_flight: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl FieldTranslationSession {
    /// Session for a field of `format` in a project whose locales are
    /// `locales`, default locale first
    pub fn new(global: PluginParameters, locales: Vec<String>, format: TranslationFormat) -> Self {
        Self {
            field: PluginParameters::default(),
            global,
            locales,
            format,
            use_mock: false,
            schema: Arc::new(NoSchema),
            backend: None,
            in_flight: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    /// Per-field overrides of the global parameters
    pub fn with_field_parameters(mut self, field: PluginParameters) -> Self {
        self.field = field;
        self
    }

    /// Use the mock backend regardless of the configured service
    pub fn with_mock(self) -> Self {
        self.use_mock(true)
    }

    pub fn use_mock(mut self, use_mock: bool) -> Self {
        self.use_mock = use_mock;
        self
    }

    pub fn with_schema(mut self, schema: Arc<dyn SchemaLookup>) -> Self {
        self.schema = schema;
        self
    }

    /// Translate with `backend` instead of the one the settings select
    pub fn with_backend(mut self, backend: Arc<dyn TranslationBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn is_translating(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn default_locale(&self) -> Option<&str> {
        self.locales.first().map(String::as_str)
    }

    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    /// Settings problem an editor should fix before translating, such as a
    /// missing API key
    pub fn configuration_error(&self) -> Option<String> {
        let locale = self.default_locale()?;
        match resolve_options(&self.settings(), locale, locale) {
            Err(TranslateError::Configuration(message)) => Some(message),
            _ => None,
        }
    }

    fn settings(&self) -> FieldSettings<'_> {
        FieldSettings {
            field: &self.field,
            global: &self.global,
            locales: &self.locales,
            format: self.format,
            use_mock: self.use_mock,
        }
    }

    fn set_last_error(&self, message: Option<String>) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = message;
    }

    fn fail(&self, err: TranslateError) -> TranslateError {
        self.set_last_error(Some(err.to_string()));
        err
    }

    /// Translate `<field_path>.<from>` into `<field_path>.<locale>` for every
    /// locale in `target_locales`
    ///
    /// `from_locale` defaults to the project's default locale. All locales are
    /// translated concurrently; the ones that succeed are written into `record`
    /// even when others fail. The first failure is recorded as the last error
    /// and returned.
    pub async fn translate_field(
        &self,
        record: &mut ContentTree,
        field_path: &str,
        target_locales: &[String],
        from_locale: Option<&str>,
        convert_currency: bool,
    ) -> TranslateResult<FieldOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(field = field_path, "translation already in progress");
            return Ok(FieldOutcome::AlreadyRunning);
        }
        let _in_flight = InFlight(&self.in_flight);
        self.set_last_error(None);

        let Some(from) = from_locale.or(self.default_locale()).map(str::to_string) else {
            return Err(self.fail(TranslateError::Configuration(
                "No locales configured for this field".to_string(),
            )));
        };

        let base = parse_dotted(field_path);
        let source = get_at(record, &localized(&base, &from))
            .cloned()
            .unwrap_or(Value::Null);
        if !has_field_value(&source, self.format) {
            return Err(self.fail(TranslateError::Validation(format!(
                "Please add content to the default field ({})",
                from
            ))));
        }

        let settings = self.settings();
        let api_key = base
            .iter()
            .rev()
            .find_map(|segment| match segment {
                PathSegment::Key(key) => Some(key.as_str()),
                PathSegment::Index(_) => None,
            })
            .unwrap_or_default();
        let snapshot = record.clone();

        info!(
            field = field_path,
            from = %from,
            targets = ?target_locales,
            format = ?self.format,
            "translating field"
        );
        let results = join_all(target_locales.iter().map(|locale| {
            let (settings, source, snapshot, from) = (&settings, &source, &snapshot, &from);
            async move {
                let outcome = self
                    .translate_locale(settings, source, from, locale, api_key, snapshot, convert_currency)
                    .await;
                (locale, outcome)
            }
        }))
        .await;

        let mut translated = Vec::new();
        let mut first_error = None;
        for (locale, outcome) in results {
            match outcome {
                Ok(value) => {
                    set_at(record, &localized(&base, locale), value);
                    translated.push(locale.clone());
                }
                Err(err) => {
                    error!(field = field_path, locale = %locale, error = %err, "translation failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(self.fail(err)),
            None => Ok(FieldOutcome::Translated(translated)),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn translate_locale(
        &self,
        settings: &FieldSettings<'_>,
        source: &ContentTree,
        from: &str,
        to: &str,
        api_key: &str,
        record: &ContentTree,
        convert_currency: bool,
    ) -> TranslateResult<ContentTree> {
        let options = resolve_options(settings, from, to)?;
        let backend = match &self.backend {
            Some(backend) => backend.clone(),
            None => backend::for_options(&options)?,
        };
        let request = TranslationRequest::new(options, convert_currency).with_field(api_key, record.clone());
        DocumentTranslator::new(backend, request)
            .with_schema(self.schema.clone())
            .translate_document(source)
            .await
    }

    /// Translate the default locale's value into every other locale
    pub async fn translate_to_all(
        &self,
        record: &mut ContentTree,
        field_path: &str,
        convert_currency: bool,
    ) -> TranslateResult<FieldOutcome> {
        let targets: Vec<String> = self.locales.iter().skip(1).cloned().collect();
        self.translate_field(record, field_path, &targets, None, convert_currency)
            .await
    }

    /// Fill `locale` with a translation of the default locale's value
    pub async fn copy_from_default(
        &self,
        record: &mut ContentTree,
        field_path: &str,
        locale: &str,
    ) -> TranslateResult<FieldOutcome> {
        self.translate_field(record, field_path, &[locale.to_string()], None, false)
            .await
    }
}

impl std::fmt::Debug for FieldTranslationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldTranslationSession")
            .field("locales", &self.locales)
            .field("format", &self.format)
            .field("use_mock", &self.use_mock)
            .field("is_translating", &self.is_translating())
            .finish()
    }
}

fn localized(base: &TreePath, locale: &str) -> TreePath {
    let mut path = base.clone();
    path.push(PathSegment::Key(locale.to_string()));
    path
}

/// Whether `value` has anything worth translating for a field of `format`
pub fn has_field_value(value: &ContentTree, format: TranslationFormat) -> bool {
    match (format, value) {
        (_, Value::Null) => false,
        (_, Value::String(text)) => !text.trim().is_empty(),
        (TranslationFormat::Seo, Value::Object(seo)) => ["title", "description"]
            .iter()
            .any(|key| seo.get(*key).and_then(Value::as_str).is_some_and(|t| !t.trim().is_empty())),
        (TranslationFormat::StructuredText, _) => walk(value, &NoSchema).iter().any(|path| {
            (path.path_type == PathType::Text && path.key == "text")
                || path.path_type == PathType::StructuredTextBlock
        }),
        (_, Value::Array(items)) => !items.is_empty(),
        (_, Value::Object(map)) => !map.is_empty(),
        (_, Value::Bool(_) | Value::Number(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockBackend, MockMode};
    use crate::options::TranslationService;
    use crate::settings::SettingOption;
    use serde_json::json;

    fn locales() -> Vec<String> {
        vec!["en".to_string(), "it".to_string(), "de".to_string()]
    }

    fn session(format: TranslationFormat) -> FieldTranslationSession {
        FieldTranslationSession::new(PluginParameters::default(), locales(), format).with_mock()
    }

    #[test]
    fn test_has_field_value() {
        assert!(!has_field_value(&Value::Null, TranslationFormat::Text));
        assert!(!has_field_value(&json!("  "), TranslationFormat::Text));
        assert!(has_field_value(&json!("Hi"), TranslationFormat::Html));
        assert!(!has_field_value(&json!({"title": "", "description": null}), TranslationFormat::Seo));
        assert!(has_field_value(&json!({"title": "", "description": "D"}), TranslationFormat::Seo));
        assert!(!has_field_value(
            &json!([{"type": "paragraph", "children": [{"text": ""}]}]),
            TranslationFormat::StructuredText
        ));
        assert!(has_field_value(
            &json!([{"type": "paragraph", "children": [{"text": "x"}]}]),
            TranslationFormat::StructuredText
        ));
        assert!(!has_field_value(&json!([]), TranslationFormat::RichText));
        assert!(has_field_value(&json!([{"itemId": "1"}]), TranslationFormat::RichText));
    }

    #[tokio::test]
    async fn test_translate_to_all_writes_every_locale() {
        let mut record = json!({"title": {"en": "Hello", "it": "", "de": null}});
        let outcome = session(TranslationFormat::Text)
            .translate_to_all(&mut record, "title", false)
            .await
            .unwrap();
        assert_eq!(outcome, FieldOutcome::Translated(vec!["it".to_string(), "de".to_string()]));
        assert_eq!(
            record,
            json!({"title": {"en": "Hello", "it": "Translated Hello", "de": "Translated Hello"}})
        );
    }

    #[tokio::test]
    async fn test_nested_field_path() {
        let mut record = json!({"blocks": [{"caption": {"en": "Sea", "fr": ""}}]});
        session(TranslationFormat::Text)
            .copy_from_default(&mut record, "blocks.0.caption", "fr")
            .await
            .unwrap();
        assert_eq!(record["blocks"][0]["caption"]["fr"], "Translated Sea");
    }

    #[tokio::test]
    async fn test_empty_source_is_a_validation_error() {
        let session = session(TranslationFormat::Text);
        let mut record = json!({"title": {"en": "", "it": "Ciao"}});
        let result = session.translate_to_all(&mut record, "title", false).await;
        assert_eq!(
            result,
            Err(TranslateError::Validation(
                "Please add content to the default field (en)".to_string()
            ))
        );
        assert!(result.unwrap_err().is_user_correctable());
        assert_eq!(
            session.last_error().as_deref(),
            Some("Please add content to the default field (en)")
        );
        assert_eq!(record["title"]["it"], "Ciao");
        assert!(!session.is_translating());
    }

    #[tokio::test]
    async fn test_failures_are_recorded_and_flag_cleared() {
        let session = session(TranslationFormat::Text)
            .with_backend(Arc::new(MockBackend::new(MockMode::Error("quota".to_string()))));
        let mut record = json!({"title": {"en": "Hello"}});
        let result = session.translate_to_all(&mut record, "title", false).await;
        assert_eq!(result, Err(TranslateError::RemoteService("quota".to_string())));
        assert_eq!(session.last_error().as_deref(), Some("Remote service error: quota"));
        assert!(!session.is_translating());
        assert_eq!(record, json!({"title": {"en": "Hello"}}));
    }

    #[tokio::test]
    async fn test_partial_success_writes_successful_locales() {
        let session = FieldTranslationSession::new(PluginParameters::default(), locales(), TranslationFormat::Text)
            .with_field_parameters(PluginParameters {
                translation_service: Some(SettingOption {
                    value: TranslationService::Deepl,
                    label: "DeepL".to_string(),
                }),
                deepl_api_key: Some("key".to_string()),
                ..Default::default()
            })
            .with_backend(Arc::new(MockBackend::new(MockMode::Prefix)));
        let mut record = json!({"title": {"en": "Hello"}});
        let targets = vec!["it".to_string(), "not a locale!".to_string()];
        let result = session
            .translate_field(&mut record, "title", &targets, None, false)
            .await;
        assert!(matches!(result, Err(TranslateError::InvalidLocale(_))));
        assert!(session.last_error().is_some());
        assert_eq!(record["title"]["it"], "Translated Hello");
        assert!(record["title"].get("not a locale!").is_none());
    }

    #[tokio::test]
    async fn test_concurrent_call_is_rejected() {
        let session = Arc::new(
            session(TranslationFormat::Text).with_backend(Arc::new(MockBackend::with_delay(MockMode::Prefix, 100))),
        );
        let mut first = json!({"title": {"en": "Hello"}});
        let mut second = first.clone();

        let (a, b) = tokio::join!(
            session.translate_to_all(&mut first, "title", false),
            async {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                session.translate_to_all(&mut second, "title", false).await
            }
        );
        assert!(matches!(a, Ok(FieldOutcome::Translated(_))));
        assert_eq!(b, Ok(FieldOutcome::AlreadyRunning));
        assert!(!session.is_translating());
    }

    #[test]
    fn test_missing_api_key_is_reported() {
        let session = FieldTranslationSession::new(PluginParameters::default(), locales(), TranslationFormat::Text);
        assert_eq!(
            session.configuration_error().as_deref(),
            Some("Set Yandex API key in the settings")
        );
        assert_eq!(session.with_mock().configuration_error(), None);
    }
}
