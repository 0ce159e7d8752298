/// Translation backends
///
/// Every provider implements [`TranslationBackend`]: one string in, one
/// translated string out. The format translators never talk to a provider
/// directly; they receive an `Arc<dyn TranslationBackend>` chosen by
/// [`for_options`] from the options' `translationService` (or the mock
/// backend when `useMock` is set).
///
/// # Providers
///
/// 1. **Mock** - deterministic `"Translated <text>"`, no network
/// 2. **Yandex** - Yandex Translate v1.5
/// 3. **DeepL / DeepL Free** - DeepL v2 with glossary and formality
/// 4. **OpenAI** - streamed chat completion with currency conversion
pub mod deepl;
pub mod mock;
pub mod openai;
#[cfg(test)]
pub(crate) mod test_server;
pub mod translator;
pub mod yandex;

pub use deepl::{DeeplPlan, DeeplProvider};
pub use mock::{MockBackend, MockMode};
pub use openai::OpenAIProvider;
pub use openai::currency::{CurrencyConverter, CurrencyDirective, HttpRateSource, RateSource};
pub use translator::{FieldContext, TranslationBackend, TranslationRequest, for_options, validate_locale};
pub use yandex::YandexProvider;
