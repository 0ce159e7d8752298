//! OpenAI provider with currency-aware translation
//!
//! One call runs these steps:
//!
//! 1. **Currency directive** - when conversion is requested, fetch EUR rates
//!    ([`currency`]) and decide whether amounts get converted
//! 2. **Context** - trim the surrounding record ([`context`])
//! 3. **Prompt** - assemble system and user messages ([`prompt`])
//! 4. **Streaming** - run a streamed chat completion and accumulate the deltas
//! 5. **Evaluation** - extract the fenced reply and render it through the fixed
//!    amount formatter ([`snippet`])
//!
//! Failures in step 5 are logged with the source text, the raw reply and the
//! extracted block, then returned. There is no retry at this layer.

pub mod context;
pub mod currency;
pub mod prompt;
pub mod snippet;

use crate::backend::translator::{TranslationBackend, TranslationRequest, status_error};
use crate::error::{TranslateError, TranslateResult};
use crate::options::OpenAIOptions;
use async_trait::async_trait;
use currency::{CurrencyConverter, HttpRateSource, RateSource};
use eventsource_stream::{Event, Eventsource};
use futures::{Stream, StreamExt};
use prompt::Prompt;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, error};

pub use context::trim_record;
pub use currency::CurrencyDirective;

/// Marker the API sends as the last event of a stream
const STREAM_DONE: &str = "[DONE]";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
    messages: [ChatMessage<'a>; 2],
}

impl<'a> ChatRequest<'a> {
    fn new(prompt: &'a Prompt, options: &'a OpenAIOptions) -> Self {
        Self {
            model: &options.model,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            stream: true,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// Concatenate the `delta.content` of every streamed chunk
async fn collect_deltas<S, E>(events: S) -> TranslateResult<String>
where
    S: Stream<Item = Result<Event, E>>,
    E: Display,
{
    let mut events = std::pin::pin!(events);
    let mut code = String::new();
    while let Some(event) = events.next().await {
        let event = event
            .map_err(|e| TranslateError::RemoteService(format!("OpenAI stream failed: {}", e)))?;
        if event.data.trim() == STREAM_DONE {
            break;
        }
        let chunk: ChatChunk = serde_json::from_str(&event.data).map_err(|e| {
            TranslateError::MalformedResponse(format!("Invalid OpenAI stream chunk: {}", e))
        })?;
        if let Some(content) = chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
        {
            code.push_str(&content);
        }
    }
    Ok(code)
}

/// OpenAI chat-completions provider
#[derive(Clone)]
pub struct OpenAIProvider {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    currency: CurrencyConverter,
}

impl OpenAIProvider {
    const DEFAULT_BASE_URL: &'static str = "https://api.openai.com";

    pub fn new(api_key: String) -> TranslateResult<Self> {
        if api_key.trim().is_empty() {
            return Err(TranslateError::Configuration(
                "OpenAI API key cannot be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TranslateError::RemoteService(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            client,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            currency: CurrencyConverter::new(Arc::new(HttpRateSource::new()?)),
        })
    }

    /// Create a provider from the `OPENAI_API_KEY` environment variable
    pub fn from_env() -> TranslateResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            TranslateError::Configuration("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Replace the exchange rate source
    pub fn with_rate_source(mut self, rates: Arc<dyn RateSource>) -> Self {
        self.currency = CurrencyConverter::new(rates);
        self
    }

    async fn stream_completion(&self, prompt: &Prompt, options: &OpenAIOptions) -> TranslateResult<String> {
        let body = ChatRequest::new(prompt, options);
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error("OpenAI", status, &error_text));
        }

        collect_deltas(response.bytes_stream().eventsource()).await
    }
}

impl std::fmt::Debug for OpenAIProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl TranslationBackend for OpenAIProvider {
    async fn translate(&self, text: &str, request: &TranslationRequest) -> TranslateResult<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let directive = self.currency.directive(request).await?;
        let prompt = prompt::build(text, request, &directive);
        debug!(
            model = %request.options.openai_options.model,
            from = request.from_locale(),
            to = request.to_locale(),
            convert = matches!(directive, CurrencyDirective::Convert { .. }),
            "requesting completion"
        );

        let reply = self
            .stream_completion(&prompt, &request.options.openai_options)
            .await?;

        snippet::run(&reply, &directive).inspect_err(|err| {
            let code = snippet::extract_fenced(&reply).unwrap_or_default();
            error!(source = text, raw = %reply, snippet = code, error = %err, "could not evaluate model reply");
        })
    }

    fn provider_name(&self) -> &str {
        "OpenAI"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::openai::currency::tests::FixedRates;
    use crate::backend::test_server::{CannedServer, Route};
    use crate::options::{Currency, TranslationOptions};
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn sse(lines: &[&str]) -> impl Stream<Item = Result<Event, eventsource_stream::EventStreamError<std::io::Error>>> {
        let body: String = lines.iter().map(|data| format!("data: {}\n\n", data)).collect();
        futures::stream::iter(vec![Ok::<_, std::io::Error>(body.into_bytes())]).eventsource()
    }

    #[tokio::test]
    async fn test_collect_deltas_until_done() {
        let events = sse(&[
            r#"{"choices":[{"delta":{"role":"assistant"}}]}"#,
            r#"{"choices":[{"delta":{"content":"```json\n{\"translatedText\": "}}]}"#,
            r#"{"choices":[{"delta":{"content":"\"Ciao\"}\n```"}}]}"#,
            "[DONE]",
            r#"{"choices":[{"delta":{"content":"ignored"}}]}"#,
        ]);
        let code = collect_deltas(events).await.unwrap();
        assert_eq!(code, "```json\n{\"translatedText\": \"Ciao\"}\n```");
        assert_eq!(snippet::run(&code, &CurrencyDirective::Forbid).unwrap(), "Ciao");
    }

    #[tokio::test]
    async fn test_invalid_chunk_is_malformed() {
        let events = sse(&["not json"]);
        assert!(matches!(
            collect_deltas(events).await,
            Err(TranslateError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_chat_request_shape() {
        let prompt = Prompt {
            system: "sys".to_string(),
            user: "Hello".to_string(),
        };
        let options = OpenAIOptions::default();
        let body = serde_json::to_value(ChatRequest::new(&prompt, &options)).unwrap();
        assert_eq!(body["stream"], true);
        assert_eq!(body["model"], OpenAIOptions::DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], OpenAIOptions::DEFAULT_MAX_TOKENS);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Hello");
    }

    #[test]
    fn test_new_with_empty_key() {
        assert!(matches!(
            OpenAIProvider::new(String::new()),
            Err(TranslateError::Configuration(_))
        ));
    }

    #[test]
    fn test_debug_output() {
        let provider = OpenAIProvider::new("sk-secret".to_string()).unwrap();
        let debug_str = format!("{:?}", provider);
        assert!(debug_str.contains("***"));
        assert!(!debug_str.contains("sk-secret"));
    }

    fn delta(content: &str) -> String {
        json!({"choices": [{"delta": {"content": content}}]}).to_string()
    }

    fn hotel_request(convert: bool) -> TranslationRequest {
        let mut options = TranslationOptions::new("en", "sv");
        let currencies = &mut options.openai_options.currencies;
        currencies.insert("en".to_string(), Currency::new("EUR", "€{{amount}}"));
        currencies.insert("sv".to_string(), Currency::new("SEK", "{{amount}} kr"));
        TranslationRequest::new(options, convert)
    }

    #[tokio::test]
    async fn test_translate_streams_and_converts_amounts() {
        let server = CannedServer::start(vec![Route::event_stream(
            "/v1/chat/completions",
            &[
                delta("```json\n{\"translatedText\": {\"template\": \"Rum från {{amount:0}}\", "),
                delta("\"amounts\": [{\"value\": 99, \"original\": \"€99\"}]}}\n```"),
                STREAM_DONE.to_string(),
            ],
        )])
        .await;
        let rates = Arc::new(FixedRates::new(&[("sek", 11.0)]));
        let provider = OpenAIProvider::new("sk-test".to_string())
            .unwrap()
            .with_base_url(&server.base_url)
            .with_rate_source(rates.clone());

        let result = provider
            .translate("Rooms from €99", &hotel_request(true))
            .await
            .unwrap();
        assert_eq!(result, "Rum från 1,000 kr");
        assert_eq!(rates.calls.load(Ordering::SeqCst), 1);
        assert_eq!(server.requests(), vec!["/v1/chat/completions"]);
    }

    #[tokio::test]
    async fn test_translate_without_conversion_keeps_amounts() {
        let server = CannedServer::start(vec![Route::event_stream(
            "/v1/chat/completions",
            &[
                delta("```json {\"translatedText\": {\"template\": \"Rum från {{amount:0}}\", "),
                delta("\"amounts\": [{\"value\": 99, \"original\": \"€99\"}]}}```"),
                STREAM_DONE.to_string(),
            ],
        )])
        .await;
        let rates = Arc::new(FixedRates::new(&[("sek", 11.0)]));
        let provider = OpenAIProvider::new("sk-test".to_string())
            .unwrap()
            .with_base_url(&server.base_url)
            .with_rate_source(rates.clone());

        let result = provider
            .translate("Rooms from €99", &hotel_request(false))
            .await
            .unwrap();
        assert_eq!(result, "Rum från €99");
        assert_eq!(rates.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejected_key_is_remote_error() {
        let server = CannedServer::start(vec![Route::failing(
            "/v1/chat/completions",
            401,
            "invalid api key",
        )])
        .await;
        let provider = OpenAIProvider::new("sk-wrong".to_string())
            .unwrap()
            .with_base_url(&server.base_url);

        match provider.translate("Hello", &hotel_request(false)).await {
            Err(TranslateError::RemoteService(msg)) => assert!(msg.contains("invalid api key")),
            other => panic!("Expected RemoteService error, got {:?}", other),
        }
    }

    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_real_api_translation() {
        if std::env::var("OPENAI_API_KEY").is_err() {
            eprintln!("Skipping: OPENAI_API_KEY not set");
            return;
        }
        let provider = OpenAIProvider::from_env().unwrap();
        let request = TranslationRequest::new(TranslationOptions::new("en", "fr"), false);
        let result = provider.translate("Rooms from €99 per night", &request).await.unwrap();
        println!("Translation: {}", result);
        assert!(result.contains("€99"));
    }
}
