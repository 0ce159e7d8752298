//! Fenced reply extraction and the amount-formatting template
//!
//! The model answers with one fenced block holding JSON:
//!
//! ```text
//! {"translatedText": {"template": "Rooms from {{amount:0}}", "amounts": [{"value": 99, "original": "€99"}]}}
//! ```
//!
//! Nothing in the reply is executed. Each `{{amount:N}}` placeholder is
//! replaced by [`CurrencyDirective::render`] applied to `amounts[N]`.

use crate::backend::openai::currency::CurrencyDirective;
use crate::error::{TranslateError, TranslateResult};
use regex::{Captures, Regex};
use serde::Deserialize;
use std::sync::OnceLock;

const FENCE: &str = "```";

/// Name of the entry the reply must define
pub const ENTRY_NAME: &str = "translatedText";

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

fn placeholder() -> &'static Regex {
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{amount:(\d+)\}\}").expect("valid placeholder pattern"))
}

/// One currency-bearing number found in the source text
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Amount {
    /// Numeric value as written in the source currency
    pub value: f64,
    /// Exact source substring, used when conversion is forbidden
    pub original: String,
}

/// The structured translation the model returns
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GeneratedText {
    /// Translation with no amounts in it
    Plain(String),
    Template {
        template: String,
        #[serde(default)]
        amounts: Vec<Amount>,
    },
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "translatedText")]
    translated_text: GeneratedText,
}

/// Contents of the first fenced block, without its language tag
pub fn extract_fenced(reply: &str) -> TranslateResult<&str> {
    let mut parts = reply.splitn(3, FENCE);
    let _before = parts.next();
    let (Some(body), Some(_after)) = (parts.next(), parts.next()) else {
        return Err(TranslateError::MalformedResponse(
            "reply has no fenced code block".to_string(),
        ));
    };

    // ```json\n{...}
    let body = match body.split_once('\n') {
        Some((tag, rest)) if is_language_tag(tag) => rest,
        _ => strip_inline_tag(body),
    };
    Ok(body.trim())
}

/// Drop a tag written on the fence line itself, as in ```json {...}```
fn strip_inline_tag(body: &str) -> &str {
    let trimmed = body.trim_start();
    let tag_len = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(trimmed.len());
    let rest = &trimmed[tag_len..];
    if tag_len > 0 && rest.starts_with(char::is_whitespace) && rest.trim_start().starts_with('{') {
        rest
    } else {
        body
    }
}

fn is_language_tag(line: &str) -> bool {
    let tag = line.trim();
    tag.is_empty() || tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parse the fenced JSON into the generated text
pub fn parse(code: &str) -> TranslateResult<GeneratedText> {
    serde_json::from_str::<Envelope>(code)
        .map(|envelope| envelope.translated_text)
        .map_err(|e| TranslateError::Evaluation(format!("`{}` is not well-formed: {}", ENTRY_NAME, e)))
}

/// Resolve the generated text into the final string
pub fn evaluate(generated: &GeneratedText, directive: &CurrencyDirective) -> TranslateResult<String> {
    let (template, amounts) = match generated {
        GeneratedText::Plain(text) => return Ok(text.clone()),
        GeneratedText::Template { template, amounts } => (template, amounts),
    };

    let mut missing = None;
    let rendered = placeholder().replace_all(template, |caps: &Captures<'_>| {
        match caps[1].parse::<usize>().ok().and_then(|i| amounts.get(i)) {
            Some(amount) => directive.render(amount.value, &amount.original),
            None => {
                missing.get_or_insert_with(|| caps[0].to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(token) => Err(TranslateError::Evaluation(format!(
            "placeholder {} has no matching amount",
            token
        ))),
        None => Ok(rendered.into_owned()),
    }
}

/// Extract, parse and evaluate a full model reply
pub fn run(reply: &str, directive: &CurrencyDirective) -> TranslateResult<String> {
    let code = extract_fenced(reply)?;
    evaluate(&parse(code)?, directive)
}
