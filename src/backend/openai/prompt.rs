//! System and user messages for one translation call

use crate::backend::openai::context::trim_record;
use crate::backend::openai::currency::CurrencyDirective;
use crate::backend::openai::snippet::ENTRY_NAME;
use crate::backend::translator::TranslationRequest;

/// Two-message chat prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Assemble the prompt translating `text` under `request`
pub fn build(text: &str, request: &TranslationRequest, directive: &CurrencyDirective) -> Prompt {
    let options = &request.options;
    let mut system = format!(
        "You are a translation assistant. Translate the text submitted by the user from the \
         locale '{}' to the locale '{}'.",
        options.from_locale, options.to_locale
    );

    let context = options.openai_options.context.trim();
    if !context.is_empty() {
        system.push_str(&format!(
            " The context of the app you are translating the text for is the following: {}.",
            context
        ));
    }

    if let Some(field) = &request.field {
        let snapshot = trim_record(&field.record, &field.api_key);
        system.push_str(&format!(
            " The text is the value of the field `{}` of a record whose other fields read: {}.",
            field.api_key, snapshot
        ));
    }

    system.push(' ');
    system.push_str(&directive.instruction());
    system.push_str(&format!(
        " Preserve any Markdown formatting, never translate URLs, and translate the text even \
         when it is a single word. Do not translate anything before the triple newline. Reply \
         with exactly one fenced ```json code block holding an object with a single \
         `{entry}` entry. When the translation contains no currency amounts, `{entry}` is the \
         translated string. Otherwise `{entry}` is an object with a `template` string, the \
         translation with the N-th currency amount written as {{{{amount:N}}}} (counting from \
         0), and an `amounts` array whose N-th item is {{\"value\": <number>, \"original\": \
         <exact source text of the amount>}}.",
        entry = ENTRY_NAME
    ));

    Prompt {
        system,
        user: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{Currency, TranslationOptions};
    use serde_json::json;

    #[test]
    fn test_prompt_embeds_locales_and_constraints() {
        let mut options = TranslationOptions::new("en", "it");
        options.openai_options.context = "A boutique hotel website".to_string();
        let request = TranslationRequest::new(options, false);
        let prompt = build("Book now", &request, &CurrencyDirective::Forbid);

        assert_eq!(prompt.user, "Book now");
        assert!(prompt.system.contains("from the locale 'en' to the locale 'it'"));
        assert!(prompt.system.contains("A boutique hotel website"));
        assert!(prompt.system.contains("never translate URLs"));
        assert!(prompt.system.contains("Do not convert any currency"));
        assert!(prompt.system.contains("{{amount:N}}"));
    }

    #[test]
    fn test_prompt_carries_trimmed_record() {
        let request = TranslationRequest::new(TranslationOptions::new("en", "it"), true)
            .with_field(
                "headline",
                json!({"headline": {"en": "Secret draft"}, "city": {"en": "Rome", "it": "Roma"}}),
            );
        let directive = CurrencyDirective::Convert {
            from: Currency::default(),
            to: Currency::new("CHF", "CHF {{amount}}"),
            rate: 0.95,
        };
        let prompt = build("Rooms from €99", &request, &directive);

        assert!(prompt.system.contains("field `headline`"));
        assert!(prompt.system.contains(r#"{"city":{"en":"Rome"}}"#));
        assert!(!prompt.system.contains("Secret draft"));
        assert!(prompt.system.contains("EUR:CHF is 0.95"));
    }
}
