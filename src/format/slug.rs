use crate::error::TranslateResult;
use crate::format::DocumentTranslator;

/// Characters `slug::slugify` would drop or transliterate poorly, per language
fn replacements(language: &str) -> &'static [(char, &'static str)] {
    match language {
        "de" => &[
            ('ä', "ae"),
            ('ö', "oe"),
            ('ü', "ue"),
            ('Ä', "Ae"),
            ('Ö', "Oe"),
            ('Ü', "Ue"),
            ('ß', "ss"),
            ('&', " und "),
        ],
        "fr" => &[('&', " et ")],
        "es" => &[('&', " y ")],
        "it" => &[('&', " e ")],
        "sv" => &[('å', "a"), ('ä', "a"), ('ö', "o"), ('&', " och ")],
        "da" | "nb" | "no" => &[('æ', "ae"), ('ø', "oe"), ('å', "aa"), ('&', " og ")],
        _ => &[('&', " and ")],
    }
}

/// Slugify `text` using the conventions of `locale`
///
/// `"Straße & Café"` with `de` → `"strasse-und-cafe"`
pub fn slugify_for_locale(text: &str, locale: &str) -> String {
    let language = locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let table = replacements(&language);

    let mut prepared = String::with_capacity(text.len());
    for c in text.chars() {
        match table.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => prepared.push_str(to),
            None => prepared.push(c),
        }
    }
    ::slug::slugify(prepared)
}

impl DocumentTranslator {
    /// Translate a URL slug
    ///
    /// Hyphens become spaces before translation and the result is slugified
    /// for the target locale.
    pub async fn translate_slug(&self, slug: &str) -> TranslateResult<String> {
        if slug.trim().is_empty() {
            return Ok(slug.to_string());
        }
        let words = slug.replace('-', " ");
        let translated = self.translate_text(&words).await?;
        Ok(slugify_for_locale(&translated, self.request.to_locale()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockBackend, MockMode, TranslationRequest};
    use crate::options::TranslationOptions;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[test]
    fn test_slugify_for_locale() {
        assert_eq!(slugify_for_locale("Straße & Café", "de"), "strasse-und-cafe");
        assert_eq!(slugify_for_locale("Bed & Breakfast", "en-GB"), "bed-and-breakfast");
        assert_eq!(slugify_for_locale("Smørrebrød", "da"), "smoerrebroed");
        assert_eq!(slugify_for_locale("Rooms & Suites", "fr"), "rooms-et-suites");
    }

    #[tokio::test]
    async fn test_slug_round_trip() {
        let translator = DocumentTranslator::new(
            Arc::new(MockBackend::new(MockMode::Prefix)),
            TranslationRequest::new(TranslationOptions::new("en", "es"), false),
        );
        assert_eq!(
            translator.translate_slug("my-great-post").await.unwrap(),
            "translated-my-great-post"
        );
    }

    #[tokio::test]
    async fn test_translated_slug_uses_target_conventions() {
        let mut mappings = HashMap::new();
        mappings.insert(
            ("rooms and suites".to_string(), "de".to_string()),
            "Zimmer & Suiten für Gäste".to_string(),
        );
        let translator = DocumentTranslator::new(
            Arc::new(MockBackend::new(MockMode::Mappings(mappings))),
            TranslationRequest::new(TranslationOptions::new("en", "de"), false),
        );
        assert_eq!(
            translator.translate_slug("rooms-and-suites").await.unwrap(),
            "zimmer-und-suiten-fuer-gaeste"
        );
    }
}
