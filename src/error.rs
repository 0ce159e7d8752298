use thiserror::Error;

/// Error types for content translation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// No backend selected, missing API key or missing currency settings
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Non-success status or transport failure from the FX or translation provider
    #[error("Remote service error: {0}")]
    RemoteService(String),
    /// The model response lacks the contracted code-fence shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// The generated snippet is not well-formed or cannot be evaluated
    #[error("Evaluation error: {0}")]
    Evaluation(String),
    /// The source field has nothing to translate
    #[error("{0}")]
    Validation(String),
    /// Locale code could not be understood
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),
    /// A document could not be decomposed or recomposed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl TranslateError {
    /// Whether the error is guidance the editor can act on rather than a failure
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, TranslateError::Validation(_))
    }
}

impl From<reqwest::Error> for TranslateError {
    fn from(err: reqwest::Error) -> Self {
        TranslateError::RemoteService(err.to_string())
    }
}

impl From<serde_json::Error> for TranslateError {
    fn from(err: serde_json::Error) -> Self {
        TranslateError::Parse(err.to_string())
    }
}

/// Result type for translation operations
pub type TranslateResult<T> = Result<T, TranslateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_validation_is_user_correctable() {
        assert!(TranslateError::Validation("add content".to_string()).is_user_correctable());
        assert!(!TranslateError::Configuration("no key".to_string()).is_user_correctable());
        assert!(!TranslateError::RemoteService("503".to_string()).is_user_correctable());
    }

    #[test]
    fn test_validation_message_is_bare() {
        let err = TranslateError::Validation("Please add content to the default field (en)".into());
        assert_eq!(err.to_string(), "Please add content to the default field (en)");
    }

    #[test]
    fn test_json_error_maps_to_parse() {
        let err: TranslateError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, TranslateError::Parse(_)));
    }
}
