use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LanguageIdError {
    #[error("no features in text")]
    NoFeatures,
    #[error("language could not be determined for {0:?}")]
    Undetermined(String),
    #[error("unsupported language code {0:?}")]
    UnsupportedLanguage(String),
}

/// Domain interface for guessing the language of a short text.
pub trait LanguageIdentifier: Send + Sync {
    /// Returns the language code of `text` in the identifier's own code space.
    fn identify(&self, text: &str) -> Result<String, LanguageIdError>;
}
