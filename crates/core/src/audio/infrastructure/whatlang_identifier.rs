use whatlang::{Detector, Lang};

use crate::audio::domain::language_identifier::{LanguageIdError, LanguageIdentifier};
use crate::shared::constants::ENGLISH_LANGUAGE_ID;

/// Trigram/script based language identification via whatlang, restricted to
/// the source language and English.
///
/// Reports ISO 639-3 codes (`ara`, `eng`, ...). Without the restriction short
/// Arabic verses are routinely scored as Urdu or Persian.
pub struct WhatlangIdentifier {
    detector: Detector,
}

impl WhatlangIdentifier {
    pub fn new(source_language_id: &str) -> Result<Self, LanguageIdError> {
        let mut allowed = Vec::with_capacity(2);
        for code in [source_language_id, ENGLISH_LANGUAGE_ID] {
            let lang = Lang::from_code(code)
                .ok_or_else(|| LanguageIdError::UnsupportedLanguage(code.to_string()))?;
            if !allowed.contains(&lang) {
                allowed.push(lang);
            }
        }
        Ok(Self {
            detector: Detector::with_allowlist(allowed),
        })
    }
}

impl LanguageIdentifier for WhatlangIdentifier {
    fn identify(&self, text: &str) -> Result<String, LanguageIdError> {
        let trimmed = text.trim();
        if !trimmed.chars().any(char::is_alphabetic) {
            return Err(LanguageIdError::NoFeatures);
        }
        self.detector
            .detect(trimmed)
            .map(|info| info.lang().code().to_string())
            .ok_or_else(|| LanguageIdError::Undetermined(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn arabic_english() -> WhatlangIdentifier {
        WhatlangIdentifier::new("ara").unwrap()
    }

    #[rstest]
    #[case::opening("بسم الله الرحمن الرحيم الحمد لله رب العالمين")]
    #[case::short_verse("لم يلد ولم يولد")]
    #[case::three_words("قل أعوذ برب الناس")]
    fn test_arabic_text_identified(#[case] text: &str) {
        assert_eq!(arabic_english().identify(text).unwrap(), "ara");
    }

    #[rstest]
    #[case::sentence("In the name of God, the most gracious, the most merciful")]
    #[case::short("In the name of God")]
    fn test_english_text_identified(#[case] text: &str) {
        assert_eq!(arabic_english().identify(text).unwrap(), "eng");
    }

    #[test]
    fn test_unknown_source_code_rejected() {
        assert_eq!(
            WhatlangIdentifier::new("xx").err(),
            Some(LanguageIdError::UnsupportedLanguage("xx".to_string()))
        );
    }

    #[rstest]
    #[case::empty("")]
    #[case::whitespace("   ")]
    #[case::digits_and_punctuation("12, 34 ... !")]
    fn test_featureless_text_is_error(#[case] text: &str) {
        assert_eq!(
            arabic_english().identify(text),
            Err(LanguageIdError::NoFeatures)
        );
    }
}
