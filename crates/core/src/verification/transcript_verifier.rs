use std::sync::Arc;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::speech_recognizer::{RecognitionRequest, SpeechRecognizer};
use crate::audio::domain::text_normalizer::normalize;
use crate::audio::domain::transcript::join_text;
use crate::audio::domain::word_error_rate::word_error_rate;
use crate::shared::constants::ENGLISH_LANGUAGE;

/// How closely a transcription follows its reference translation.
#[derive(Clone, Debug, PartialEq)]
pub struct Verification {
    /// Raw recognizer output, before normalization.
    pub transcription: String,
    pub wer: f64,
    /// Normalized transcription and reference are identical.
    pub exact_match: bool,
}

impl Verification {
    /// Scores `transcription` against `reference` after normalizing both.
    pub fn score(transcription: &str, reference: &str) -> Self {
        let hypothesis = normalize(transcription);
        let reference = normalize(reference);
        Self {
            transcription: transcription.to_string(),
            wer: word_error_rate(&reference, &hypothesis),
            exact_match: hypothesis == reference,
        }
    }
}

/// Transcribes the English part of a split and scores it.
pub struct TranscriptVerifier {
    recognizer: Arc<dyn SpeechRecognizer>,
    request: RecognitionRequest,
}

impl TranscriptVerifier {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        Self {
            recognizer,
            request: RecognitionRequest::new(ENGLISH_LANGUAGE),
        }
    }

    pub fn verify(
        &self,
        english: &AudioSegment,
        reference: &str,
    ) -> Result<Verification, Box<dyn std::error::Error>> {
        let segments = self.recognizer.transcribe(english, &self.request)?;
        let verification = Verification::score(&join_text(&segments), reference);
        log::debug!(
            "Verified {:.2}s English segment: WER {:.3}, exact match {}",
            english.duration(),
            verification.wer,
            verification.exact_match
        );
        Ok(verification)
    }
}
