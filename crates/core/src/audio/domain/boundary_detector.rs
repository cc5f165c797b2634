use std::sync::Arc;

use super::audio_segment::AudioSegment;
use super::language_identifier::LanguageIdentifier;
use super::speech_recognizer::{RecognitionRequest, SpeechRecognizer};
use super::transcript::TranscriptSegment;

/// How the boundary estimate was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundarySource {
    /// End of the last segment identified as the source language.
    SourceSegment { index: usize },
    /// No segment was identified as the source language; the configured
    /// fallback was used instead.
    Fallback,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoundaryEstimate {
    pub seconds: f64,
    pub source: BoundarySource,
    pub segments: Vec<TranscriptSegment>,
}

impl BoundaryEstimate {
    pub fn target_ms(&self) -> f64 {
        self.seconds * 1000.0
    }

    pub fn is_fallback(&self) -> bool {
        self.source == BoundarySource::Fallback
    }
}

/// Estimates where source-language speech ends in a bilingual recording.
///
/// Transcribes the whole file in the source language, classifies each
/// segment's text, and takes the end of the last source-language segment.
/// Segments the identifier cannot classify are treated as not source-language.
pub struct SpeechBoundaryDetector {
    recognizer: Arc<dyn SpeechRecognizer>,
    identifier: Arc<dyn LanguageIdentifier>,
    request: RecognitionRequest,
    source_language_id: String,
    fallback_secs: f64,
}

impl SpeechBoundaryDetector {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        identifier: Arc<dyn LanguageIdentifier>,
        request: RecognitionRequest,
        source_language_id: &str,
        fallback_secs: f64,
    ) -> Self {
        Self {
            recognizer,
            identifier,
            request,
            source_language_id: source_language_id.to_string(),
            fallback_secs,
        }
    }

    pub fn estimate(
        &self,
        audio: &AudioSegment,
    ) -> Result<BoundaryEstimate, Box<dyn std::error::Error>> {
        let segments = self.recognizer.transcribe(audio, &self.request)?;
        Ok(self.estimate_from_segments(segments))
    }

    pub fn estimate_from_segments(&self, mut segments: Vec<TranscriptSegment>) -> BoundaryEstimate {
        for (idx, segment) in segments.iter_mut().enumerate() {
            match self.identifier.identify(segment.text.trim()) {
                Ok(lang) => segment.detected_language = Some(lang),
                Err(e) => log::debug!(
                    "Discarding segment {idx} ({:.2}s-{:.2}s) from boundary search: {e}",
                    segment.start_time,
                    segment.end_time
                ),
            }
        }

        let last_source = segments
            .iter()
            .rposition(|s| s.detected_language.as_deref() == Some(self.source_language_id.as_str()));

        match last_source {
            Some(index) => BoundaryEstimate {
                seconds: segments[index].end_time,
                source: BoundarySource::SourceSegment { index },
                segments,
            },
            None => {
                log::warn!(
                    "No {} segment among {} transcript segments; falling back to {:.1}s boundary",
                    self.source_language_id,
                    segments.len(),
                    self.fallback_secs
                );
                BoundaryEstimate {
                    seconds: self.fallback_secs,
                    source: BoundarySource::Fallback,
                    segments,
                }
            }
        }
    }
}
