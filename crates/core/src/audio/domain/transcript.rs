/// One time-stamped stretch of recognized speech.
#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptSegment {
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
    /// Filled in by language identification; `None` until classified or
    /// when classification failed.
    pub detected_language: Option<String>,
}

impl TranscriptSegment {
    pub fn new(start_time: f64, end_time: f64, text: impl Into<String>) -> Self {
        Self {
            start_time,
            end_time,
            text: text.into(),
            detected_language: None,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Joins segment texts the way a full-file transcription reads.
pub fn join_text(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
