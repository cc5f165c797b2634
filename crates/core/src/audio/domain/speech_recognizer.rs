use super::audio_segment::AudioSegment;
use super::transcript::TranscriptSegment;

/// What to listen for in one recognition call.
#[derive(Clone, Debug, PartialEq)]
pub struct RecognitionRequest {
    /// Whisper language code, e.g. `ar` or `en`.
    pub language: String,
    pub initial_prompt: Option<String>,
}

impl RecognitionRequest {
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
            initial_prompt: None,
        }
    }

    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.initial_prompt = Some(prompt.to_string());
        self
    }
}

/// Domain interface for speech-to-text transcription.
///
/// Implementations run inference on 16 kHz mono audio and return segments in
/// document order. One instance is shared by every running job.
pub trait SpeechRecognizer: Send + Sync {
    fn transcribe(
        &self,
        audio: &AudioSegment,
        request: &RecognitionRequest,
    ) -> Result<Vec<TranscriptSegment>, Box<dyn std::error::Error>>;
}
