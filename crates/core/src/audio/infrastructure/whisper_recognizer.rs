use std::path::Path;

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::speech_recognizer::{RecognitionRequest, SpeechRecognizer};
use crate::audio::domain::transcript::TranscriptSegment;
use crate::shared::constants::WHISPER_SAMPLE_RATE;

/// Speech recognizer using whisper.cpp via whisper-rs.
///
/// The model is loaded once; each call creates its own inference state so
/// concurrent jobs can share one instance.
pub struct WhisperRecognizer {
    context: WhisperContext,
}

impl WhisperRecognizer {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if !model_path.exists() {
            return Err(format!("Whisper model not found at: {}", model_path.display()).into());
        }
        let context = WhisperContext::new_with_params(
            model_path.to_str().ok_or("Invalid model path")?,
            WhisperContextParameters::default(),
        )
        .map_err(|e| format!("Failed to load Whisper model: {e}"))?;

        Ok(Self { context })
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe(
        &self,
        audio: &AudioSegment,
        request: &RecognitionRequest,
    ) -> Result<Vec<TranscriptSegment>, Box<dyn std::error::Error>> {
        if audio.sample_rate() != WHISPER_SAMPLE_RATE || audio.channels() != 1 {
            return Err(format!(
                "Whisper needs {WHISPER_SAMPLE_RATE} Hz mono audio, got {} Hz x{}",
                audio.sample_rate(),
                audio.channels()
            )
            .into());
        }
        if audio.samples().is_empty() {
            return Ok(Vec::new());
        }

        let mut state = self
            .context
            .create_state()
            .map_err(|e| format!("Failed to create Whisper state: {e}"))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(request.language.as_str()));
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_n_threads(num_cpus().min(4) as i32);
        if let Some(prompt) = request.initial_prompt.as_deref() {
            params.set_initial_prompt(prompt);
        }

        state
            .full(params, audio.samples())
            .map_err(|e| format!("Whisper inference failed: {e}"))?;

        let mut segments = Vec::new();
        let num_segments = state.full_n_segments();

        for seg_idx in 0..num_segments {
            let segment = match state.get_segment(seg_idx) {
                Some(s) => s,
                None => continue,
            };

            let text = match segment.to_str_lossy() {
                Ok(t) => t.trim().to_string(),
                Err(_) => continue,
            };
            if text.is_empty() {
                continue;
            }

            // Segment timestamps are in centiseconds (10ms units)
            let start_time = segment.start_timestamp() as f64 / 100.0;
            let end_time = segment.end_timestamp() as f64 / 100.0;

            segments.push(TranscriptSegment::new(start_time, end_time, text));
        }

        log::debug!(
            "Whisper ({}) produced {} segments for {:.2}s of audio",
            request.language,
            segments.len(),
            audio.duration()
        );

        Ok(segments)
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
