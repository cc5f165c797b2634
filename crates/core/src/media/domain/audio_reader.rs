use crate::audio::domain::audio_segment::AudioSegment;
use std::path::Path;

/// Domain interface for decoding an audio file.
pub trait AudioReader: Send + Sync {
    /// Decode the audio stream to a mono PCM AudioSegment at the given sample rate.
    /// Returns None if the file has no audio stream.
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: u32,
    ) -> Result<Option<AudioSegment>, Box<dyn std::error::Error>>;

    /// Decode the audio stream at its own sample rate and channel count,
    /// interleaved. Returns None if the file has no audio stream.
    fn read_native(&self, path: &Path)
        -> Result<Option<AudioSegment>, Box<dyn std::error::Error>>;
}
