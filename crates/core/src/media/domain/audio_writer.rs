use crate::audio::domain::audio_segment::AudioSegment;
use std::path::Path;

/// Domain interface for encoding an AudioSegment to a standalone audio file.
pub trait AudioWriter: Send + Sync {
    /// Write `audio` to `path`, replacing any existing file. The parent
    /// directory must already exist.
    fn write_audio(&self, path: &Path, audio: &AudioSegment)
        -> Result<(), Box<dyn std::error::Error>>;
}
