use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::asset_locator::AudioAsset;
use super::split_error::SplitError;
use crate::audio::domain::audio_segment::AudioSegment;
use crate::media::domain::audio_writer::AudioWriter;

/// Cuts a decoded recording in two and writes the halves next to each other
/// in the source-language and English trees.
pub struct SegmentWriter {
    writer: Arc<dyn AudioWriter>,
}

impl SegmentWriter {
    pub fn new(writer: Arc<dyn AudioWriter>) -> Self {
        Self { writer }
    }

    /// Writes `[0, cut_ms)` to the asset's source path and `[cut_ms, end)` to
    /// its English path, creating directories as needed.
    pub fn write(
        &self,
        asset: &AudioAsset,
        audio: &AudioSegment,
        cut_ms: f64,
    ) -> Result<(), SplitError> {
        let (source, english) = audio.split_at_ms(cut_ms);
        log::debug!(
            "Cutting {} at {cut_ms:.0} ms ({:.2}s + {:.2}s)",
            asset.id,
            source.duration(),
            english.duration()
        );
        self.write_part(&asset.source_path, &source)?;
        self.write_part(&asset.english_path, &english)
    }

    fn write_part(&self, path: &Path, audio: &AudioSegment) -> Result<(), SplitError> {
        let failure = |reason: String| SplitError::WriteFailure {
            path: path.to_path_buf(),
            reason,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| failure(e.to_string()))?;
        }
        self.writer
            .write_audio(path, audio)
            .map_err(|e| failure(e.to_string()))
    }
}
