use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::asset_locator::{AssetLocator, AudioAsset};
use super::pipeline_logger::{LogPipelineLogger, PipelineLogger};
use super::segment_writer::SegmentWriter;
use super::split_error::SplitError;
use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::boundary_detector::SpeechBoundaryDetector;
use crate::audio::domain::language_identifier::LanguageIdentifier;
use crate::audio::domain::silence_locator::SilenceLocator;
use crate::audio::domain::speech_recognizer::{RecognitionRequest, SpeechRecognizer};
use crate::audio::domain::split_point::{SplitPoint, SplitPointSelector};
use crate::media::domain::audio_reader::AudioReader;
use crate::media::domain::audio_writer::AudioWriter;
use crate::shared::config::SplitterConfig;
use crate::shared::constants::{SOURCE_INITIAL_PROMPT, WHISPER_SAMPLE_RATE};
use crate::verification::item_store::{ItemStore, VerificationItem};
use crate::verification::reference_lookup::ReferenceLookup;
use crate::verification::transcript_verifier::TranscriptVerifier;

/// How the cut position is chosen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SplitMode {
    /// Estimate the speech boundary and snap it to the nearest silence gap.
    Automatic,
    /// Cut exactly here, skipping boundary estimation and silence detection.
    Manual { cut_ms: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct SplitRequest {
    pub item_id: String,
    pub mode: SplitMode,
}

impl SplitRequest {
    pub fn automatic(item_id: &str) -> Self {
        Self {
            item_id: item_id.to_string(),
            mode: SplitMode::Automatic,
        }
    }

    pub fn manual(item_id: &str, cut_ms: f64) -> Self {
        Self {
            item_id: item_id.to_string(),
            mode: SplitMode::Manual { cut_ms },
        }
    }
}

/// Outcome of a successful split.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitResult {
    #[serde(rename = "split_time")]
    pub split_time_seconds: f64,
    pub english_transcription: String,
    #[serde(rename = "wer")]
    pub word_error_rate: f64,
    pub matches: bool,
    pub source_translation: String,
}

/// Runs one split job to completion on the calling thread.
pub trait SplitRunner: Send + Sync {
    fn run(&self, request: &SplitRequest) -> Result<SplitResult, SplitError>;
}

/// Shared services a split needs. The recognizer is loaded once and shared
/// by every job.
#[derive(Clone)]
pub struct SplitServices {
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub identifier: Arc<dyn LanguageIdentifier>,
    pub reader: Arc<dyn AudioReader>,
    pub writer: Arc<dyn AudioWriter>,
    pub references: Arc<dyn ReferenceLookup>,
    pub store: Arc<dyn ItemStore>,
}

/// Splits a combined recording into its source-language and English halves,
/// verifies the English half against the reference translation and stores
/// the verdict.
pub struct SplitAudioUseCase {
    assets: AssetLocator,
    reader: Arc<dyn AudioReader>,
    segments: SegmentWriter,
    detector: SpeechBoundaryDetector,
    silence: SilenceLocator,
    verifier: TranscriptVerifier,
    references: Arc<dyn ReferenceLookup>,
    store: Arc<dyn ItemStore>,
}

impl SplitAudioUseCase {
    pub fn new(config: &SplitterConfig, services: SplitServices) -> Self {
        let request =
            RecognitionRequest::new(&config.source_language).with_prompt(SOURCE_INITIAL_PROMPT);
        Self {
            assets: AssetLocator::from_config(config),
            reader: services.reader,
            segments: SegmentWriter::new(services.writer),
            detector: SpeechBoundaryDetector::new(
                Arc::clone(&services.recognizer),
                services.identifier,
                request,
                &config.source_language_id,
                config.fallback_boundary_secs,
            ),
            silence: SilenceLocator::new(config.silence_threshold_dbfs, config.min_silence_ms),
            verifier: TranscriptVerifier::new(services.recognizer),
            references: services.references,
            store: services.store,
        }
    }

    pub fn execute(
        &self,
        request: &SplitRequest,
        logger: &mut dyn PipelineLogger,
    ) -> Result<SplitResult, SplitError> {
        let id = request.item_id.as_str();

        // 1. Resolve the asset and its reference before touching any output
        let asset = self
            .assets
            .find(id)
            .ok_or_else(|| SplitError::AssetNotFound(id.to_string()))?;
        let reference = self
            .references
            .translation(id)
            .ok_or_else(|| SplitError::ReferenceNotFound(id.to_string()))?;

        // 2. Decode at the file's own rate and channel layout for cutting
        let t0 = Instant::now();
        let audio = self.decode_native(&asset.combined_path)?;
        logger.timing("decode", elapsed_ms(t0));

        // 3. Choose the cut
        let point = match request.mode {
            SplitMode::Automatic => self.locate_split(&asset, &audio, logger)?,
            SplitMode::Manual { cut_ms } => {
                let duration_ms = audio.duration() * 1000.0;
                if !(cut_ms.is_finite() && cut_ms >= 0.0 && cut_ms <= duration_ms) {
                    return Err(SplitError::InvalidSplitTime {
                        ms: cut_ms,
                        duration_ms,
                    });
                }
                SplitPoint::manual(cut_ms)
            }
        };
        logger.info(&format!("Cutting {id} at {:.3}s", point.cut_seconds()));

        // 4. Write both halves
        let t0 = Instant::now();
        self.segments.write(&asset, &audio, point.cut_ms)?;
        logger.timing("write", elapsed_ms(t0));

        // 5. Transcribe the written English half and score it
        let t0 = Instant::now();
        let english = self.decode(&asset.english_path, WHISPER_SAMPLE_RATE)?;
        let verification = self
            .verifier
            .verify(&english, &reference)
            .map_err(|e| SplitError::ModelInferenceError(e.to_string()))?;
        logger.timing("verify", elapsed_ms(t0));
        logger.metric("wer", verification.wer);

        // 6. Persist only once everything above succeeded
        let t0 = Instant::now();
        self.store.set(
            id,
            VerificationItem {
                wer: verification.wer,
                forced_approved: false,
                matches: verification.exact_match,
                english_transcription: verification.transcription.clone(),
            },
        )?;
        logger.timing("store", elapsed_ms(t0));

        Ok(SplitResult {
            split_time_seconds: point.cut_seconds(),
            english_transcription: verification.transcription,
            word_error_rate: verification.wer,
            matches: verification.exact_match,
            source_translation: reference,
        })
    }

    fn locate_split(
        &self,
        asset: &AudioAsset,
        audio: &AudioSegment,
        logger: &mut dyn PipelineLogger,
    ) -> Result<SplitPoint, SplitError> {
        let t0 = Instant::now();
        let speech = if audio.sample_rate() == WHISPER_SAMPLE_RATE && audio.channels() == 1 {
            audio.clone()
        } else {
            self.decode(&asset.combined_path, WHISPER_SAMPLE_RATE)?
        };
        let estimate = self
            .detector
            .estimate(&speech)
            .map_err(|e| SplitError::ModelInferenceError(e.to_string()))?;
        logger.timing("boundary", elapsed_ms(t0));
        if estimate.is_fallback() {
            logger.info(&format!(
                "No source-language speech recognized in {}; using fallback boundary {:.1}s",
                asset.id, estimate.seconds
            ));
        }

        let t0 = Instant::now();
        let gaps = self.silence.locate(audio);
        logger.timing("silence", elapsed_ms(t0));
        logger.metric("silence_gaps", gaps.len() as f64);

        SplitPointSelector::select(&gaps, estimate.target_ms())
            .ok_or_else(|| SplitError::NoSplitPointFound(asset.id.clone()))
    }

    fn decode_native(&self, path: &Path) -> Result<AudioSegment, SplitError> {
        self.reader
            .read_native(path)
            .map_err(|e| decode_error(path, e.to_string()))?
            .ok_or_else(|| decode_error(path, "no audio stream".to_string()))
    }

    fn decode(&self, path: &Path, sample_rate: u32) -> Result<AudioSegment, SplitError> {
        self.reader
            .read_audio(path, sample_rate)
            .map_err(|e| decode_error(path, e.to_string()))?
            .ok_or_else(|| decode_error(path, "no audio stream".to_string()))
    }
}

impl SplitRunner for SplitAudioUseCase {
    fn run(&self, request: &SplitRequest) -> Result<SplitResult, SplitError> {
        let mut logger = LogPipelineLogger::new(&request.item_id);
        let result = self.execute(request, &mut logger);
        logger.summary();
        result
    }
}

fn decode_error(path: &Path, reason: String) -> SplitError {
    SplitError::Decode {
        path: path.to_path_buf(),
        reason,
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
