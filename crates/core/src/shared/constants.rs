pub const WHISPER_MODEL_NAME: &str = "ggml-large-v3-turbo.bin";
pub const WHISPER_MODEL_URL: &str =
    "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v3-turbo.bin";
pub const WHISPER_SAMPLE_RATE: u32 = 16000;

/// Whisper language code for the English half of every recording.
pub const ENGLISH_LANGUAGE: &str = "en";
pub const ENGLISH_LANGUAGE_ID: &str = "eng";

pub const SOURCE_LANGUAGE: &str = "ar";
/// ISO 639-3 code the language identifier reports for the source language.
pub const SOURCE_LANGUAGE_ID: &str = "ara";

/// Primes the recognizer to expect a source-language recitation followed by
/// its English translation in the same file.
pub const SOURCE_INITIAL_PROMPT: &str =
    "Contains arabic followed by english translation. For example: أن ناس The people";

/// Boundary estimate used when no transcript segment is identified as the
/// source language. This is a degraded-signal fallback, not a measurement.
pub const FALLBACK_BOUNDARY_SECS: f64 = 5.0;

pub const SILENCE_THRESHOLD_DBFS: f64 = -50.0;
pub const MIN_SILENCE_MS: u64 = 50;

/// Fraction of the chosen silence gap at which the cut is placed.
pub const CUT_POSITION_IN_GAP: f64 = 5.0 / 6.0;

/// Items scoring below this word error rate are treated as matches on read.
pub const MATCH_WER_THRESHOLD: f64 = 0.15;

pub const DEFAULT_CONCURRENCY: usize = 2;

pub const AUDIO_EXTENSION: &str = "wav";
