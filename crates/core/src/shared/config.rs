use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_CONCURRENCY, FALLBACK_BOUNDARY_SECS, MATCH_WER_THRESHOLD, MIN_SILENCE_MS,
    SILENCE_THRESHOLD_DBFS, SOURCE_LANGUAGE, SOURCE_LANGUAGE_ID, WHISPER_MODEL_NAME,
    WHISPER_MODEL_URL,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
}

/// Runtime settings for the splitter. Every field has a default, so a config
/// file only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    /// Root holding the combined, source and English audio trees.
    pub data_root: PathBuf,
    pub combined_dir: String,
    pub source_dir: String,
    pub english_dir: String,
    pub item_store_path: PathBuf,
    pub reference_path: PathBuf,
    pub concurrency: usize,
    pub source_language: String,
    pub source_language_id: String,
    pub silence_threshold_dbfs: f64,
    pub min_silence_ms: u64,
    pub fallback_boundary_secs: f64,
    pub match_wer_threshold: f64,
    pub whisper_model_name: String,
    pub whisper_model_url: String,
    pub whisper_model_path: Option<PathBuf>,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("static"),
            combined_dir: "combined".to_string(),
            source_dir: "arabic".to_string(),
            english_dir: "english".to_string(),
            item_store_path: PathBuf::from("items.json"),
            reference_path: PathBuf::from("qb.json"),
            concurrency: DEFAULT_CONCURRENCY,
            source_language: SOURCE_LANGUAGE.to_string(),
            source_language_id: SOURCE_LANGUAGE_ID.to_string(),
            silence_threshold_dbfs: SILENCE_THRESHOLD_DBFS,
            min_silence_ms: MIN_SILENCE_MS,
            fallback_boundary_secs: FALLBACK_BOUNDARY_SECS,
            match_wer_threshold: MATCH_WER_THRESHOLD,
            whisper_model_name: WHISPER_MODEL_NAME.to_string(),
            whisper_model_url: WHISPER_MODEL_URL.to_string(),
            whisper_model_path: None,
        }
    }
}

impl SplitterConfig {
    /// Platform config file location, e.g. `~/.config/Recital/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("Recital").join("config.json"))
    }

    /// Load from `explicit` if given (it must exist), else from the platform
    /// config file if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }

    pub fn combined_root(&self) -> PathBuf {
        self.data_root.join(&self.combined_dir)
    }

    pub fn source_root(&self) -> PathBuf {
        self.data_root.join(&self.source_dir)
    }

    pub fn english_root(&self) -> PathBuf {
        self.data_root.join(&self.english_dir)
    }
}
