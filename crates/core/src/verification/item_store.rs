use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read item store {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid item store {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write item store {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize items: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("no stored item for {0}")]
    NotFound(String),
}

/// Persisted verification outcome for one asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationItem {
    pub wer: f64,
    pub forced_approved: bool,
    /// Strict match: normalized transcription equals normalized reference.
    pub matches: bool,
    pub english_transcription: String,
}

impl VerificationItem {
    /// Whether the item counts as matching when read. Computed, never stored.
    pub fn effective_matches(&self, wer_threshold: f64) -> bool {
        self.matches || self.wer < wer_threshold || self.forced_approved
    }
}

/// Key-value store of verification items keyed by asset identifier.
///
/// Every mutation is persisted before it returns.
pub trait ItemStore: Send + Sync {
    fn get(&self, item_id: &str) -> Option<VerificationItem>;

    fn set(&self, item_id: &str, item: VerificationItem) -> Result<(), StoreError>;

    /// Returns whether the item existed.
    fn delete(&self, item_id: &str) -> Result<bool, StoreError>;

    fn list_all(&self) -> BTreeMap<String, VerificationItem>;

    /// Marks an existing item as manually approved, keeping its other fields.
    fn force_approve(&self, item_id: &str) -> Result<VerificationItem, StoreError> {
        let mut item = self
            .get(item_id)
            .ok_or_else(|| StoreError::NotFound(item_id.to_string()))?;
        item.forced_approved = true;
        self.set(item_id, item.clone())?;
        Ok(item)
    }
}
