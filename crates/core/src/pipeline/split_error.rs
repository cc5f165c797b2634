use std::path::PathBuf;

use thiserror::Error;

use crate::verification::item_store::StoreError;

/// Everything that can end a split job without a result.
#[derive(Error, Debug)]
pub enum SplitError {
    #[error("no combined audio for {0}")]
    AssetNotFound(String),
    #[error("could not decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("no reference translation for {0}")]
    ReferenceNotFound(String),
    #[error("no silence gap to split {0} at")]
    NoSplitPointFound(String),
    #[error("split time {ms} ms is outside 0..={duration_ms} ms")]
    InvalidSplitTime { ms: f64, duration_ms: f64 },
    #[error("speech recognition failed: {0}")]
    ModelInferenceError(String),
    #[error("failed to write {path}: {reason}")]
    WriteFailure { path: PathBuf, reason: String },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("split worker panicked: {0}")]
    WorkerPanicked(String),
    #[error("job slots are closed")]
    SlotsClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_cause() {
        assert_eq!(
            SplitError::ReferenceNotFound("114_9".into()).to_string(),
            "no reference translation for 114_9"
        );
        assert_eq!(
            SplitError::InvalidSplitTime {
                ms: -1.0,
                duration_ms: 3000.0
            }
            .to_string(),
            "split time -1 ms is outside 0..=3000 ms"
        );
    }

    #[test]
    fn test_store_error_converts() {
        let err: SplitError = StoreError::NotFound("1".into()).into();
        assert!(matches!(err, SplitError::Store(_)));
        assert_eq!(err.to_string(), "no stored item for 1");
    }
}
