use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use super::reference_lookup::{ReferenceKey, ReferenceLookup};

#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("failed to read reference table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid reference table {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("reference table {0} is not a JSON object")]
    NotAnObject(PathBuf),
}

/// Reference translations loaded once from a JSON document shaped like
///
/// ```json
/// { "114": { "title": "The People", "1": "Say, I seek refuge..." } }
/// ```
///
/// Chapter keys map to objects holding a `title` and one string per verse.
#[derive(Debug, Clone)]
pub struct JsonReferenceTable {
    table: Value,
}

impl JsonReferenceTable {
    pub fn load(path: &Path) -> Result<Self, ReferenceError> {
        let json = fs::read_to_string(path).map_err(|e| ReferenceError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let table: Value = serde_json::from_str(&json).map_err(|e| ReferenceError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        if !table.is_object() {
            return Err(ReferenceError::NotAnObject(path.to_path_buf()));
        }
        log::info!(
            "Loaded {} reference chapters from {}",
            table.as_object().map_or(0, |t| t.len()),
            path.display()
        );
        Ok(Self { table })
    }

    pub fn from_value(table: Value) -> Self {
        Self { table }
    }

    fn entry(&self, key: ReferenceKey) -> Option<&str> {
        let chapter = match key {
            ReferenceKey::Chapter(c) | ReferenceKey::Verse { chapter: c, .. } => {
                self.table.get(c.to_string())?
            }
        };
        let value = match key {
            ReferenceKey::Chapter(_) => chapter.get("title"),
            ReferenceKey::Verse { verse, .. } => chapter.get(verse.to_string()),
        };
        value.and_then(Value::as_str)
    }
}

impl ReferenceLookup for JsonReferenceTable {
    fn translation(&self, item_id: &str) -> Option<String> {
        let key = ReferenceKey::parse(item_id)?;
        let found = self.entry(key).map(str::to_string);
        if found.is_none() {
            log::debug!("No reference translation for {item_id} ({key:?})");
        }
        found
    }
}
