use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::item_store::{ItemStore, StoreError, VerificationItem};

type Items = BTreeMap<String, VerificationItem>;

/// Item store backed by a single pretty-printed JSON file.
///
/// The whole map is held in memory and rewritten on every mutation. The lock
/// is held across the write so concurrent jobs never interleave file writes,
/// and memory only changes once the file has been replaced.
pub struct JsonItemStore {
    path: PathBuf,
    items: Mutex<Items>,
}

impl JsonItemStore {
    /// Opens the store at `path`, starting empty if the file does not exist.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let items = if path.exists() {
            let json = fs::read_to_string(path).map_err(|e| StoreError::Read {
                path: path.to_path_buf(),
                source: e,
            })?;
            serde_json::from_str(&json).map_err(|e| StoreError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?
        } else {
            Items::new()
        };
        log::debug!("Opened item store {} ({} items)", path.display(), items.len());
        Ok(Self {
            path: path.to_path_buf(),
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, Items> {
        // The map is only ever swapped whole after a successful save
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn save(&self, items: &Items) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(items)?;
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(write_err)?;
        fs::rename(&tmp_path, &self.path).map_err(write_err)?;
        Ok(())
    }
}

impl ItemStore for JsonItemStore {
    fn get(&self, item_id: &str) -> Option<VerificationItem> {
        self.lock().get(item_id).cloned()
    }

    fn set(&self, item_id: &str, item: VerificationItem) -> Result<(), StoreError> {
        let mut items = self.lock();
        let mut next = items.clone();
        next.insert(item_id.to_string(), item);
        self.save(&next)?;
        *items = next;
        Ok(())
    }

    fn delete(&self, item_id: &str) -> Result<bool, StoreError> {
        let mut items = self.lock();
        if !items.contains_key(item_id) {
            return Ok(false);
        }
        let mut next = items.clone();
        next.remove(item_id);
        self.save(&next)?;
        *items = next;
        Ok(true)
    }

    fn list_all(&self) -> BTreeMap<String, VerificationItem> {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn item(wer: f64) -> VerificationItem {
        VerificationItem {
            wer,
            forced_approved: false,
            matches: wer == 0.0,
            english_transcription: format!("transcription {wer}"),
        }
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = JsonItemStore::open(&tmp.path().join("items.json")).unwrap();
        assert!(store.list_all().is_empty());
        assert!(store.get("114_1").is_none());
    }

    #[test]
    fn test_set_persists_immediately() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("items.json");
        let store = JsonItemStore::open(&path).unwrap();
        store.set("114_1", item(0.25)).unwrap();

        let reopened = JsonItemStore::open(&path).unwrap();
        assert_eq!(reopened.get("114_1"), Some(item(0.25)));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_set_overwrites() {
        let tmp = TempDir::new().unwrap();
        let store = JsonItemStore::open(&tmp.path().join("items.json")).unwrap();
        store.set("1_1", item(0.5)).unwrap();
        store.set("1_1", item(0.0)).unwrap();
        assert_eq!(store.get("1_1"), Some(item(0.0)));
        assert_eq!(store.list_all().len(), 1);
    }

    #[test]
    fn test_delete_reports_existence() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("items.json");
        let store = JsonItemStore::open(&path).unwrap();
        store.set("1_1", item(0.5)).unwrap();

        assert!(store.delete("1_1").unwrap());
        assert!(!store.delete("1_1").unwrap());
        assert!(JsonItemStore::open(&path).unwrap().list_all().is_empty());
    }

    #[test]
    fn test_creates_parent_directory() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state").join("items.json");
        let store = JsonItemStore::open(&path).unwrap();
        store.set("2", item(0.1)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_reads_existing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("items.json");
        fs::write(
            &path,
            r#"{"114_1": {"wer": 0.5, "forced_approved": true, "matches": false,
                "english_transcription": "In the name of God"}}"#,
        )
        .unwrap();
        let stored = JsonItemStore::open(&path).unwrap().get("114_1").unwrap();
        assert!(stored.forced_approved);
        assert_eq!(stored.english_transcription, "In the name of God");
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("items.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonItemStore::open(&path),
            Err(StoreError::Parse { .. })
        ));
    }

    #[test]
    fn test_failed_write_leaves_memory_unchanged() {
        let tmp = TempDir::new().unwrap();
        // A directory in place of the store file makes the rename fail
        let path = tmp.path().join("items.json");
        fs::create_dir(&path).unwrap();
        let store = JsonItemStore {
            path: path.clone(),
            items: Mutex::new(Items::new()),
        };
        assert!(matches!(
            store.set("1", item(0.2)),
            Err(StoreError::Write { .. })
        ));
        assert!(store.get("1").is_none());
    }

    #[test]
    fn test_concurrent_writers_all_land() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("items.json");
        let store = Arc::new(JsonItemStore::open(&path).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.set(&format!("1_{i}"), item(i as f64)).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(JsonItemStore::open(&path).unwrap().list_all().len(), 8);
    }
}
