use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use super::asset_locator::{AssetLocator, AudioAsset};
use crate::verification::item_store::{ItemStore, StoreError, VerificationItem};
use crate::verification::reference_lookup::ReferenceLookup;

/// One row of the catalog: a combined recording, whichever halves exist on
/// disk, and its verification state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub combined_path: PathBuf,
    pub source_path: Option<PathBuf>,
    pub english_path: Option<PathBuf>,
    pub source_translation: Option<String>,
    pub english_transcription: Option<String>,
    pub wer: Option<f64>,
    pub forced_approved: Option<bool>,
    pub matches: Option<bool>,
    /// Strict match, low WER or manual approval.
    pub effective_match: Option<bool>,
}

/// Read side over the combined tree, the reference table and the item
/// store, plus manual maintenance of stored items.
pub struct Catalog {
    assets: AssetLocator,
    references: Arc<dyn ReferenceLookup>,
    store: Arc<dyn ItemStore>,
    match_wer_threshold: f64,
}

impl Catalog {
    pub fn new(
        assets: AssetLocator,
        references: Arc<dyn ReferenceLookup>,
        store: Arc<dyn ItemStore>,
        match_wer_threshold: f64,
    ) -> Self {
        Self {
            assets,
            references,
            store,
            match_wer_threshold,
        }
    }

    /// Every combined recording, sorted by id.
    pub fn list(&self) -> Vec<CatalogEntry> {
        self.assets
            .list()
            .into_iter()
            .map(|asset| self.entry(asset))
            .collect()
    }

    pub fn approve(&self, item_id: &str) -> Result<VerificationItem, StoreError> {
        let item = self.store.force_approve(item_id)?;
        log::info!("Force-approved {item_id} (WER {:.3})", item.wer);
        Ok(item)
    }

    /// Returns whether the item existed.
    pub fn delete(&self, item_id: &str) -> Result<bool, StoreError> {
        let existed = self.store.delete(item_id)?;
        if existed {
            log::info!("Deleted stored item {item_id}");
        }
        Ok(existed)
    }

    fn entry(&self, asset: AudioAsset) -> CatalogEntry {
        let stored = self.store.get(&asset.id);
        CatalogEntry {
            source_translation: self.references.translation(&asset.id),
            english_transcription: stored.as_ref().map(|i| i.english_transcription.clone()),
            wer: stored.as_ref().map(|i| i.wer),
            forced_approved: stored.as_ref().map(|i| i.forced_approved),
            matches: stored.as_ref().map(|i| i.matches),
            effective_match: stored
                .as_ref()
                .map(|i| i.effective_matches(self.match_wer_threshold)),
            source_path: Some(asset.source_path).filter(|p| p.exists()),
            english_path: Some(asset.english_path).filter(|p| p.exists()),
            combined_path: asset.combined_path,
            id: asset.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verification::json_item_store::JsonItemStore;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    struct MapReferences(HashMap<String, String>);

    impl ReferenceLookup for MapReferences {
        fn translation(&self, item_id: &str) -> Option<String> {
            self.0.get(item_id).cloned()
        }
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"RIFF").unwrap();
    }

    fn catalog(root: &Path) -> (Catalog, Arc<JsonItemStore>) {
        let store = Arc::new(JsonItemStore::open(&root.join("items.json")).unwrap());
        let references = MapReferences(HashMap::from([(
            "114_1".to_string(),
            "Say, I seek refuge".to_string(),
        )]));
        let catalog = Catalog::new(
            AssetLocator::new(
                root.join("combined"),
                root.join("arabic"),
                root.join("english"),
            ),
            Arc::new(references),
            store.clone(),
            0.15,
        );
        (catalog, store)
    }

    fn item(wer: f64) -> VerificationItem {
        VerificationItem {
            wer,
            forced_approved: false,
            matches: false,
            english_transcription: "Say I seek refuge".to_string(),
        }
    }

    #[test]
    fn test_list_reports_halves_references_and_items() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("combined/114/114_1.wav"));
        touch(&root.join("combined/114/114_2.wav"));
        touch(&root.join("arabic/114/114_1.wav"));
        touch(&root.join("english/114/114_1.wav"));
        let (catalog, store) = catalog(root);
        store.set("114_1", item(0.1)).unwrap();

        let entries = catalog.list();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.id, "114_1");
        assert_eq!(first.source_path, Some(root.join("arabic/114/114_1.wav")));
        assert_eq!(first.english_path, Some(root.join("english/114/114_1.wav")));
        assert_eq!(first.source_translation.as_deref(), Some("Say, I seek refuge"));
        assert_eq!(first.wer, Some(0.1));
        assert_eq!(first.matches, Some(false));
        assert_eq!(first.effective_match, Some(true));

        let second = &entries[1];
        assert_eq!(second.id, "114_2");
        assert!(second.source_path.is_none());
        assert!(second.english_path.is_none());
        assert!(second.source_translation.is_none());
        assert!(second.wer.is_none());
        assert!(second.effective_match.is_none());
    }

    #[test]
    fn test_approve_and_delete() {
        let tmp = TempDir::new().unwrap();
        let (catalog, store) = catalog(tmp.path());
        store.set("114_1", item(0.9)).unwrap();

        assert!(catalog.approve("114_1").unwrap().forced_approved);
        assert!(store.get("114_1").unwrap().effective_matches(0.15));
        assert!(matches!(catalog.approve("1_1"), Err(StoreError::NotFound(_))));

        assert!(catalog.delete("114_1").unwrap());
        assert!(!catalog.delete("114_1").unwrap());
    }

    #[test]
    fn test_entry_serializes_missing_fields_as_null() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("combined/1.wav"));
        let (catalog, _) = catalog(tmp.path());

        let json = serde_json::to_value(catalog.list()).unwrap();
        assert_eq!(json[0]["id"], "1");
        assert!(json[0]["english_path"].is_null());
        assert!(json[0]["wer"].is_null());
    }
}
