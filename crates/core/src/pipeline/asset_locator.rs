use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::shared::config::SplitterConfig;
use crate::shared::constants::AUDIO_EXTENSION;

/// One combined recording and where its two halves go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioAsset {
    /// Filename stem of the combined file, e.g. `114_1`.
    pub id: String,
    pub combined_path: PathBuf,
    pub source_path: PathBuf,
    pub english_path: PathBuf,
}

/// Finds combined recordings under the combined tree and maps each onto the
/// same relative location in the source and English trees.
#[derive(Clone, Debug)]
pub struct AssetLocator {
    combined_root: PathBuf,
    source_root: PathBuf,
    english_root: PathBuf,
}

impl AssetLocator {
    pub fn new(combined_root: PathBuf, source_root: PathBuf, english_root: PathBuf) -> Self {
        Self {
            combined_root,
            source_root,
            english_root,
        }
    }

    pub fn from_config(config: &SplitterConfig) -> Self {
        Self::new(
            config.combined_root(),
            config.source_root(),
            config.english_root(),
        )
    }

    pub fn combined_root(&self) -> &Path {
        &self.combined_root
    }

    /// Every combined `.wav`, ordered by id then path. A missing combined
    /// tree yields an empty list.
    pub fn list(&self) -> Vec<AudioAsset> {
        let mut assets: Vec<AudioAsset> = WalkDir::new(&self.combined_root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| self.asset_for(e.path()))
            .collect();
        assets.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.combined_path.cmp(&b.combined_path)));
        assets
    }

    /// The combined recording whose stem is `id`. When several sub-directories
    /// hold the same stem the first in path order wins.
    pub fn find(&self, id: &str) -> Option<AudioAsset> {
        WalkDir::new(&self.combined_root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().file_stem().is_some_and(|s| s == id))
            .find_map(|e| self.asset_for(e.path()))
    }

    fn asset_for(&self, combined_path: &Path) -> Option<AudioAsset> {
        let is_wav = combined_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(AUDIO_EXTENSION));
        if !is_wav {
            return None;
        }
        let id = combined_path.file_stem()?.to_str()?.to_string();
        let relative = combined_path.strip_prefix(&self.combined_root).ok()?;
        let file_name = format!("{id}.{AUDIO_EXTENSION}");
        let relative_dir = relative.parent().unwrap_or(Path::new(""));

        Some(AudioAsset {
            source_path: self.source_root.join(relative_dir).join(&file_name),
            english_path: self.english_root.join(relative_dir).join(&file_name),
            combined_path: combined_path.to_path_buf(),
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn locator(root: &Path) -> AssetLocator {
        AssetLocator::new(
            root.join("combined"),
            root.join("arabic"),
            root.join("english"),
        )
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"RIFF").unwrap();
    }

    #[test]
    fn test_find_mirrors_subdirectory() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("combined/114/114_1.wav"));

        let asset = locator(tmp.path()).find("114_1").unwrap();
        assert_eq!(asset.id, "114_1");
        assert_eq!(asset.combined_path, tmp.path().join("combined/114/114_1.wav"));
        assert_eq!(asset.source_path, tmp.path().join("arabic/114/114_1.wav"));
        assert_eq!(asset.english_path, tmp.path().join("english/114/114_1.wav"));
    }

    #[test]
    fn test_find_at_root() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("combined/1.wav"));
        let asset = locator(tmp.path()).find("1").unwrap();
        assert_eq!(asset.english_path, tmp.path().join("english/1.wav"));
    }

    #[test]
    fn test_find_missing_and_non_wav() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("combined/2_1.mp3"));
        let locator = locator(tmp.path());
        assert!(locator.find("2_1").is_none());
        assert!(locator.find("114_1").is_none());
    }

    #[test]
    fn test_list_sorted_by_id() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("combined/114/114_2.wav"));
        touch(&tmp.path().join("combined/1/1_1.wav"));
        touch(&tmp.path().join("combined/114/114_1.WAV"));
        touch(&tmp.path().join("combined/notes.txt"));

        let ids: Vec<String> = locator(tmp.path()).list().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["114_1", "114_2", "1_1"]);
    }

    #[test]
    fn test_list_without_combined_tree() {
        let tmp = TempDir::new().unwrap();
        assert!(locator(tmp.path()).list().is_empty());
    }
}
