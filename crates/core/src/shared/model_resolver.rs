use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("configured model not found at {0}")]
    MissingExplicit(PathBuf),
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Resolve the speech model file, downloading it on first use.
///
/// Resolution order:
/// 1. Explicit path (from configuration); must exist
/// 2. User cache directory (platform-specific)
/// 3. Download from URL to cache
pub fn resolve(
    name: &str,
    url: &str,
    explicit: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(ModelResolveError::MissingExplicit(path.to_path_buf()));
    }

    let cache_dir = model_cache_dir()?;
    resolve_in(&cache_dir, name, url, progress)
}

fn resolve_in(
    cache_dir: &Path,
    name: &str,
    url: &str,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cached_path = cache_dir.join(name);
    if cached_path.exists() {
        return Ok(cached_path);
    }

    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading {name} to {}", cache_dir.display());
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/Recital/models/`
/// - Linux: `$XDG_CACHE_HOME/Recital/models/` or `~/.cache/Recital/models/`
/// - Windows: `%LOCALAPPDATA%/Recital/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("Recital").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("Recital").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    store(response, total, dest, progress)
}

/// Streams `body` into `<dest>.part` and renames it over `dest`. The
/// `.part` file is removed on any error.
fn store(
    body: impl Read,
    total: u64,
    dest: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");
    let result = store_inner(body, total, dest, &temp_path, progress);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn store_inner(
    mut body: impl Read,
    total: u64,
    dest: &Path,
    temp_path: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), ModelResolveError> {
    let write_err = |source: std::io::Error| ModelResolveError::Write {
        path: temp_path.to_path_buf(),
        source,
    };
    let mut file = fs::File::create(temp_path).map_err(write_err)?;

    let mut downloaded: u64 = 0;
    let mut buf = vec![0u8; 1024 * 1024];
    loop {
        let n = body.read(&mut buf).map_err(write_err)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err)?;
        downloaded += n as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(write_err)?;
    drop(file);

    fs::rename(temp_path, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Yields `good` bytes, then fails like a dropped connection.
    struct BrokenBody {
        good: Cursor<Vec<u8>>,
    }

    impl Read for BrokenBody {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.good.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn test_resolve_returns_existing_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let model_path = tmp.path().join("ggml-test.bin");
        fs::write(&model_path, b"fake model data").unwrap();

        let resolved = resolve("ignored.bin", "http://invalid.example.com", Some(&model_path), None)
            .unwrap();
        assert_eq!(resolved, model_path);
    }

    #[test]
    fn test_resolve_missing_explicit_path_is_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.bin");
        let err = resolve("ignored.bin", "http://invalid.example.com", Some(&missing), None)
            .unwrap_err();
        assert!(matches!(err, ModelResolveError::MissingExplicit(p) if p == missing));
    }

    #[test]
    fn test_resolve_in_finds_cached_file_without_download() {
        let tmp = TempDir::new().unwrap();
        let cached = tmp.path().join("ggml-test.bin");
        fs::write(&cached, b"cached").unwrap();

        let resolved = resolve_in(
            tmp.path(),
            "ggml-test.bin",
            "http://invalid.nonexistent.example.com/model",
            None,
        )
        .unwrap();
        assert_eq!(resolved, cached);
    }

    #[test]
    fn test_model_cache_dir_returns_path() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains("Recital"));
        assert!(path.to_string_lossy().contains("models"));
    }

    #[test]
    fn test_download_invalid_url_returns_error() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.bin");
        let result = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_download_atomic_no_partial_on_failure() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.bin");
        let _ = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }

    #[test]
    fn test_store_streams_body_and_reports_progress() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.bin");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        store(
            Cursor::new(b"ggml weights".to_vec()),
            12,
            &dest,
            Some(Box::new(move |done, total| sink.lock().unwrap().push((done, total)))),
        )
        .unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"ggml weights");
        assert!(!dest.with_extension("part").exists());
        assert_eq!(seen.lock().unwrap().last(), Some(&(12, 12)));
    }

    #[test]
    fn test_store_interrupted_body_removes_part_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.bin");
        let body = BrokenBody {
            good: Cursor::new(vec![7u8; 4096]),
        };

        let err = store(body, 1 << 20, &dest, None).unwrap_err();

        assert!(matches!(err, ModelResolveError::Write { .. }));
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
