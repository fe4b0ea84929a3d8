//! Durable storage for the progress document.
//!
//! The whole document lives in one JSON file. Every write goes to a temporary
//! sibling first and is renamed over the primary path, so the primary file is
//! always either the previous version or the new one.

use super::migrate::normalize;
use crate::core::{Document, Result, TrackerError};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

pub const DEFAULT_FILENAME: &str = "progress.json";

/// File names looked up, in order, when the data path is a directory.
pub const CANDIDATE_FILENAMES: [&str; 2] = [DEFAULT_FILENAME, "tracker.json"];

/// Resolve the data file for `path`.
///
/// A directory is searched for one of [`CANDIDATE_FILENAMES`]; when none
/// exists yet the default file name inside it is used. A path ending in a
/// separator names a directory even before it exists. Anything else is taken
/// as the file path itself.
pub fn resolve_data_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    let names_directory =
        path.is_dir() || path.as_os_str().to_string_lossy().ends_with(std::path::is_separator);
    if !names_directory {
        return path.to_path_buf();
    }

    CANDIDATE_FILENAMES
        .iter()
        .map(|name| path.join(name))
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| path.join(DEFAULT_FILENAME))
}

// ============================================================================
// Staged Write
// ============================================================================

/// A fully written and synced temporary file that has not yet replaced the
/// primary file. Dropping it without committing removes the temporary file.
struct StagedWrite {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedWrite {
    fn create(target: &Path, document: &Document) -> Result<Self> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| {
            TrackerError::IoError(format!("Failed to create data directory '{}': {}", dir.display(), e))
        })?;

        let file_name = target
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
        let mut temp = tempfile::Builder::new()
            .prefix(&format!(".{file_name}."))
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(|e| TrackerError::IoError(format!("Failed to create temp file: {}", e)))?;

        let serialized = serde_json::to_vec_pretty(document)?;
        temp.write_all(&serialized)
            .map_err(|e| TrackerError::IoError(format!("Failed to write temp file: {}", e)))?;
        temp.flush()
            .map_err(|e| TrackerError::IoError(format!("Failed to flush temp file: {}", e)))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| TrackerError::IoError(format!("Failed to sync temp file: {}", e)))?;

        Ok(Self {
            temp,
            target: target.to_path_buf(),
        })
    }

    fn commit(self) -> Result<()> {
        self.temp.persist(&self.target).map_err(|e| {
            TrackerError::IoError(format!(
                "Failed to replace '{}': {}",
                self.target.display(),
                e.error
            ))
        })?;
        Ok(())
    }
}

// ============================================================================
// Document Store
// ============================================================================

/// Single-file store for the [`Document`].
///
/// All reads and writes in the process go through one lock owned by the store.
/// Nothing is coordinated across processes.
#[derive(Debug)]
pub struct DocumentStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl DocumentStore {
    /// Open the store at `path`, writing a default document if no file exists
    /// yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let store = Self {
            path: resolve_data_path(path),
            lock: Mutex::new(()),
        };

        if !store.path.exists() {
            store.save(&Document::default())?;
            info!(path = %store.path.display(), "initialized new data file");
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and normalize the current document.
    ///
    /// A missing file yields the default document; so does a file that is not
    /// valid JSON.
    pub fn load(&self) -> Result<Document> {
        let _guard = self.lock.lock()?;
        self.read_unlocked()
    }

    /// Replace the stored document.
    pub fn save(&self, document: &Document) -> Result<()> {
        let _guard = self.lock.lock()?;
        self.write_unlocked(document)
    }

    /// Run one read-modify-write cycle while holding the lock, so no other
    /// caller in the process can interleave between the read and the write.
    pub fn update<R>(&self, apply: impl FnOnce(&mut Document) -> R) -> Result<R> {
        let _guard = self.lock.lock()?;
        let mut document = self.read_unlocked()?;
        let outcome = apply(&mut document);
        self.write_unlocked(&document)?;
        Ok(outcome)
    }

    fn read_unlocked(&self) -> Result<Document> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "data file missing, using defaults");
                return Ok(Document::default());
            }
            Err(e) => {
                return Err(TrackerError::IoError(format!(
                    "Failed to read '{}': {}",
                    self.path.display(),
                    e
                )));
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(raw) => Ok(normalize(raw)),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "data file is not valid JSON, falling back to an empty document"
                );
                Ok(Document::default())
            }
        }
    }

    fn write_unlocked(&self, document: &Document) -> Result<()> {
        StagedWrite::create(&self.path, document)?.commit()?;
        debug!(
            path = %self.path.display(),
            events = document.events.len(),
            "saved document"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Event, Position};
    use tempfile::TempDir;

    fn sample_document() -> Document {
        let mut doc = Document::default();
        doc.total = 12;
        doc.daily_goal = 4;
        doc.events = vec![Event::legacy(1_000), Event::at(2_000, Position::new(1, 1))];
        doc.daily_progress
            .insert(chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(), 2);
        doc
    }

    fn leftover_temp_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "tmp"))
            .collect()
    }

    #[test]
    fn test_open_writes_default_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("progress.json");
        let store = DocumentStore::open(&path).unwrap();

        assert!(path.exists());
        assert_eq!(store.load().unwrap(), Document::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::open(temp_dir.path().join("data.json")).unwrap();

        store.save(&sample_document()).unwrap();
        assert_eq!(store.load().unwrap(), sample_document());
        assert!(leftover_temp_files(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_missing_file_loads_defaults_without_writing() {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::open(temp_dir.path().join("data.json")).unwrap();
        fs::remove_file(store.path()).unwrap();

        assert_eq!(store.load().unwrap(), Document::default());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_corrupt_file_falls_back_to_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("progress.json");
        fs::write(&path, b"{\"total\": 5, \"events\": [1, 2").unwrap();

        let store = DocumentStore::open(&path).unwrap();
        assert_eq!(store.load().unwrap(), Document::default());
    }

    #[test]
    fn test_uncommitted_write_leaves_primary_intact() {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::open(temp_dir.path().join("progress.json")).unwrap();
        store.save(&sample_document()).unwrap();
        let before = fs::read(store.path()).unwrap();

        let mut next = sample_document();
        next.total = 99;
        next.events.push(Event::legacy(3_000));
        let staged = StagedWrite::create(store.path(), &next).unwrap();
        let temp_path = staged.temp.path().to_path_buf();
        assert!(temp_path.exists());
        assert_eq!(temp_path.parent(), store.path().parent());

        // Crash before the rename.
        drop(staged);

        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert_eq!(store.load().unwrap(), sample_document());
        assert!(!temp_path.exists());
    }

    #[test]
    fn test_stray_temp_file_does_not_affect_primary() {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::open(temp_dir.path().join("progress.json")).unwrap();
        store.save(&sample_document()).unwrap();

        fs::write(temp_dir.path().join(".progress.json.abc123.tmp"), b"{\"total\":").unwrap();

        assert_eq!(store.load().unwrap(), sample_document());
    }

    #[test]
    fn test_update_persists_changes() {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::open(temp_dir.path().join("progress.json")).unwrap();

        let previous = store
            .update(|doc| std::mem::replace(&mut doc.total, 30))
            .unwrap();

        assert_eq!(previous, 0);
        assert_eq!(store.load().unwrap().total, 30);
    }

    #[test]
    fn test_resolve_data_path_for_directory() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(
            resolve_data_path(temp_dir.path()),
            temp_dir.path().join(DEFAULT_FILENAME)
        );

        fs::write(temp_dir.path().join("tracker.json"), b"{}").unwrap();
        assert_eq!(
            resolve_data_path(temp_dir.path()),
            temp_dir.path().join("tracker.json")
        );

        fs::write(temp_dir.path().join("progress.json"), b"{}").unwrap();
        assert_eq!(
            resolve_data_path(temp_dir.path()),
            temp_dir.path().join("progress.json")
        );
    }

    #[test]
    fn test_resolve_data_path_for_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.json");
        assert_eq!(resolve_data_path(&path), path);
    }

    #[test]
    fn test_open_directory_mount() {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.path(), temp_dir.path().join(DEFAULT_FILENAME));
        assert!(store.path().is_file());
    }

    #[test]
    fn test_open_missing_directory_with_trailing_separator() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("data");
        let store = DocumentStore::open(format!("{}/", dir.display())).unwrap();

        assert_eq!(store.path(), dir.join(DEFAULT_FILENAME));
        assert!(dir.is_dir());
        assert!(store.path().is_file());
    }
}
