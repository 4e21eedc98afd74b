//! Snapshot: save/load full index state to/from disk.
//!
//! Saves go to `<snapshot>.tmp`, are fsynced, then renamed over the target
//! so a reader only ever sees a complete file. The rename is the commit
//! point: once it succeeds the save is reported as done, even if the
//! directory fsync that follows fails.

use crate::error::{LoadError, Result, VectorStoreError};
use crate::persistence::serialization::{self, IndexSnapshot, SnapshotManifest};
use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Manages saving and loading the snapshot file at a fixed path.
#[derive(Clone)]
pub struct SnapshotManager {
    path: PathBuf,
    sync_dir: fn(&Path) -> io::Result<()>,
}

impl fmt::Debug for SnapshotManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotManager")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SnapshotManager {
    /// Create a snapshot manager for the given snapshot file path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sync_dir: sync_parent,
        }
    }

    /// Replace the directory fsync step, so tests can make it fail.
    #[cfg(test)]
    pub(crate) fn with_dir_sync(mut self, sync_dir: fn(&Path) -> io::Result<()>) -> Self {
        self.sync_dir = sync_dir;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("index.snapshot"));
        name.push(suffix);
        self.path.with_file_name(name)
    }

    /// Path of the in-progress file used while saving.
    pub fn temp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    /// Path of the human-readable manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.sibling(".manifest.json")
    }

    /// Durably replace the snapshot on disk.
    ///
    /// An error means the previous snapshot (if any) is still the one on disk.
    pub fn save(&self, snapshot: &IndexSnapshot) -> Result<SnapshotManifest> {
        let (bytes, manifest) = serialization::encode_snapshot(snapshot)?;
        let tmp_path = self.temp_path();

        let committed = self
            .write_temp(&tmp_path, &bytes)
            .and_then(|()| fs::rename(&tmp_path, &self.path));
        if let Err(source) = committed {
            let _ = fs::remove_file(&tmp_path);
            return Err(VectorStoreError::PersistError {
                path: self.path.clone(),
                source,
            });
        }

        // Past the rename a restart already sees the new snapshot, so this must not fail the save.
        if let Err(e) = (self.sync_dir)(&self.path) {
            tracing::warn!(path = ?self.path, error = %e, "snapshot committed but directory fsync failed");
        }

        // The snapshot is already durable here; a missing manifest is cosmetic.
        if let Err(e) = self.write_manifest(&manifest) {
            tracing::warn!(path = ?self.manifest_path(), error = %e, "failed to write snapshot manifest");
        }

        tracing::debug!(
            path = ?self.path,
            vectors = manifest.vector_count,
            bytes = bytes.len(),
            "snapshot saved"
        );
        Ok(manifest)
    }

    fn write_temp(&self, tmp_path: &Path, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = File::create(tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()
    }

    fn write_manifest(&self, manifest: &SnapshotManifest) -> Result<()> {
        let bytes = serialization::to_json(manifest)?;
        let final_path = self.manifest_path();
        let tmp_path = self.sibling(".manifest.json.tmp");
        fs::write(&tmp_path, &bytes)?;
        fs::rename(&tmp_path, &final_path)?;
        Ok(())
    }

    /// Load the snapshot, or return `None` if no snapshot file exists.
    pub fn load(&self) -> std::result::Result<Option<IndexSnapshot>, LoadError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(LoadError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let snapshot = serialization::decode_snapshot(&bytes)
            .map_err(|reason| LoadError::corrupt(&self.path, reason))?;
        Ok(Some(snapshot))
    }

    /// Remove an in-progress file left behind by a crash mid-save.
    ///
    /// Returns whether a stale file was found and removed.
    pub fn clean_stale_temp(&self) -> io::Result<bool> {
        let tmp_path = self.temp_path();
        match fs::remove_file(&tmp_path) {
            Ok(()) => {
                tracing::warn!(path = ?tmp_path, "removed stale snapshot temp file");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn sync_parent(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        if let Some(parent) = path.parent() {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            File::open(parent)?.sync_all()?;
        }
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> IndexSnapshot {
        IndexSnapshot {
            dimension: 3,
            count: 2,
            vectors: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            records: vec![(0, "v1".to_string()), (1, "v2".to_string())],
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let mgr = SnapshotManager::new(dir.path().join("db").join("index.snapshot"));

        let manifest = mgr.save(&sample()).unwrap();
        assert!(mgr.path().exists());
        assert!(!mgr.temp_path().exists());
        assert_eq!(manifest.vector_count, 2);

        let loaded = mgr.load().unwrap().unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_manifest_written() {
        let dir = TempDir::new().unwrap();
        let mgr = SnapshotManager::new(dir.path().join("index.snapshot"));
        mgr.save(&sample()).unwrap();

        let raw = fs::read(mgr.manifest_path()).unwrap();
        let manifest: SnapshotManifest = serde_json::from_slice(&raw).unwrap();
        assert_eq!(manifest.dimension, 3);
        assert_eq!(manifest.vector_count, 2);
    }

    #[test]
    fn test_load_nonexistent() {
        let dir = TempDir::new().unwrap();
        let mgr = SnapshotManager::new(dir.path().join("empty").join("index.snapshot"));
        assert!(!mgr.path().exists());
        assert!(mgr.load().unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.snapshot");
        fs::write(&path, b"definitely not a snapshot").unwrap();

        let mgr = SnapshotManager::new(&path);
        assert!(matches!(mgr.load(), Err(LoadError::Corrupt { .. })));
    }

    #[test]
    fn test_failed_save_keeps_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let mgr = SnapshotManager::new(dir.path().join("index.snapshot"));
        mgr.save(&sample()).unwrap();

        // A directory squatting on the temp path makes the next write fail.
        fs::create_dir(mgr.temp_path()).unwrap();
        let mut bigger = sample();
        bigger.count = 3;
        bigger.vectors.extend_from_slice(&[7.0, 8.0, 9.0]);
        bigger.records.push((2, "v3".to_string()));

        let result = mgr.save(&bigger);
        assert!(matches!(result, Err(VectorStoreError::PersistError { .. })));
        assert_eq!(mgr.load().unwrap().unwrap(), sample());
    }

    #[test]
    fn test_dir_sync_failure_after_rename_still_commits() {
        let dir = TempDir::new().unwrap();
        let mgr = SnapshotManager::new(dir.path().join("index.snapshot"))
            .with_dir_sync(|_| Err(io::Error::new(io::ErrorKind::Other, "fsync refused")));

        let manifest = mgr.save(&sample()).unwrap();
        assert_eq!(manifest.vector_count, 2);
        assert!(!mgr.temp_path().exists());
        assert_eq!(mgr.load().unwrap().unwrap(), sample());
    }

    #[test]
    fn test_clean_stale_temp() {
        let dir = TempDir::new().unwrap();
        let mgr = SnapshotManager::new(dir.path().join("index.snapshot"));
        assert!(!mgr.clean_stale_temp().unwrap());

        fs::write(mgr.temp_path(), b"half written").unwrap();
        assert!(mgr.clean_stale_temp().unwrap());
        assert!(!mgr.temp_path().exists());
    }
}
