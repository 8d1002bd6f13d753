use std::io::{self, Write};
use std::path::{Path, PathBuf};

use stash_types::ContentId;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::BlobStore;

/// Filesystem blob store: one file per blob directly under `root`.
///
/// Blob files are named `<hex id>.<extension>`. Writes go to a temporary
/// file in `root` that is renamed into place, so a crash mid-write leaves at
/// most a stray temp file and never a truncated blob.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
    extension: String,
    sync: bool,
}

impl FsBlobStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>, extension: impl Into<String>) -> StoreResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            extension: extension.into(),
            sync: true,
        })
    }

    /// Enable or disable fsync before a blob is renamed into place.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// The storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the blob for `id`, whether or not it exists.
    pub fn blob_path(&self, id: &ContentId) -> PathBuf {
        self.root.join(format!("{}.{}", id.to_hex(), self.extension))
    }
}

impl BlobStore for FsBlobStore {
    fn write(&self, id: &ContentId, data: &[u8]) -> StoreResult<()> {
        let path = self.blob_path(id);
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(data)?;
        tmp.flush()?;
        if self.sync {
            tmp.as_file().sync_all()?;
        }
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        if self.sync {
            sync_dir(&self.root)?;
        }
        debug!(id = %id, bytes = data.len(), "blob written");
        Ok(())
    }

    fn read(&self, id: &ContentId) -> StoreResult<Vec<u8>> {
        match std::fs::read(self.blob_path(id)) {
            Ok(data) => {
                debug!(id = %id, bytes = data.len(), "blob read");
                Ok(data)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound(*id)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(byte: u8) -> ContentId {
        ContentId::from_digest([byte; 32])
    }

    fn open(dir: &tempfile::TempDir) -> FsBlobStore {
        FsBlobStore::open(dir.path(), "zst").unwrap()
    }

    #[test]
    fn open_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("root");
        let store = FsBlobStore::open(&root, "zst").unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root.as_path());
    }

    #[test]
    fn blob_path_uses_hex_and_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        let path = store.blob_path(&id(0xab));
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            format!("{}.zst", "ab".repeat(32))
        );
        assert_eq!(path.parent().unwrap(), dir.path());
    }

    #[test]
    fn write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        store.write(&id(1), b"compressed bytes").unwrap();
        assert_eq!(store.read(&id(1)).unwrap(), b"compressed bytes");
        assert!(store.blob_path(&id(1)).is_file());
    }

    #[test]
    fn read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        let err = store.read(&id(2)).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(missing) if missing == id(2)));
        assert!(!store.blob_path(&id(2)).exists());
    }

    #[test]
    fn rewrite_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir).with_sync(false);
        store.write(&id(3), b"first").unwrap();
        store.write(&id(3), b"first").unwrap();
        assert_eq!(store.read(&id(3)).unwrap(), b"first");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn synced_write_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir).with_sync(true);
        store.write(&id(6), b"durable").unwrap();
        assert_eq!(store.read(&id(6)).unwrap(), b"durable");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn empty_blob_is_distinct_from_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        store.write(&id(4), b"").unwrap();
        assert!(store.read(&id(4)).unwrap().is_empty());
    }

    #[test]
    fn write_into_vanished_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        let store = FsBlobStore::open(&root, "zst").unwrap();
        std::fs::remove_dir(&root).unwrap();
        let err = store.write(&id(5), b"data").unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
