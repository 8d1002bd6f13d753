//! The authoritative index and its on-disk persistence.
//!
//! The [`Index`] keeps a `BTreeMap<ContentId, EntryMeta>` in memory and
//! mirrors it to a single JSON document. Saves go through a temporary file in
//! the same directory followed by a rename, so a reader only ever sees a
//! complete old or complete new document.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use stash_types::ContentId;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::entry::EntryMeta;
use crate::error::{IndexError, IndexResult};

/// Durable mapping from content identifier to entry metadata.
pub struct Index {
    /// Location of the persisted document.
    path: PathBuf,
    /// All known entries, keyed by identifier.
    entries: BTreeMap<ContentId, EntryMeta>,
    /// Whether `save` fsyncs the temporary file and the directory.
    sync: bool,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("path", &self.path)
            .field("entries", &self.entries.len())
            .field("sync", &self.sync)
            .finish()
    }
}

impl Index {
    /// Create an empty index that will persist to `path`. Nothing is read or
    /// written until [`Index::save`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
            sync: true,
        }
    }

    /// Load the index persisted at `path`.
    ///
    /// A missing file yields an empty index. A file that exists but does not
    /// parse as an index document yields [`IndexError::Corrupt`]; it is never
    /// silently replaced.
    pub fn load(path: impl Into<PathBuf>) -> IndexResult<Self> {
        let path = path.into();
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no index file; starting empty");
                return Ok(Self::new(path));
            }
            Err(e) => return Err(e.into()),
        };

        let Document(entries) =
            serde_json::from_slice(&data).map_err(|e| IndexError::Corrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        debug!(path = %path.display(), entries = entries.len(), "index loaded");
        Ok(Self {
            path,
            entries,
            sync: true,
        })
    }

    /// Enable or disable fsync on save.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Location of the persisted document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Authoritative existence check.
    pub fn contains(&self, id: &ContentId) -> bool {
        self.entries.contains_key(id)
    }

    /// Metadata for an entry.
    pub fn get(&self, id: &ContentId) -> Option<&EntryMeta> {
        self.entries.get(id)
    }

    /// All identifiers, in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &ContentId> {
        self.entries.keys()
    }

    /// Sum of the compressed sizes of all entries.
    pub fn total_compressed_bytes(&self) -> u64 {
        self.entries.values().map(|m| m.compressed_size).sum()
    }

    /// Insert an entry and persist the whole index.
    ///
    /// If persisting fails the in-memory insertion is undone, so memory never
    /// claims an entry the disk does not have.
    pub fn commit(&mut self, id: ContentId, meta: EntryMeta) -> IndexResult<()> {
        let previous = self.entries.insert(id, meta);
        if let Err(e) = self.save() {
            match previous {
                Some(prev) => {
                    self.entries.insert(id, prev);
                }
                None => {
                    self.entries.remove(&id);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Atomically persist the full mapping, replacing any previous version.
    pub fn save(&self) -> IndexResult<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &self.entries)
            .map_err(|e| IndexError::Serialization(e.to_string()))?;
        tmp.write_all(b"\n")?;
        tmp.flush()?;
        if self.sync {
            tmp.as_file().sync_all()?;
        }
        tmp.persist(&self.path).map_err(|e| IndexError::Io(e.error))?;
        if self.sync {
            sync_dir(dir)?;
        }

        debug!(path = %self.path.display(), entries = self.entries.len(), "index saved");
        Ok(())
    }
}

/// Flush a directory entry so a rename inside it survives power loss.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

/// On-disk form of the index. Unlike a plain map, a repeated identifier key
/// is an error rather than last-one-wins.
struct Document(BTreeMap<ContentId, EntryMeta>);

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = Document;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from content identifier to entry metadata")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Document, A::Error> {
                let mut entries = BTreeMap::new();
                while let Some((id, meta)) = map.next_entry::<ContentId, EntryMeta>()? {
                    if entries.insert(id, meta).is_some() {
                        return Err(de::Error::custom(format_args!(
                            "duplicate identifier {id}"
                        )));
                    }
                }
                Ok(Document(entries))
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}
