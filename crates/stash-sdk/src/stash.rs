use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use stash_codec::{Codec, ZstdCodec};
use stash_crypto::{Digester, Sha256Digester};
use stash_filter::BloomFilter;
use stash_index::{EntryMeta, Index};
use stash_store::{BlobStore, FsBlobStore, StoreError};
use stash_types::ContentId;
use tracing::{debug, error, info};

use crate::config::StashConfig;
use crate::error::{StashError, StashResult};
use crate::outcome::{PutOutcome, StashStats};

/// Index and filter, always mutated together under one lock.
struct State {
    index: Index,
    filter: BloomFilter,
}

/// Deduplicating content-addressed store.
///
/// Owns the authoritative [`Index`], the [`BloomFilter`] derived from it, and
/// the blob store. `put` holds the state write lock for its whole protocol, so
/// two writers never race on the same identifier; `get` and `list` take the
/// read lock and see a consistent snapshot of the index.
pub struct Stash {
    config: StashConfig,
    state: RwLock<State>,
    blobs: Arc<dyn BlobStore>,
    codec: Box<dyn Codec>,
    digester: Box<dyn Digester>,
}

impl Stash {
    /// Open (or create) a store rooted at `root` with default settings.
    pub fn open_at(root: impl Into<PathBuf>) -> StashResult<Self> {
        Self::open(StashConfig::with_root(root))
    }

    /// Open (or create) the filesystem-backed store described by `config`.
    ///
    /// Fails with [`StashError::CorruptIndex`] if an index document exists but
    /// cannot be parsed.
    pub fn open(config: StashConfig) -> StashResult<Self> {
        config.validate()?;
        let codec = ZstdCodec::new(config.compression_level)?;
        let blobs = FsBlobStore::open(&config.root, codec.extension())?
            .with_sync(config.sync_writes);
        Self::with_parts(
            config,
            Arc::new(blobs),
            Box::new(codec),
            Box::new(Sha256Digester::new()),
        )
    }

    /// Assemble a store from explicit collaborators.
    ///
    /// The index is still loaded from `config.index_path()`, and the
    /// membership filter is rebuilt from its keys.
    pub fn with_parts(
        config: StashConfig,
        blobs: Arc<dyn BlobStore>,
        codec: Box<dyn Codec>,
        digester: Box<dyn Digester>,
    ) -> StashResult<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.root)?;

        let index = Index::load(config.index_path())?.with_sync(config.sync_writes);
        let filter = BloomFilter::from_ids(&config.filter, index.ids())?;

        info!(
            root = %config.root.display(),
            entries = index.len(),
            digest = digester.algorithm(),
            "stash opened"
        );

        Ok(Self {
            config,
            state: RwLock::new(State { index, filter }),
            blobs,
            codec,
            digester,
        })
    }

    /// Store a text payload unless identical content is already stored.
    pub fn put(&self, payload: &str) -> StashResult<PutOutcome> {
        self.put_bytes(payload.as_bytes())
    }

    /// Store a byte payload unless identical content is already stored.
    ///
    /// The blob is written before the index is persisted: a failure in
    /// between leaves an orphan blob that a retried `put` overwrites, never an
    /// index entry without a blob. The filter learns the identifier only after
    /// the index commit succeeded.
    pub fn put_bytes(&self, data: &[u8]) -> StashResult<PutOutcome> {
        let id = self.digester.digest(data);
        let mut state = self.write_state()?;

        if state.filter.might_contain(&id) {
            if state.index.contains(&id) {
                debug!(id = %id, "duplicate payload");
                return Ok(PutOutcome::duplicate(id));
            }
            debug!(id = %id, "membership filter false positive");
        }

        let compressed = self.codec.compress(data)?;
        self.blobs.write(&id, &compressed)?;
        state
            .index
            .commit(id, EntryMeta::new(compressed.len() as u64))?;
        state.filter.add(&id);

        info!(
            id = %id,
            raw = data.len(),
            compressed = compressed.len(),
            "entry stored"
        );
        Ok(PutOutcome::stored(id))
    }

    /// Retrieve a stored text payload.
    pub fn get(&self, id: &ContentId) -> StashResult<String> {
        Ok(String::from_utf8(self.get_bytes(id)?)?)
    }

    /// Retrieve a stored text payload by hex identifier.
    pub fn get_hex(&self, hex_id: &str) -> StashResult<String> {
        self.get(&ContentId::from_hex(hex_id)?)
    }

    /// Retrieve the raw bytes of a stored payload.
    pub fn get_bytes(&self, id: &ContentId) -> StashResult<Vec<u8>> {
        let state = self.read_state()?;
        if !state.index.contains(id) {
            return Err(StashError::EntryNotFound(*id));
        }

        let compressed = match self.blobs.read(id) {
            Ok(bytes) => bytes,
            Err(StoreError::NotFound(_)) => {
                error!(id = %id, "index entry has no backing blob");
                return Err(StashError::BlobNotFound(*id));
            }
            Err(e) => return Err(e.into()),
        };
        drop(state);

        Ok(self.codec.decompress(&compressed)?)
    }

    /// All stored identifiers, in ascending order. Read from the index, never
    /// from the filter.
    pub fn list(&self) -> StashResult<Vec<ContentId>> {
        Ok(self.read_state()?.index.ids().copied().collect())
    }

    /// Authoritative existence check.
    pub fn contains(&self, id: &ContentId) -> StashResult<bool> {
        Ok(self.read_state()?.index.contains(id))
    }

    /// The filter's answer for `id`. `false` is definitive, `true` is not.
    pub fn might_contain(&self, id: &ContentId) -> StashResult<bool> {
        Ok(self.read_state()?.filter.might_contain(id))
    }

    /// Index metadata for an entry.
    pub fn entry(&self, id: &ContentId) -> StashResult<Option<EntryMeta>> {
        Ok(self.read_state()?.index.get(id).cloned())
    }

    /// Number of stored entries.
    pub fn len(&self) -> StashResult<usize> {
        Ok(self.read_state()?.index.len())
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> StashResult<bool> {
        Ok(self.read_state()?.index.is_empty())
    }

    /// Counters for the index and filter.
    pub fn stats(&self) -> StashResult<StashStats> {
        let state = self.read_state()?;
        Ok(StashStats {
            entries: state.index.len(),
            compressed_bytes: state.index.total_compressed_bytes(),
            filter_bits: state.filter.num_bits(),
            filter_hashes: state.filter.num_hashes(),
            filter_fill_ratio: state.filter.fill_ratio(),
        })
    }

    /// Compute the identifier a payload would be stored under.
    pub fn identify(&self, data: &[u8]) -> ContentId {
        self.digester.digest(data)
    }

    /// The storage root.
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// The configuration this store was opened with.
    pub fn config(&self) -> &StashConfig {
        &self.config
    }

    fn read_state(&self) -> StashResult<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| StashError::LockPoisoned)
    }

    fn write_state(&self) -> StashResult<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| StashError::LockPoisoned)
    }
}

impl std::fmt::Debug for Stash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut d = f.debug_struct("Stash");
        d.field("root", &self.config.root);
        if let Ok(state) = self.state.read() {
            d.field("entries", &state.index.len());
        }
        d.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stash_filter::FilterConfig;
    use stash_store::{InMemoryBlobStore, StoreResult};

    /// Blob store whose writes always fail, to exercise the put ordering.
    struct FailingBlobStore;

    impl BlobStore for FailingBlobStore {
        fn write(&self, _id: &ContentId, _data: &[u8]) -> StoreResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into())
        }

        fn read(&self, id: &ContentId) -> StoreResult<Vec<u8>> {
            Err(StoreError::NotFound(*id))
        }
    }

    fn config_in(dir: &tempfile::TempDir) -> StashConfig {
        StashConfig {
            filter: FilterConfig::new(1_000, 0.01),
            sync_writes: false,
            ..StashConfig::with_root(dir.path())
        }
    }

    fn in_memory(dir: &tempfile::TempDir) -> (Stash, Arc<InMemoryBlobStore>) {
        let blobs = Arc::new(InMemoryBlobStore::new());
        let stash = Stash::with_parts(
            config_in(dir),
            blobs.clone(),
            Box::new(ZstdCodec::default()),
            Box::new(Sha256Digester),
        )
        .unwrap();
        (stash, blobs)
    }

    #[test]
    fn put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let (stash, blobs) = in_memory(&dir);
        let outcome = stash.put("some text").unwrap();
        assert!(outcome.is_stored());
        assert_eq!(stash.get(&outcome.id).unwrap(), "some text");
        assert_eq!(blobs.len(), 1);
    }

    #[test]
    fn second_put_is_duplicate_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (stash, blobs) = in_memory(&dir);
        let first = stash.put("same").unwrap();
        let meta = stash.entry(&first.id).unwrap().unwrap();

        let second = stash.put("same").unwrap();
        assert!(second.is_duplicate());
        assert_eq!(first.id, second.id);
        assert_eq!(blobs.len(), 1);
        assert_eq!(stash.entry(&first.id).unwrap().unwrap(), meta);
    }

    #[test]
    fn entry_records_compressed_size() {
        let dir = tempfile::tempdir().unwrap();
        let (stash, blobs) = in_memory(&dir);
        let outcome = stash.put(&"abc".repeat(1_000)).unwrap();
        let meta = stash.entry(&outcome.id).unwrap().unwrap();
        assert_eq!(meta.compressed_size, blobs.total_bytes());
        assert!(meta.compressed_size < 3_000);
    }

    #[test]
    fn failed_blob_write_leaves_index_and_filter_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let stash = Stash::with_parts(
            config_in(&dir),
            Arc::new(FailingBlobStore),
            Box::new(ZstdCodec::default()),
            Box::new(Sha256Digester),
        )
        .unwrap();

        let err = stash.put("doomed").unwrap_err();
        assert!(matches!(err, StashError::Storage(_)));

        let id = stash.identify(b"doomed");
        assert!(!stash.contains(&id).unwrap());
        assert!(!stash.might_contain(&id).unwrap());
        assert!(stash.list().unwrap().is_empty());
        assert!(!dir.path().join("index.json").exists());
    }

    #[test]
    fn failed_index_save_leaves_orphan_blob_only() {
        let dir = tempfile::tempdir().unwrap();
        let (stash, blobs) = in_memory(&dir);
        // Occupy the index path with a directory so the rename fails.
        std::fs::create_dir(dir.path().join("index.json")).unwrap();

        assert!(stash.put("orphaned").is_err());
        let id = stash.identify(b"orphaned");
        assert_eq!(blobs.all_ids(), vec![id]);
        assert!(!stash.contains(&id).unwrap());
        assert!(!stash.might_contain(&id).unwrap());

        // Once the obstruction is gone, a retry stores the entry normally.
        std::fs::remove_dir(dir.path().join("index.json")).unwrap();
        assert!(stash.put("orphaned").unwrap().is_stored());
        assert_eq!(stash.get(&id).unwrap(), "orphaned");
    }

    #[test]
    fn get_unknown_is_entry_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (stash, _) = in_memory(&dir);
        let err = stash.get(&ContentId::null()).unwrap_err();
        assert!(matches!(err, StashError::EntryNotFound(id) if id.is_null()));
    }

    #[test]
    fn lost_blob_is_blob_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (stash, blobs) = in_memory(&dir);
        let id = stash.put("fragile").unwrap().id;
        blobs.remove(&id);

        let err = stash.get(&id).unwrap_err();
        assert!(matches!(err, StashError::BlobNotFound(missing) if missing == id));
        // The index still lists it; the inconsistency is surfaced, not hidden.
        assert_eq!(stash.list().unwrap(), vec![id]);
    }

    #[test]
    fn filter_false_positive_still_stores() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = Arc::new(InMemoryBlobStore::new());
        // 64 bits shared by every key: saturates after a handful of puts.
        let config = StashConfig {
            filter: FilterConfig::new(1, 0.5),
            ..config_in(&dir)
        };
        let stash = Stash::with_parts(
            config,
            blobs.clone(),
            Box::new(ZstdCodec::default()),
            Box::new(Sha256Digester),
        )
        .unwrap();

        for n in 0..32 {
            stash.put(&format!("seed {n}")).unwrap();
        }

        let candidate = (0..1_000)
            .map(|n| format!("candidate {n}"))
            .find(|p| stash.might_contain(&stash.identify(p.as_bytes())).unwrap())
            .expect("a saturated filter reports false positives");

        let outcome = stash.put(&candidate).unwrap();
        assert!(outcome.is_stored());
        assert_eq!(stash.get(&outcome.id).unwrap(), candidate);
        assert_eq!(blobs.len(), 33);
    }

    #[test]
    fn get_hex_parses_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let (stash, _) = in_memory(&dir);
        let id = stash.put("by hex").unwrap().id;
        assert_eq!(stash.get_hex(&id.to_hex()).unwrap(), "by hex");
        assert!(matches!(
            stash.get_hex("xyz"),
            Err(StashError::InvalidId(_))
        ));
    }

    #[test]
    fn non_utf8_payload_needs_get_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let (stash, _) = in_memory(&dir);
        let id = stash.put_bytes(&[0xff, 0xfe, 0x00]).unwrap().id;
        assert_eq!(stash.get_bytes(&id).unwrap(), vec![0xff, 0xfe, 0x00]);
        assert!(matches!(stash.get(&id), Err(StashError::InvalidUtf8(_))));
    }

    #[test]
    fn stats_track_entries() {
        let dir = tempfile::tempdir().unwrap();
        let (stash, blobs) = in_memory(&dir);
        assert!(stash.is_empty().unwrap());
        stash.put("one").unwrap();
        stash.put("two").unwrap();
        stash.put("one").unwrap();

        let stats = stash.stats().unwrap();
        assert_eq!(stats.entries, 2);
        assert_eq!(stash.len().unwrap(), 2);
        assert_eq!(stats.compressed_bytes, blobs.total_bytes());
        assert_eq!(stats.filter_bits, 9586);
        assert!(stats.filter_fill_ratio > 0.0);
    }

    #[test]
    fn invalid_config_is_rejected_at_open() {
        let dir = tempfile::tempdir().unwrap();
        let config = StashConfig {
            compression_level: 0,
            ..config_in(&dir)
        };
        assert!(matches!(Stash::open(config), Err(StashError::Config(_))));
    }

    #[test]
    fn stash_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Stash>();
    }

    #[test]
    fn concurrent_puts_of_same_payload_store_once() {
        use std::thread;

        let dir = tempfile::tempdir().unwrap();
        let (stash, blobs) = in_memory(&dir);
        let stash = Arc::new(stash);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stash = Arc::clone(&stash);
                thread::spawn(move || stash.put("contended").unwrap())
            })
            .collect();
        let outcomes: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread should not panic"))
            .collect();

        assert_eq!(outcomes.iter().filter(|o| o.is_stored()).count(), 1);
        assert_eq!(outcomes.iter().filter(|o| o.is_duplicate()).count(), 7);
        assert_eq!(blobs.len(), 1);
    }

    #[test]
    fn debug_format() {
        let dir = tempfile::tempdir().unwrap();
        let (stash, _) = in_memory(&dir);
        let debug = format!("{stash:?}");
        assert!(debug.contains("Stash"));
        assert!(debug.contains("entries"));
    }
}
