use stash_types::ContentId;

use crate::error::StoreResult;

/// Content-addressed blob store.
///
/// All implementations must satisfy these invariants:
/// - The same identifier always refers to the same bytes.
/// - `read` of an identifier that was never written fails with
///   [`StoreError::NotFound`](crate::StoreError::NotFound).
/// - A failed `write` leaves no partial blob visible to `read`.
/// - All I/O errors are propagated, never silently ignored.
pub trait BlobStore: Send + Sync {
    /// Store `data` under `id`. Writing an existing identifier replaces the
    /// blob, which is a no-op in effect since the bytes are identical.
    fn write(&self, id: &ContentId, data: &[u8]) -> StoreResult<()>;

    /// Read the blob stored under `id`.
    fn read(&self, id: &ContentId) -> StoreResult<Vec<u8>>;
}
