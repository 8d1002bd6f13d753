use std::path::PathBuf;

use stash_index::IndexError;
use stash_store::StoreError;
use stash_types::ContentId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StashError {
    /// The persisted index exists but cannot be parsed. Fatal at open.
    #[error("corrupt index at {}: {reason}", path.display())]
    CorruptIndex { path: PathBuf, reason: String },

    /// No entry with this identifier has been stored.
    #[error("entry not found: {0}")]
    EntryNotFound(ContentId),

    /// The index lists the entry but its blob is missing.
    #[error("blob missing for indexed entry {0}")]
    BlobNotFound(ContentId),

    /// Directory or file I/O failed.
    #[error("storage I/O error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("index serialization error: {0}")]
    IndexSerialization(String),

    #[error("codec error: {0}")]
    Codec(#[from] stash_codec::CodecError),

    #[error("stored payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("invalid identifier: {0}")]
    InvalidId(#[from] stash_types::TypeError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("filter error: {0}")]
    Filter(#[from] stash_filter::FilterError),

    #[error("store state lock poisoned")]
    LockPoisoned,
}

impl From<IndexError> for StashError {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::Corrupt { path, reason } => Self::CorruptIndex { path, reason },
            IndexError::Serialization(reason) => Self::IndexSerialization(reason),
            IndexError::Io(e) => Self::Storage(e),
        }
    }
}

impl From<StoreError> for StashError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::BlobNotFound(id),
            StoreError::Io(e) => Self::Storage(e),
        }
    }
}

pub type StashResult<T> = Result<T, StashError>;
