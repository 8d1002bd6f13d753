//! Error types for the index crate.

use std::path::PathBuf;

/// Errors that can occur while loading or saving the index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The index document exists but cannot be parsed.
    #[error("corrupt index at {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// The in-memory index could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Reading, writing, or renaming the index file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
