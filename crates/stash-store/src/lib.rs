//! Content-addressed blob storage for Stash.
//!
//! Each stored payload becomes one immutable blob holding its compressed
//! bytes, addressed by the payload's [`ContentId`]. The store never
//! interprets blob contents; it is a pure key-value store.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`FsBlobStore`] -- one file per blob, `<root>/<hex id>.<extension>`
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Blobs are immutable once written (content-addressing guarantees this).
//! 2. A blob file is either absent or complete; writes land via rename.
//! 3. A missing blob is reported as [`StoreError::NotFound`], never as empty bytes.
//! 4. All I/O errors are propagated, never silently ignored.
//!
//! [`ContentId`]: stash_types::ContentId

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use traits::BlobStore;
