//! Deduplicating content-addressed store.
//!
//! [`Stash`] is the main entry point: it owns the authoritative index, the
//! membership filter rebuilt from it, and the blob store, and exposes
//! [`Stash::put`], [`Stash::get`], and [`Stash::list`] on top of them.
//!
//! ```no_run
//! use stash_sdk::{PutStatus, Stash};
//!
//! let stash = Stash::open_at("stash")?;
//! let outcome = stash.put("hello world")?;
//! assert_eq!(outcome.status, PutStatus::Stored);
//! assert_eq!(stash.get(&outcome.id)?, "hello world");
//! # Ok::<(), stash_sdk::StashError>(())
//! ```

pub mod config;
pub mod error;
pub mod outcome;
pub mod stash;

pub use config::StashConfig;
pub use error::{StashError, StashResult};
pub use outcome::{PutOutcome, PutStatus, StashStats};
pub use stash::Stash;

// Re-export key types
pub use stash_codec::{Codec, ZstdCodec};
pub use stash_crypto::{Digester, Sha256Digester};
pub use stash_filter::FilterConfig;
pub use stash_index::EntryMeta;
pub use stash_store::{BlobStore, FsBlobStore, InMemoryBlobStore};
pub use stash_types::ContentId;
