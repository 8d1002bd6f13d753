//! Authoritative entry index for Stash.
//!
//! The index maps every stored [`ContentId`] to its [`EntryMeta`] and is the
//! sole source of truth for "does this entry exist". It lives in memory as a
//! `BTreeMap` and is persisted as one JSON document that is rewritten in full,
//! atomically, after every mutation.
//!
//! # Key Types
//!
//! - [`Index`] -- In-memory mapping plus its on-disk location
//! - [`EntryMeta`] -- Per-entry metadata (`storedAt`, `compressedSize`)
//! - [`IndexError`] -- Load/save failures, including a corrupt document
//!
//! [`ContentId`]: stash_types::ContentId

pub mod entry;
pub mod error;
pub mod index;

pub use entry::EntryMeta;
pub use error::{IndexError, IndexResult};
pub use index::Index;
