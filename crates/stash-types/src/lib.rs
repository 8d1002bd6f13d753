//! Foundation types for Stash.
//!
//! Every other Stash crate depends on `stash-types` for the identifier that
//! keys blobs, index entries, and filter membership.
//!
//! # Key Types
//!
//! - [`ContentId`] -- Content-addressed identifier (32-byte digest, hex text form)
//! - [`TypeError`] -- Parse failures for identifiers

pub mod error;
pub mod id;

pub use error::TypeError;
pub use id::{ContentId, CONTENT_ID_LEN};
