//! Digest primitives for Stash.
//!
//! A [`Digester`] turns payload bytes into a fixed-length [`ContentId`].
//! Stash treats the digest as opaque: any collision-resistant hash works,
//! and [`Sha256Digester`] is the one used by default.
//!
//! All crypto operations wrap established libraries.
//!
//! [`ContentId`]: stash_types::ContentId

pub mod hasher;

pub use hasher::{Digester, Sha256Digester};
