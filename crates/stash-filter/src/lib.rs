//! Membership filter for Stash.
//!
//! A Bloom filter over content identifiers that answers "might this ID
//! already be stored?" without touching disk. It has one-sided error: a
//! `false` answer is definitive, a `true` answer must be confirmed against
//! the index.
//!
//! The filter is a derived cache of the index. It is never persisted; the
//! store rebuilds it from the index keys at startup with
//! [`BloomFilter::from_ids`].

pub mod bloom;
pub mod config;
pub mod error;

pub use bloom::BloomFilter;
pub use config::FilterConfig;
pub use error::{FilterError, FilterResult};
