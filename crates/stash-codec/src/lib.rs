//! Compression codecs for Stash.
//!
//! Blobs are stored compressed. The store only relies on the round-trip
//! contract `decompress(compress(x)) == x`; it never looks inside the bytes.
//!
//! - [`Codec`] -- the reversible transform, plus the file extension blobs get
//! - [`ZstdCodec`] -- zstd at a configurable level (default 3)

pub mod error;
pub mod zstd_codec;

pub use error::{CodecError, CodecResult};
pub use zstd_codec::{ZstdCodec, DEFAULT_LEVEL};

/// Reversible byte transform applied to payloads before they hit disk.
pub trait Codec: Send + Sync {
    /// Compress `data`.
    fn compress(&self, data: &[u8]) -> CodecResult<Vec<u8>>;

    /// Reverse [`Codec::compress`].
    fn decompress(&self, data: &[u8]) -> CodecResult<Vec<u8>>;

    /// File extension (without the dot) for blobs written with this codec.
    fn extension(&self) -> &'static str;
}
