use tracing::trace;

use crate::error::{CodecError, CodecResult};
use crate::Codec;

/// Default zstd compression level.
pub const DEFAULT_LEVEL: i32 = 3;

const MIN_LEVEL: i32 = 1;
const MAX_LEVEL: i32 = 22;

/// zstd codec. Blobs written with it carry the `zst` extension.
#[derive(Clone, Copy, Debug)]
pub struct ZstdCodec {
    level: i32,
}

impl ZstdCodec {
    /// Create a codec at the given level (1..=22).
    pub fn new(level: i32) -> CodecResult<Self> {
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
            return Err(CodecError::InvalidLevel {
                level,
                min: MIN_LEVEL,
                max: MAX_LEVEL,
            });
        }
        Ok(Self { level })
    }

    /// The configured compression level.
    pub fn level(&self) -> i32 {
        self.level
    }
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
        }
    }
}

impl Codec for ZstdCodec {
    fn compress(&self, data: &[u8]) -> CodecResult<Vec<u8>> {
        let compressed = zstd::encode_all(data, self.level)
            .map_err(|e| CodecError::Compression(e.to_string()))?;
        trace!(
            raw = data.len(),
            compressed = compressed.len(),
            level = self.level,
            "zstd compress"
        );
        Ok(compressed)
    }

    fn decompress(&self, data: &[u8]) -> CodecResult<Vec<u8>> {
        zstd::decode_all(data).map_err(|e| CodecError::Decompression(e.to_string()))
    }

    fn extension(&self) -> &'static str {
        "zst"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_text() {
        let codec = ZstdCodec::default();
        let compressed = codec.compress(b"hello world").unwrap();
        assert_eq!(codec.decompress(&compressed).unwrap(), b"hello world");
    }

    #[test]
    fn roundtrip_empty() {
        let codec = ZstdCodec::default();
        let compressed = codec.compress(b"").unwrap();
        assert!(codec.decompress(&compressed).unwrap().is_empty());
    }

    #[test]
    fn repetitive_data_shrinks() {
        let codec = ZstdCodec::default();
        let data = vec![b'a'; 64 * 1024];
        let compressed = codec.compress(&data).unwrap();
        assert!(compressed.len() < data.len());
    }

    #[test]
    fn garbage_fails_to_decompress() {
        let codec = ZstdCodec::default();
        let err = codec.decompress(b"definitely not a zstd frame").unwrap_err();
        assert!(matches!(err, CodecError::Decompression(_)));
    }

    #[test]
    fn level_bounds_are_checked() {
        assert!(ZstdCodec::new(1).is_ok());
        assert_eq!(ZstdCodec::new(19).unwrap().level(), 19);
        assert!(matches!(
            ZstdCodec::new(0),
            Err(CodecError::InvalidLevel { level: 0, .. })
        ));
        assert!(ZstdCodec::new(23).is_err());
    }

    #[test]
    fn extension_is_zst() {
        assert_eq!(ZstdCodec::default().extension(), "zst");
    }
}
