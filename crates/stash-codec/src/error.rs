use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("compression failed: {0}")]
    Compression(String),

    #[error("decompression failed: {0}")]
    Decompression(String),

    #[error("invalid compression level {level}: expected {min}..={max}")]
    InvalidLevel { level: i32, min: i32, max: i32 },
}

pub type CodecResult<T> = Result<T, CodecError>;
