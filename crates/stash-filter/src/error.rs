use thiserror::Error;

/// Errors from filter construction.
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("filter capacity must be positive")]
    ZeroCapacity,

    #[error("false positive rate must be in (0, 1), got {0}")]
    InvalidFalsePositiveRate(f64),

    #[error("filter would need {bits} bits, more than the limit of {max}")]
    TooLarge { bits: u64, max: u64 },
}

pub type FilterResult<T> = Result<T, FilterError>;
