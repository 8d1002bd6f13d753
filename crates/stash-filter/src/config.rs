use std::f64::consts::LN_2;

use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};

/// Smallest bit array a filter gets, whatever the sizing math says.
pub const MIN_BITS: u64 = 64;

/// Largest bit array a filter may ask for: 2^34 bits, 2 GiB of words.
pub const MAX_BITS: u64 = 1 << 34;

/// Sizing parameters for the membership filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Expected maximum number of distinct identifiers.
    pub capacity: usize,
    /// Target false-positive rate while at or below `capacity`.
    pub false_positive_rate: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            capacity: 1_000_000,
            false_positive_rate: 0.01,
        }
    }
}

impl FilterConfig {
    pub fn new(capacity: usize, false_positive_rate: f64) -> Self {
        Self {
            capacity,
            false_positive_rate,
        }
    }

    /// Check that the parameters describe a buildable filter.
    pub fn validate(&self) -> FilterResult<()> {
        if self.capacity == 0 {
            return Err(FilterError::ZeroCapacity);
        }
        let p = self.false_positive_rate;
        if !(p > 0.0 && p < 1.0) {
            return Err(FilterError::InvalidFalsePositiveRate(p));
        }
        let bits = self.optimal_bits();
        if bits > MAX_BITS as f64 {
            return Err(FilterError::TooLarge {
                bits: bits as u64,
                max: MAX_BITS,
            });
        }
        Ok(())
    }

    /// Bit array size for these parameters, `m = -n·ln(p) / ln(2)²`, at
    /// least [`MIN_BITS`]. Only meaningful once [`validate`](Self::validate)
    /// has passed.
    pub fn num_bits(&self) -> u64 {
        (self.optimal_bits() as u64).max(MIN_BITS)
    }

    /// Probes per key, `k = (m / n)·ln 2`, at least one.
    pub fn num_hashes(&self) -> u32 {
        ((self.num_bits() as f64 / self.capacity as f64) * LN_2)
            .round()
            .max(1.0) as u32
    }

    fn optimal_bits(&self) -> f64 {
        let n = self.capacity as f64;
        (-n * self.false_positive_rate.ln() / (LN_2 * LN_2)).ceil()
    }
}
