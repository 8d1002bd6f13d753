use stash_types::ContentId;
use tracing::{debug, warn};

use crate::config::FilterConfig;
use crate::error::FilterResult;

/// Bloom filter over content identifiers.
///
/// Sized from a [`FilterConfig`] with the usual optimum:
/// `m = -n·ln(p) / ln(2)²` bits and `k = (m / n)·ln 2` probes. Probe
/// positions come from double hashing (`h1 + i·h2`) over a BLAKE3 hash of
/// the key, so the filter behaves the same for any key distribution.
///
/// Adding more than `capacity` keys only raises the false-positive rate;
/// keys already added are still always reported as present.
pub struct BloomFilter {
    words: Vec<u64>,
    num_bits: u64,
    num_hashes: u32,
    capacity: usize,
    len: usize,
    overflow_reported: bool,
}

impl BloomFilter {
    /// Build an empty filter for the given configuration.
    pub fn new(config: &FilterConfig) -> FilterResult<Self> {
        config.validate()?;

        let num_bits = config.num_bits();
        let num_hashes = config.num_hashes();
        let num_words = num_bits.div_ceil(64) as usize;

        debug!(
            capacity = config.capacity,
            fp_rate = config.false_positive_rate,
            bits = num_bits,
            hashes = num_hashes,
            "bloom filter sized"
        );

        Ok(Self {
            words: vec![0u64; num_words],
            num_bits,
            num_hashes,
            capacity: config.capacity,
            len: 0,
            overflow_reported: false,
        })
    }

    /// Shorthand for [`BloomFilter::new`] with explicit parameters.
    pub fn with_capacity(capacity: usize, false_positive_rate: f64) -> FilterResult<Self> {
        Self::new(&FilterConfig::new(capacity, false_positive_rate))
    }

    /// Build a filter and add every identifier yielded by `ids`.
    pub fn from_ids<'a, I>(config: &FilterConfig, ids: I) -> FilterResult<Self>
    where
        I: IntoIterator<Item = &'a ContentId>,
    {
        let mut filter = Self::new(config)?;
        for id in ids {
            filter.add(id);
        }
        Ok(filter)
    }

    /// Record an identifier.
    pub fn add(&mut self, id: &ContentId) {
        self.add_bytes(id.as_bytes());
    }

    /// `false` means the identifier was definitely never added.
    pub fn might_contain(&self, id: &ContentId) -> bool {
        self.might_contain_bytes(id.as_bytes())
    }

    /// Record an arbitrary key.
    pub fn add_bytes(&mut self, key: &[u8]) {
        let (h1, h2) = probe_seeds(key);
        for i in 0..self.num_hashes {
            let bit = self.probe(h1, h2, i);
            self.words[(bit / 64) as usize] |= 1u64 << (bit % 64);
        }
        self.len += 1;

        if self.len > self.capacity && !self.overflow_reported {
            self.overflow_reported = true;
            warn!(
                capacity = self.capacity,
                "membership filter over capacity; false-positive rate will degrade"
            );
        }
    }

    /// Query an arbitrary key.
    pub fn might_contain_bytes(&self, key: &[u8]) -> bool {
        let (h1, h2) = probe_seeds(key);
        (0..self.num_hashes).all(|i| {
            let bit = self.probe(h1, h2, i);
            self.words[(bit / 64) as usize] & (1u64 << (bit % 64)) != 0
        })
    }

    /// Number of `add` calls recorded (duplicates count twice).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` once more keys than `capacity` were added.
    pub fn is_over_capacity(&self) -> bool {
        self.len > self.capacity
    }

    /// Size of the bit array.
    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    /// Probes per key.
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Fraction of bits set.
    pub fn fill_ratio(&self) -> f64 {
        let ones: u64 = self.words.iter().map(|w| u64::from(w.count_ones())).sum();
        ones as f64 / self.num_bits as f64
    }

    /// Current false-positive probability estimated from the fill ratio.
    pub fn estimated_false_positive_rate(&self) -> f64 {
        self.fill_ratio().powi(self.num_hashes as i32)
    }

    fn probe(&self, h1: u64, h2: u64, i: u32) -> u64 {
        h1.wrapping_add(u64::from(i).wrapping_mul(h2)) % self.num_bits
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("bits", &self.num_bits)
            .field("hashes", &self.num_hashes)
            .field("capacity", &self.capacity)
            .field("len", &self.len)
            .finish()
    }
}

/// Two independent 64-bit seeds for double hashing. `h2` is forced odd so
/// the probe sequence never collapses onto a single bit.
fn probe_seeds(key: &[u8]) -> (u64, u64) {
    let hash = blake3::hash(key);
    let bytes = hash.as_bytes();
    let mut a = [0u8; 8];
    let mut b = [0u8; 8];
    a.copy_from_slice(&bytes[0..8]);
    b.copy_from_slice(&bytes[8..16]);
    (u64::from_le_bytes(a), u64::from_le_bytes(b) | 1)
}
