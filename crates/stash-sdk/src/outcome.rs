use serde::{Deserialize, Serialize};
use stash_types::ContentId;

/// What `put` did with a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PutStatus {
    /// Novel content; a blob and an index entry were written.
    Stored,
    /// The index already had this content; nothing was written.
    Duplicate,
}

/// Result of a put operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutOutcome {
    pub status: PutStatus,
    pub id: ContentId,
}

impl PutOutcome {
    pub fn stored(id: ContentId) -> Self {
        Self {
            status: PutStatus::Stored,
            id,
        }
    }

    pub fn duplicate(id: ContentId) -> Self {
        Self {
            status: PutStatus::Duplicate,
            id,
        }
    }

    pub fn is_stored(&self) -> bool {
        self.status == PutStatus::Stored
    }

    pub fn is_duplicate(&self) -> bool {
        self.status == PutStatus::Duplicate
    }
}

/// Point-in-time counters for a store.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StashStats {
    /// Entries in the index.
    pub entries: usize,
    /// Sum of compressed blob sizes recorded in the index.
    pub compressed_bytes: u64,
    /// Size of the membership filter's bit array.
    pub filter_bits: u64,
    /// Probes per identifier in the membership filter.
    pub filter_hashes: u32,
    /// Fraction of filter bits set.
    pub filter_fill_ratio: f64,
}
