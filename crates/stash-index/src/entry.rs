//! Metadata recorded for each stored entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata of one deduplicated payload. The bytes themselves live in the
/// blob store; this is what the index keeps.
///
/// Serialized as `{"storedAt": "<RFC 3339>", "compressedSize": <u64>}`.
/// Unknown fields are rejected so a malformed document is caught on load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EntryMeta {
    /// Time of the first successful write.
    pub stored_at: DateTime<Utc>,
    /// Length of the compressed blob in bytes.
    pub compressed_size: u64,
}

impl EntryMeta {
    /// Metadata for an entry being stored now.
    pub fn new(compressed_size: u64) -> Self {
        Self {
            stored_at: Utc::now(),
            compressed_size,
        }
    }
}
