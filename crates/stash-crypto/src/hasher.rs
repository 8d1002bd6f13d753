use sha2::{Digest as _, Sha256};
use stash_types::ContentId;

/// Maps payload bytes to a content identifier.
///
/// Implementations must be deterministic and collision-resistant: the same
/// bytes always yield the same ID, and distinct bytes practically never do.
pub trait Digester: Send + Sync {
    /// Compute the identifier of `data`.
    fn digest(&self, data: &[u8]) -> ContentId;

    /// Short algorithm name, used in log fields.
    fn algorithm(&self) -> &'static str;
}

/// Plain SHA-256 digester.
///
/// No domain tag is mixed in, so the identifier of a payload is exactly the
/// well-known SHA-256 of its bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Digester;

impl Sha256Digester {
    /// Create a new SHA-256 digester.
    pub const fn new() -> Self {
        Self
    }
}

impl Digester for Sha256Digester {
    fn digest(&self, data: &[u8]) -> ContentId {
        ContentId::from_digest(Sha256::digest(data).into())
    }

    fn algorithm(&self) -> &'static str {
        "sha256"
    }
}
