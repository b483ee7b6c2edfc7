//! Hashing helpers for cache keys and document fingerprints.

use sha2::{Digest, Sha256};

use crate::constants::CONTENT_HASH_HEX_LEN;

/// BLAKE3 hash of the query text, used as the cache map key.
#[inline]
pub fn hash_query(query: &str) -> [u8; 32] {
    *blake3::hash(query.as_bytes()).as_bytes()
}

/// Content fingerprint used to detect document changes.
///
/// First 16 hex characters of the SHA-256 digest. Two documents with the same
/// fingerprint are treated as unchanged, so a collision only costs a skipped
/// invalidation.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(CONTENT_HASH_HEX_LEN);
    digest
}
