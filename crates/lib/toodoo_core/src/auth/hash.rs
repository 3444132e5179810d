//! Per-membership access hashes.
//!
//! A hash is minted when a user is attached to a list and is the only
//! credential for that (user, list) pair. Only its SHA-256 digest is stored.

use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use sha2::{Digest, Sha256};

/// Length of a minted access hash.
pub const ACCESS_HASH_LEN: usize = 64;

/// Generate a cryptographically random access hash (64 alphanumeric chars).
pub fn mint_access_hash() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(ACCESS_HASH_LEN)
        .map(char::from)
        .collect()
}

/// SHA-256 hex digest of an access hash, as stored.
pub fn digest_access_hash(hash: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(hash.as_bytes());
    format!("{:x}", hasher.finalize())
}
