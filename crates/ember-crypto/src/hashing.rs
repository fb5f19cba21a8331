//! # Keccak-256
//!
//! The engine's only digest: code hashes, signing hashes, address
//! derivation all go through Keccak-256.

use ember_types::Hash;
use sha3::{Digest, Keccak256};

/// Computes the Keccak-256 digest of `data`.
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    let digest = Keccak256::digest(data);
    Hash::new(digest.into())
}
