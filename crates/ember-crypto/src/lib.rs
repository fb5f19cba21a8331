//! # Ember Crypto
//!
//! Cryptographic primitives for the EmberVM engine:
//!
//! - Keccak-256 hashing
//! - secp256k1 keypairs with recoverable ECDSA signing (RFC 6979
//!   deterministic nonces, no RNG dependency for signing)
//! - signer-address recovery from a signed digest
//!
//! Address derivation follows the standard rule: the last 20 bytes of the
//! Keccak-256 digest of the uncompressed public key.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod hashing;
pub mod keys;

pub use hashing::keccak256;
pub use keys::{recover_address, Keypair};

use thiserror::Error;

/// Errors from cryptographic operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Private key bytes were not a valid secp256k1 scalar.
    #[error("invalid private key")]
    InvalidPrivateKey,

    /// Signature bytes were malformed (r/s out of range, bad recovery id).
    #[error("invalid signature")]
    InvalidSignature,

    /// Signature was well-formed but no public key could be recovered.
    #[error("public key recovery failed")]
    RecoveryFailed,
}
