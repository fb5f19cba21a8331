//! # secp256k1 Keys & Recovery
//!
//! Keypair wrapper around `k256` with recoverable prehash signing. Signing
//! uses RFC 6979 deterministic nonces, so the same key and digest always
//! produce the same signature.

use crate::{hashing::keccak256, CryptoError};
use ember_types::{Address, Hash, RecoverableSignature};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use zeroize::Zeroize;

/// A secp256k1 keypair.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generates a random keypair.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::thread_rng()),
        }
    }

    /// Creates a keypair from secret key bytes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPrivateKey` if the bytes are not a valid scalar.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Returns the secret key bytes (for serialization).
    #[must_use]
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }

    /// Derives the account address: last 20 bytes of the Keccak-256 digest
    /// of the uncompressed public key (without the 0x04 SEC1 tag).
    ///
    /// The mapping secret key -> address is pure and total.
    #[must_use]
    pub fn address(&self) -> Address {
        address_of(self.signing_key.verifying_key())
    }

    /// Signs a 32-byte digest, producing a recoverable signature.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSignature` in the (practically unreachable) case the
    /// backend rejects the digest.
    pub fn sign_hash(&self, digest: &Hash) -> Result<RecoverableSignature, CryptoError> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|_| CryptoError::InvalidSignature)?;

        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Ok(RecoverableSignature::new(r, s, recovery_id.to_byte()))
    }
}

impl Drop for Keypair {
    fn drop(&mut self) {
        // Zeroize secret key material.
        let mut bytes: [u8; 32] = self.signing_key.to_bytes().into();
        bytes.zeroize();
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish()
    }
}

/// Recovers the signer's address from a digest and a recoverable signature.
///
/// # Errors
///
/// Returns `InvalidSignature` for malformed r/s/v, `RecoveryFailed` when no
/// public key matches.
pub fn recover_address(
    digest: &Hash,
    signature: &RecoverableSignature,
) -> Result<Address, CryptoError> {
    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(&signature.r);
    rs[32..].copy_from_slice(&signature.s);
    let sig = Signature::from_slice(&rs).map_err(|_| CryptoError::InvalidSignature)?;

    let recovery_id =
        RecoveryId::from_byte(signature.normalized_v()).ok_or(CryptoError::InvalidSignature)?;

    let verifying_key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &sig, recovery_id)
        .map_err(|_| CryptoError::RecoveryFailed)?;

    Ok(address_of(&verifying_key))
}

fn address_of(verifying_key: &VerifyingKey) -> Address {
    let point = verifying_key.to_encoded_point(false);
    // Skip the 0x04 uncompressed-point tag.
    let digest = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&digest.as_bytes()[12..]).unwrap_or(Address::ZERO)
}

// =============================================================================
// TESTS
// =============================================================================
