//! # Domain Services
//!
//! Pure, deterministic functions with no I/O and no state access.

use ember_crypto::keccak256;
use ember_types::Address;

/// Computes the address of a contract created by `sender` at `nonce`.
///
/// `keccak256(rlp([sender, nonce]))[12..]`, the standard CREATE rule. The
/// mapping is a pure function of its inputs: replaying the same creation
/// from the same nonce yields the same address.
#[must_use]
pub fn contract_address(sender: Address, nonce: u64) -> Address {
    // rlp([sender, nonce]); the payload is at most 30 bytes, so the list
    // header is always a single byte.
    let mut payload = Vec::with_capacity(30);
    payload.push(0x80 + 20);
    payload.extend_from_slice(sender.as_bytes());
    rlp_append_u64(&mut payload, nonce);

    let mut encoded = Vec::with_capacity(payload.len() + 1);
    encoded.push(0xc0 + payload.len() as u8);
    encoded.extend_from_slice(&payload);

    let digest = keccak256(&encoded);
    Address::from_slice(&digest.as_bytes()[12..]).unwrap_or(Address::ZERO)
}

/// RLP-encodes a u64 as a minimal big-endian byte string.
fn rlp_append_u64(out: &mut Vec<u8>, value: u64) {
    if value == 0 {
        out.push(0x80);
    } else if value < 0x80 {
        out.push(value as u8);
    } else {
        let bytes = value.to_be_bytes();
        let first = bytes.iter().position(|&b| b != 0).unwrap_or(7);
        out.push(0x80 + (8 - first) as u8);
        out.extend_from_slice(&bytes[first..]);
    }
}

// =============================================================================
// TESTS
// =============================================================================
