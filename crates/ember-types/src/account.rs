//! # Account Record
//!
//! The per-address state record: nonce, balance, code hash, storage root.

use crate::primitives::{Hash, U256};
use serde::{Deserialize, Serialize};

/// Per-address account record.
///
/// Absent accounts read as the zero-valued account (nonce 0, balance 0, no
/// code); contract existence is checked through the code hash, never through
/// map presence.
///
/// ## Invariants
/// - nonce is monotonically non-decreasing per address
/// - balance never goes negative (callers use checked arithmetic)
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Account {
    /// Transaction counter; increments once per applied transaction.
    pub nonce: u64,
    /// Balance in wei.
    pub balance: U256,
    /// Keccak-256 of the account's code, or the empty-code hash for plain
    /// accounts.
    pub code_hash: Hash,
    /// Opaque handle to the account's storage (unused by the in-memory
    /// state manager, kept for record completeness).
    pub storage_root: Hash,
}

impl Account {
    /// Keccak-256 of empty input: the code hash of an account with no code.
    pub const EMPTY_CODE_HASH: Hash = Hash([
        0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03,
        0xc0, 0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85,
        0xa4, 0x70,
    ]);

    /// Creates a plain (non-contract) account with the given balance and nonce.
    #[must_use]
    pub fn with_balance(balance: U256, nonce: u64) -> Self {
        Self {
            nonce,
            balance,
            code_hash: Self::EMPTY_CODE_HASH,
            storage_root: Hash::ZERO,
        }
    }

    /// Returns true if this account carries code.
    #[must_use]
    pub fn is_contract(&self) -> bool {
        self.code_hash != Self::EMPTY_CODE_HASH && !self.code_hash.is_zero()
    }

    /// Returns true if the account is indistinguishable from an absent one.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && !self.is_contract()
    }
}

// =============================================================================
// TESTS
// =============================================================================
