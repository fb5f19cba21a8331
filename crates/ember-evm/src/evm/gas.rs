//! # Gas Accounting
//!
//! Cost constants, the static per-opcode table, dynamic-cost helpers, and
//! the intrinsic transaction cost. Costs are flat (no warm/cold access
//! tracking); fork-accurate pricing is out of scope.

use ember_types::U256;

/// Gas cost constants.
pub mod costs {
    /// Free.
    pub const ZERO: u64 = 0;
    /// Cheapest chargeable tier (ADDRESS, CALLER, ...).
    pub const BASE: u64 = 2;
    /// Arithmetic tier (ADD, PUSH, DUP, SWAP, ...).
    pub const VERY_LOW: u64 = 3;
    /// MUL/DIV tier.
    pub const LOW: u64 = 5;
    /// ADDMOD/MULMOD/JUMP tier.
    pub const MID: u64 = 8;
    /// JUMPI tier.
    pub const HIGH: u64 = 10;
    /// JUMPDEST marker.
    pub const JUMPDEST: u64 = 1;

    // Transaction intrinsics
    /// Base cost of any transaction.
    pub const TX_BASE: u64 = 21_000;
    /// Base cost of a contract-creation transaction.
    pub const TX_CREATE: u64 = 53_000;
    /// Per non-zero calldata byte.
    pub const TX_DATA_NON_ZERO: u64 = 16;
    /// Per zero calldata byte.
    pub const TX_DATA_ZERO: u64 = 4;

    // State access (flat)
    /// BALANCE / SELFBALANCE account read.
    pub const BALANCE: u64 = 700;
    /// Storage read.
    pub const SLOAD: u64 = 800;
    /// Storage write, zero -> non-zero.
    pub const SSTORE_SET: u64 = 20_000;
    /// Storage write, any other transition.
    pub const SSTORE_RESET: u64 = 5_000;

    // Hashing
    /// KECCAK256 base.
    pub const KECCAK256: u64 = 30;
    /// KECCAK256 per input word.
    pub const KECCAK256_WORD: u64 = 6;

    // Copies
    /// Per word copied (CALLDATACOPY, CODECOPY, RETURNDATACOPY).
    pub const COPY_WORD: u64 = 3;

    // Logs
    /// LOG base.
    pub const LOG: u64 = 375;
    /// Per LOG topic.
    pub const LOG_TOPIC: u64 = 375;
    /// Per LOG payload byte.
    pub const LOG_DATA: u64 = 8;

    // Misc
    /// EXP base.
    pub const EXP: u64 = 10;
    /// EXP per exponent byte.
    pub const EXP_BYTE: u64 = 50;
    /// BLOCKHASH.
    pub const BLOCKHASH: u64 = 20;
}

/// Extra (beyond the base charge) gas for EXP, by exponent byte width.
#[must_use]
pub fn exp_extra_gas(exponent: U256) -> u64 {
    if exponent.is_zero() {
        return 0;
    }
    let byte_width = (256 - u64::from(exponent.leading_zeros())).div_ceil(8);
    costs::EXP_BYTE * byte_width
}

/// Extra gas for KECCAK256 over `size` input bytes.
#[must_use]
pub fn keccak_word_gas(size: usize) -> u64 {
    costs::KECCAK256_WORD * size.div_ceil(32) as u64
}

/// Gas for copying `size` bytes into memory.
#[must_use]
pub fn copy_word_gas(size: usize) -> u64 {
    costs::COPY_WORD * size.div_ceil(32) as u64
}

/// Extra gas for a LOG beyond its base charge.
#[must_use]
pub fn log_extra_gas(data_size: usize, topic_count: usize) -> u64 {
    costs::LOG_TOPIC * topic_count as u64 + costs::LOG_DATA * data_size as u64
}

/// Intrinsic cost of a transaction: flat base plus per-byte calldata gas.
#[must_use]
pub fn intrinsic_gas(data: &[u8], is_creation: bool) -> u64 {
    let base = if is_creation {
        costs::TX_CREATE
    } else {
        costs::TX_BASE
    };
    let data_gas: u64 = data
        .iter()
        .map(|&byte| {
            if byte == 0 {
                costs::TX_DATA_ZERO
            } else {
                costs::TX_DATA_NON_ZERO
            }
        })
        .sum();
    base + data_gas
}

/// Static gas charged per opcode byte before its dynamic costs.
#[rustfmt::skip]
pub const OPCODE_GAS: [u64; 256] = {
    let mut table = [0u64; 256];

    // Stop and arithmetic
    table[0x00] = costs::ZERO;          // STOP
    table[0x01] = costs::VERY_LOW;      // ADD
    table[0x02] = costs::LOW;           // MUL
    table[0x03] = costs::VERY_LOW;      // SUB
    table[0x04] = costs::LOW;           // DIV
    table[0x05] = costs::LOW;           // SDIV
    table[0x06] = costs::LOW;           // MOD
    table[0x07] = costs::LOW;           // SMOD
    table[0x08] = costs::MID;           // ADDMOD
    table[0x09] = costs::MID;           // MULMOD
    table[0x0A] = costs::EXP;           // EXP (dynamic added)
    table[0x0B] = costs::LOW;           // SIGNEXTEND

    // Comparison & bitwise
    let mut i = 0x10;
    while i <= 0x1D {
        table[i] = costs::VERY_LOW;     // LT..SAR
        i += 1;
    }

    table[0x20] = costs::KECCAK256;     // KECCAK256 (dynamic added)

    // Environment
    table[0x30] = costs::BASE;          // ADDRESS
    table[0x31] = costs::BALANCE;       // BALANCE
    table[0x32] = costs::BASE;          // ORIGIN
    table[0x33] = costs::BASE;          // CALLER
    table[0x34] = costs::BASE;          // CALLVALUE
    table[0x35] = costs::VERY_LOW;      // CALLDATALOAD
    table[0x36] = costs::BASE;          // CALLDATASIZE
    table[0x37] = costs::VERY_LOW;      // CALLDATACOPY (dynamic added)
    table[0x38] = costs::BASE;          // CODESIZE
    table[0x39] = costs::VERY_LOW;      // CODECOPY (dynamic added)
    table[0x3A] = costs::BASE;          // GASPRICE
    table[0x3D] = costs::BASE;          // RETURNDATASIZE
    table[0x3E] = costs::VERY_LOW;      // RETURNDATACOPY (dynamic added)

    // Block info
    table[0x40] = costs::BLOCKHASH;     // BLOCKHASH
    table[0x41] = costs::BASE;          // COINBASE
    table[0x42] = costs::BASE;          // TIMESTAMP
    table[0x43] = costs::BASE;          // NUMBER
    table[0x44] = costs::BASE;          // PREVRANDAO
    table[0x45] = costs::BASE;          // GASLIMIT
    table[0x46] = costs::BASE;          // CHAINID
    table[0x47] = costs::BALANCE;       // SELFBALANCE
    table[0x48] = costs::BASE;          // BASEFEE

    // Stack, memory, storage
    table[0x50] = costs::BASE;          // POP
    table[0x51] = costs::VERY_LOW;      // MLOAD (memory added)
    table[0x52] = costs::VERY_LOW;      // MSTORE (memory added)
    table[0x53] = costs::VERY_LOW;      // MSTORE8 (memory added)
    table[0x54] = costs::SLOAD;         // SLOAD
    table[0x55] = costs::ZERO;          // SSTORE (fully dynamic)
    table[0x56] = costs::MID;           // JUMP
    table[0x57] = costs::HIGH;          // JUMPI
    table[0x58] = costs::BASE;          // PC
    table[0x59] = costs::BASE;          // MSIZE
    table[0x5A] = costs::BASE;          // GAS
    table[0x5B] = costs::JUMPDEST;      // JUMPDEST

    // Pushes, dups, swaps
    table[0x5F] = costs::BASE;          // PUSH0
    i = 0x60;
    while i <= 0x9F {
        table[i] = costs::VERY_LOW;     // PUSH1..32, DUP1..16, SWAP1..16
        i += 1;
    }

    // Logs
    i = 0xA0;
    while i <= 0xA4 {
        table[i] = costs::LOG;          // LOG0..4 (dynamic added)
        i += 1;
    }

    // Halting
    table[0xF3] = costs::ZERO;          // RETURN (memory added)
    table[0xFD] = costs::ZERO;          // REVERT (memory added)
    table[0xFE] = costs::ZERO;          // INVALID

    table
};

// =============================================================================
// TESTS
// =============================================================================
