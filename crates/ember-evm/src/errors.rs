//! # Error Types
//!
//! Failure kinds for bytecode execution, transaction application, and the
//! engine facade. Validation errors occur before any state is touched;
//! execution errors occur inside an open checkpoint and trigger a rollback
//! (minus the upfront gas deduction and nonce bump, which survive).

use ember_crypto::CryptoError;
use ember_state::StateError;
use ember_types::{Bytes, U256};
use thiserror::Error;

// =============================================================================
// VM ERRORS
// =============================================================================

/// Failure kinds during bytecode execution.
///
/// Everything except `Revert` is an exceptional halt and consumes all
/// remaining frame gas. Callers of the interpreter see only the `reverted`
/// flag on the result; the kind is preserved in `ExecutionResult::halt` for
/// rollback accounting and reporting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Execution ran out of gas.
    #[error("out of gas")]
    OutOfGas,

    /// Operand stack exceeded 1024 entries.
    #[error("stack overflow")]
    StackOverflow,

    /// Pop or peek on too few stack entries.
    #[error("stack underflow")]
    StackUnderflow,

    /// Byte did not decode to a supported opcode.
    #[error("invalid opcode: 0x{0:02x}")]
    InvalidOpcode(u8),

    /// JUMP/JUMPI target is not a JUMPDEST.
    #[error("invalid jump destination: {0}")]
    InvalidJump(usize),

    /// Memory expansion beyond the hard cap.
    #[error("memory limit exceeded: {requested} > {max} bytes")]
    MemoryLimitExceeded {
        /// Requested memory size in bytes.
        requested: usize,
        /// Maximum memory size in bytes.
        max: usize,
    },

    /// RETURNDATACOPY past the end of the return buffer.
    #[error("return data out of bounds: offset {offset}, size {size}, available {available}")]
    ReturnDataOutOfBounds {
        /// Requested offset into the return buffer.
        offset: usize,
        /// Requested copy size.
        size: usize,
        /// Bytes available in the return buffer.
        available: usize,
    },

    /// Contract-initiated revert (REVERT opcode). The revert payload is on
    /// the execution result, not here.
    #[error("execution reverted")]
    Revert,
}

// =============================================================================
// TRANSACTION ERRORS
// =============================================================================

/// Upfront validation failures for transaction application.
///
/// All of these occur before a checkpoint is opened and leave state
/// byte-for-byte unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxError {
    /// Signature was malformed or did not recover a sender.
    #[error("invalid transaction signature")]
    InvalidSignature,

    /// Transaction nonce does not match the sender's account nonce.
    #[error("nonce mismatch: account at {expected}, transaction carries {actual}")]
    NonceMismatch {
        /// Sender's current account nonce.
        expected: u64,
        /// Nonce carried by the transaction.
        actual: u64,
    },

    /// Sender cannot cover `gas_limit * gas_price + value`.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Upfront cost of the transaction.
        required: U256,
        /// Sender's balance.
        available: U256,
    },

    /// Gas limit does not cover the intrinsic transaction cost.
    #[error("gas limit {gas_limit} below intrinsic cost {required}")]
    IntrinsicGas {
        /// Gas limit carried by the transaction.
        gas_limit: u64,
        /// Intrinsic cost of the transaction.
        required: u64,
    },

    /// Checkpoint-contract violation from the state manager. Fatal.
    #[error(transparent)]
    State(#[from] StateError),
}

// =============================================================================
// ENGINE ERRORS
// =============================================================================

/// Failures surfaced by the engine facade.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Transaction validation failed.
    #[error(transparent)]
    Tx(#[from] TxError),

    /// Signing failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Execution completed but reverted.
    #[error("execution reverted (gas used {gas_used})")]
    Reverted {
        /// Gas charged for the failed execution.
        gas_used: u64,
        /// Revert payload (empty for exceptional halts).
        return_data: Bytes,
    },
}

// =============================================================================
// TESTS
// =============================================================================
