//! # Execution Results
//!
//! The immutable outcome of one call or transaction.

use crate::errors::VmError;
use ember_types::{Address, Bytes, Hash};
use serde::{Deserialize, Serialize};

/// Outcome of a call or transaction. Produced once, never mutated after.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Data returned by RETURN, or the revert payload for REVERT. Empty for
    /// exceptional halts and implicit stops.
    pub return_data: Bytes,
    /// Gas charged. For a failed transaction this is the full gas limit
    /// (no refund on failure).
    pub gas_used: u64,
    /// True for any failure: explicit revert, out-of-gas, or fault. The
    /// caller does not need to distinguish; `halt` records the kind.
    pub reverted: bool,
    /// Address of the created contract (successful creation only).
    pub created_address: Option<Address>,
    /// Logs emitted during execution. Collected only on the success path.
    pub logs: Vec<Log>,
    /// The failure kind when `reverted` is true; `None` on success.
    pub halt: Option<VmError>,
}

impl ExecutionResult {
    /// True if execution completed without reverting.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.reverted
    }
}

/// An event emitted by contract code (LOG0..LOG4).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Contract that emitted the log.
    pub address: Address,
    /// Indexed topics, at most four.
    pub topics: Vec<Hash>,
    /// Non-indexed payload.
    pub data: Bytes,
}

impl Log {
    /// Creates a new log entry.
    #[must_use]
    pub fn new(address: Address, topics: Vec<Hash>, data: Bytes) -> Self {
        Self {
            address,
            topics,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_result_is_success() {
        let result = ExecutionResult::default();
        assert!(result.is_success());
        assert!(result.halt.is_none());
        assert!(result.logs.is_empty());
    }
}
