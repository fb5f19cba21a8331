//! # Execution Contexts
//!
//! Everything the interpreter needs to know about its invocation: who is
//! calling, what is being executed, how much gas is available, and the
//! block environment exposed through the environment opcodes.

use ember_types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// Context for a single execution frame.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    /// Immediate caller of this frame.
    pub caller: Address,
    /// Account that signed the originating transaction.
    pub origin: Address,
    /// Account whose code is executing (the created address in creation
    /// mode).
    pub address: Address,
    /// Value attached to the invocation, in wei.
    pub value: U256,
    /// Input data (calldata; empty in creation mode, where the init code
    /// itself is the input).
    pub data: Bytes,
    /// Gas budget for this frame.
    pub gas_limit: u64,
    /// Gas price of the originating transaction.
    pub gas_price: U256,
    /// Block environment.
    pub block: BlockContext,
}

/// Block environment for execution.
///
/// The engine runs outside any real chain, so these are host-configured
/// constants rather than consensus values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockContext {
    /// Block number.
    pub number: u64,
    /// Block timestamp (unix seconds).
    pub timestamp: u64,
    /// Block proposer address.
    pub coinbase: Address,
    /// PREVRANDAO value.
    pub prevrandao: U256,
    /// Block gas limit.
    pub gas_limit: u64,
    /// Base fee per gas.
    pub base_fee: U256,
    /// Chain id.
    pub chain_id: u64,
}

impl Default for BlockContext {
    fn default() -> Self {
        Self {
            number: 0,
            timestamp: 0,
            coinbase: Address::ZERO,
            prevrandao: U256::zero(),
            gas_limit: 30_000_000,
            base_fee: U256::zero(),
            chain_id: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_context_defaults() {
        let block = BlockContext::default();
        assert_eq!(block.gas_limit, 30_000_000);
        assert_eq!(block.chain_id, 1);
        assert!(block.base_fee.is_zero());
    }
}
