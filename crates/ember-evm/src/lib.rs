//! # Ember EVM
//!
//! A minimal EVM-class execution core: gas-metered bytecode interpretation,
//! signed-transaction application against checkpointed state, and a
//! host-facing engine facade.
//!
//! ## Components
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Interpreter | `evm/interpreter.rs` | Fetch/charge/execute loop |
//! | Stack | `evm/stack.rs` | 1024-entry operand stack |
//! | Memory | `evm/memory.rs` | Expandable memory with quadratic gas |
//! | Gas | `evm/gas.rs` | Cost table and dynamic-cost helpers |
//! | Opcodes | `evm/opcodes.rs` | Supported opcode set |
//! | Processor | `processor.rs` | Transaction lifecycle, read-only calls |
//! | Engine | `engine.rs` | Accounts, deploy, call, send |
//! | Events | `events.rs` | Pluggable execution observers |
//!
//! ## Execution model
//!
//! The interpreter is synchronous and single-threaded; gas exhaustion
//! bounds every execution. Storage effects are staged through the
//! [`ports::StateAccess`] port into the checkpoint the processor opened,
//! then committed or reverted as one unit. The upfront gas deduction and
//! nonce increment happen outside that checkpoint and survive failures.
//!
//! ## Usage
//!
//! ```ignore
//! use ember_evm::prelude::*;
//!
//! let engine = Engine::default();
//! let alice = engine.create_account().await;
//! let deployment = engine.deploy(&alice.keypair, &init_code, TxOptions::default()).await?;
//! let result = engine.call(alice.address, deployment.address, &calldata).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]

pub mod domain;
pub mod engine;
pub mod errors;
pub mod events;
pub mod evm;
pub mod ports;
pub mod processor;
pub mod tx;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::domain::{
        contract_address, BlockContext, CallContext, ExecutionResult, Log,
    };
    pub use crate::engine::{Deployment, Engine, EngineConfig, TestAccount, TxOptions};
    pub use crate::errors::{EngineError, TxError, VmError};
    pub use crate::events::{
        ChannelObserver, ExecutionEvent, ExecutionObserver, InvocationKind, TracingObserver,
    };
    pub use crate::evm::{gas, Interpreter, Memory, Opcode, Stack};
    pub use crate::ports::StateAccess;
    pub use crate::processor::{CallRequest, TransactionProcessor};
    pub use crate::tx::{SignedTransaction, Transaction};

    pub use ember_crypto::{keccak256, Keypair};
    pub use ember_state::{AccountStore, Checkpoint, StateError, StateManager};
    pub use ember_types::{
        Account, Address, Bytes, Hash, RecoverableSignature, StorageKey, StorageValue, U256,
    };
}
