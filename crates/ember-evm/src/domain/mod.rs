//! # Execution Domain
//!
//! Contexts, results, and pure services for contract execution.

pub mod context;
pub mod result;
pub mod services;

pub use context::{BlockContext, CallContext};
pub use result::{ExecutionResult, Log};
pub use services::contract_address;
