//! # Ember State
//!
//! Account and contract-storage state for the EmberVM engine.
//!
//! Two layers:
//!
//! - [`AccountStore`]: a plain address -> account mapping with no coupling
//!   to execution.
//! - [`StateManager`]: composes the store with per-contract key/value
//!   storage and contract code, and exposes a transactional view through a
//!   stack of checkpoint layers (checkpoint / commit / revert).
//!
//! Reads always observe the most recent uncommitted write in the active
//! checkpoint chain; a reverted checkpoint's writes are invisible to all
//! subsequent reads.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod store;

pub use manager::{Checkpoint, StateManager};
pub use store::AccountStore;

use thiserror::Error;

/// Errors from state-manager operations.
///
/// Both variants are programming-contract violations (the caller committed
/// or reverted checkpoints out of order) and should be treated as fatal,
/// not retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The checkpoint passed to commit/revert is not the current top.
    #[error("checkpoint order violation: top is {expected}, got {actual}")]
    CheckpointOrder {
        /// Id of the current top checkpoint.
        expected: u64,
        /// Id of the checkpoint the caller passed.
        actual: u64,
    },

    /// commit/revert was called with no checkpoint open.
    #[error("no active checkpoint")]
    NoActiveCheckpoint,
}
