//! # Ember Types
//!
//! Shared value objects and entities for the EmberVM execution engine.
//!
//! Everything in this crate is a plain data type: no I/O, no async, no
//! crypto. The heavier crates (`ember-crypto`, `ember-state`, `ember-evm`)
//! build on these primitives.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod account;
pub mod primitives;
pub mod signature;

pub use account::Account;
pub use primitives::{Address, Bytes, Hash, ParseError, StorageKey, StorageValue, U256};
pub use signature::RecoverableSignature;
