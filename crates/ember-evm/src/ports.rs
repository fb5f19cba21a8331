//! # State Access Port
//!
//! The interpreter's only view of the outside world. The trait is defined
//! here, next to its consumer; `ember-state` stays free of execution
//! concerns and is plugged in through the implementation below.
//!
//! Writes made through this port are staged in whatever checkpoint layer
//! the caller opened; the interpreter itself never commits or reverts.

use ember_state::StateManager;
use ember_types::{Account, Address, StorageKey, StorageValue, U256};

/// Read/write access to accounts and contract storage during execution.
pub trait StateAccess {
    /// Account record at `address`; absent accounts read as the zero-valued
    /// account.
    fn account(&self, address: Address) -> Account;

    /// Storage slot value; absent slots read as zero.
    fn storage(&self, address: Address, key: StorageKey) -> StorageValue;

    /// Stages a storage write.
    fn set_storage(&mut self, address: Address, key: StorageKey, value: StorageValue);

    /// Balance at `address`.
    fn balance(&self, address: Address) -> U256 {
        self.account(address).balance
    }
}

impl StateAccess for StateManager {
    fn account(&self, address: Address) -> Account {
        self.get_account(address)
    }

    fn storage(&self, address: Address, key: StorageKey) -> StorageValue {
        self.get_storage(address, key)
    }

    fn set_storage(&mut self, address: Address, key: StorageKey, value: StorageValue) {
        self.put_storage(address, key, value);
    }
}

// =============================================================================
// TESTS
// =============================================================================
