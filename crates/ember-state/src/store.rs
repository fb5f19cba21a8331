//! # Account Store
//!
//! A plain in-memory mapping from address to account record. No side
//! effects beyond the map itself; transactional behavior lives in the
//! state manager on top.

use ember_types::{Account, Address};
use std::collections::HashMap;

/// In-memory address -> account mapping.
///
/// Absent accounts read as the zero-valued account rather than failing;
/// callers that need contract-existence checks use the account's code hash.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AccountStore {
    accounts: HashMap<Address, Account>,
}

impl AccountStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the account at `address`, if present.
    #[must_use]
    pub fn get(&self, address: Address) -> Option<&Account> {
        self.accounts.get(&address)
    }

    /// Returns the account at `address`, or the zero-valued account.
    #[must_use]
    pub fn get_or_default(&self, address: Address) -> Account {
        self.accounts.get(&address).cloned().unwrap_or_default()
    }

    /// Inserts or replaces the account at `address`.
    pub fn put(&mut self, address: Address, account: Account) {
        self.accounts.insert(address, account);
    }

    /// Removes the account at `address`, returning it if present.
    pub fn delete(&mut self, address: Address) -> Option<Account> {
        self.accounts.remove(&address)
    }

    /// Number of stored accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if no accounts are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ember_types::U256;

    #[test]
    fn test_absent_reads_as_zero_account() {
        let store = AccountStore::new();
        let addr = Address::new([1u8; 20]);

        assert!(store.get(addr).is_none());
        let account = store.get_or_default(addr);
        assert_eq!(account.nonce, 0);
        assert!(account.balance.is_zero());
        assert!(!account.is_contract());
    }

    #[test]
    fn test_put_get_delete() {
        let mut store = AccountStore::new();
        let addr = Address::new([2u8; 20]);

        store.put(addr, Account::with_balance(U256::from(500), 7));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(addr).unwrap().nonce, 7);

        let removed = store.delete(addr).unwrap();
        assert_eq!(removed.balance, U256::from(500));
        assert!(store.is_empty());
        assert!(store.delete(addr).is_none());
    }

    #[test]
    fn test_present_with_zero_balance_differs_from_absent() {
        let mut store = AccountStore::new();
        let addr = Address::new([3u8; 20]);

        store.put(addr, Account::default());
        // get distinguishes presence; get_or_default does not.
        assert!(store.get(addr).is_some());
        assert_eq!(store.get_or_default(addr), Account::default());
    }
}
