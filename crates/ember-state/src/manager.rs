//! # State Manager
//!
//! Transactional view over accounts, contract storage, and contract code.
//!
//! Writes go to the top checkpoint layer when one is open, otherwise to the
//! base maps. Reads walk the layer stack newest-first, so read-your-writes
//! holds across nested checkpoints. Committing the only layer flushes it to
//! the base; committing a nested layer folds it into its parent. Reverting
//! drops the layer wholesale.

use crate::{AccountStore, StateError};
use ember_crypto::keccak256;
use ember_types::{Account, Address, Bytes, StorageKey, StorageValue};
use std::collections::HashMap;
use tracing::debug;

/// Opaque token for an open checkpoint.
///
/// Deliberately neither `Clone` nor `Copy`: a checkpoint is exclusively
/// owned by the caller that created it, and commit/revert consume it.
#[derive(Debug, PartialEq, Eq)]
pub struct Checkpoint {
    id: u64,
}

/// One overlay layer of pending writes.
#[derive(Debug, Default)]
struct Layer {
    id: u64,
    /// `None` marks a pending deletion.
    accounts: HashMap<Address, Option<Account>>,
    storage: HashMap<(Address, StorageKey), StorageValue>,
    code: HashMap<Address, Bytes>,
}

impl Layer {
    fn new(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

/// Layered state: base account store + storage + code, with a stack of
/// checkpoint overlays.
#[derive(Debug, Default)]
pub struct StateManager {
    accounts: AccountStore,
    storage: HashMap<(Address, StorageKey), StorageValue>,
    code: HashMap<Address, Bytes>,
    layers: Vec<Layer>,
    next_checkpoint_id: u64,
}

impl StateManager {
    /// Creates an empty state manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open checkpoints.
    #[must_use]
    pub fn checkpoint_depth(&self) -> usize {
        self.layers.len()
    }

    // =========================================================================
    // CHECKPOINTS
    // =========================================================================

    /// Opens a new checkpoint. All subsequent writes land in it until it is
    /// committed or reverted.
    pub fn checkpoint(&mut self) -> Checkpoint {
        let id = self.next_checkpoint_id;
        self.next_checkpoint_id += 1;
        self.layers.push(Layer::new(id));
        debug!(id, depth = self.layers.len(), "checkpoint opened");
        Checkpoint { id }
    }

    /// Merges the top layer into its parent (or the base when it is the only
    /// layer).
    ///
    /// # Errors
    ///
    /// Fails with `CheckpointOrder`/`NoActiveCheckpoint` if `checkpoint` is
    /// not the current top. The token is consumed either way; an order
    /// violation is a fatal caller bug.
    pub fn commit(&mut self, checkpoint: Checkpoint) -> Result<(), StateError> {
        let layer = self.take_top(&checkpoint)?;
        debug!(id = layer.id, depth = self.layers.len(), "checkpoint committed");

        if let Some(parent) = self.layers.last_mut() {
            parent.accounts.extend(layer.accounts);
            parent.storage.extend(layer.storage);
            parent.code.extend(layer.code);
        } else {
            for (address, entry) in layer.accounts {
                match entry {
                    Some(account) => self.accounts.put(address, account),
                    None => {
                        self.accounts.delete(address);
                    }
                }
            }
            for (slot, value) in layer.storage {
                // Zero-value writes delete the slot at the base, so storage
                // size accounting sees cleared slots as absent.
                if value.is_zero() {
                    self.storage.remove(&slot);
                } else {
                    self.storage.insert(slot, value);
                }
            }
            self.code.extend(layer.code);
        }
        Ok(())
    }

    /// Discards the top layer entirely.
    ///
    /// # Errors
    ///
    /// Same top-of-stack check as [`commit`](Self::commit).
    pub fn revert(&mut self, checkpoint: Checkpoint) -> Result<(), StateError> {
        let layer = self.take_top(&checkpoint)?;
        debug!(id = layer.id, depth = self.layers.len(), "checkpoint reverted");
        Ok(())
    }

    /// Pops the top layer if `checkpoint` names it; leaves the stack
    /// untouched otherwise.
    fn take_top(&mut self, checkpoint: &Checkpoint) -> Result<Layer, StateError> {
        match self.layers.last() {
            None => Err(StateError::NoActiveCheckpoint),
            Some(top) if top.id != checkpoint.id => Err(StateError::CheckpointOrder {
                expected: top.id,
                actual: checkpoint.id,
            }),
            Some(_) => Ok(self.layers.pop().unwrap_or_default()),
        }
    }

    // =========================================================================
    // ACCOUNTS
    // =========================================================================

    /// Reads the account at `address` through the layer stack. Absent
    /// accounts read as the zero-valued account.
    #[must_use]
    pub fn get_account(&self, address: Address) -> Account {
        for layer in self.layers.iter().rev() {
            if let Some(entry) = layer.accounts.get(&address) {
                return entry.clone().unwrap_or_default();
            }
        }
        self.accounts.get_or_default(address)
    }

    /// Writes the account at `address` into the active layer (or the base).
    pub fn put_account(&mut self, address: Address, account: Account) {
        if let Some(top) = self.layers.last_mut() {
            top.accounts.insert(address, Some(account));
        } else {
            self.accounts.put(address, account);
        }
    }

    /// Deletes the account at `address`.
    pub fn delete_account(&mut self, address: Address) {
        if let Some(top) = self.layers.last_mut() {
            top.accounts.insert(address, None);
        } else {
            self.accounts.delete(address);
        }
    }

    // =========================================================================
    // CONTRACT STORAGE
    // =========================================================================

    /// Reads a storage slot through the layer stack; absent slots are zero.
    #[must_use]
    pub fn get_storage(&self, address: Address, key: StorageKey) -> StorageValue {
        let slot = (address, key);
        for layer in self.layers.iter().rev() {
            if let Some(value) = layer.storage.get(&slot) {
                return *value;
            }
        }
        self.storage.get(&slot).copied().unwrap_or(StorageValue::ZERO)
    }

    /// Writes a storage slot. A zero value shadows lower layers while the
    /// checkpoint is open and deletes the slot once it reaches the base.
    pub fn put_storage(&mut self, address: Address, key: StorageKey, value: StorageValue) {
        if let Some(top) = self.layers.last_mut() {
            top.storage.insert((address, key), value);
        } else if value.is_zero() {
            self.storage.remove(&(address, key));
        } else {
            self.storage.insert((address, key), value);
        }
    }

    /// Number of non-zero slots in the base map (committed storage only).
    #[must_use]
    pub fn committed_slot_count(&self) -> usize {
        self.storage.len()
    }

    // =========================================================================
    // CONTRACT CODE
    // =========================================================================

    /// Reads contract code through the layer stack; absent code is empty.
    #[must_use]
    pub fn get_code(&self, address: Address) -> Bytes {
        for layer in self.layers.iter().rev() {
            if let Some(code) = layer.code.get(&address) {
                return code.clone();
            }
        }
        self.code.get(&address).cloned().unwrap_or_default()
    }

    /// Stores contract code and updates the owning account's code hash, both
    /// staged in the active layer.
    pub fn put_code(&mut self, address: Address, code: Bytes) {
        let mut account = self.get_account(address);
        account.code_hash = keccak256(code.as_slice());
        self.put_account(address, account);

        if let Some(top) = self.layers.last_mut() {
            top.code.insert(address, code);
        } else {
            self.code.insert(address, code);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::U256;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn key(n: u8) -> StorageKey {
        StorageKey::new([n; 32])
    }

    fn val(n: u64) -> StorageValue {
        StorageValue::from_u256(U256::from(n))
    }

    #[test]
    fn test_read_your_writes_in_checkpoint() {
        let mut state = StateManager::new();
        state.put_account(addr(1), Account::with_balance(U256::from(100), 0));

        let cp = state.checkpoint();
        state.put_account(addr(1), Account::with_balance(U256::from(50), 1));
        assert_eq!(state.get_account(addr(1)).balance, U256::from(50));
        assert_eq!(state.get_account(addr(1)).nonce, 1);

        state.revert(cp).unwrap();
        assert_eq!(state.get_account(addr(1)).balance, U256::from(100));
        assert_eq!(state.get_account(addr(1)).nonce, 0);
    }

    #[test]
    fn test_commit_flushes_to_base() {
        let mut state = StateManager::new();
        let cp = state.checkpoint();
        state.put_storage(addr(1), key(1), val(42));
        state.commit(cp).unwrap();

        assert_eq!(state.checkpoint_depth(), 0);
        assert_eq!(state.get_storage(addr(1), key(1)), val(42));
        assert_eq!(state.committed_slot_count(), 1);
    }

    #[test]
    fn test_nested_commit_folds_into_parent() {
        let mut state = StateManager::new();
        let outer = state.checkpoint();
        state.put_storage(addr(1), key(1), val(1));

        let inner = state.checkpoint();
        state.put_storage(addr(1), key(1), val(2));
        state.commit(inner).unwrap();

        // Inner write now lives in the outer layer, not the base.
        assert_eq!(state.get_storage(addr(1), key(1)), val(2));
        assert_eq!(state.committed_slot_count(), 0);

        state.revert(outer).unwrap();
        assert_eq!(state.get_storage(addr(1), key(1)), StorageValue::ZERO);
    }

    #[test]
    fn test_fully_reverted_nesting_leaves_state_untouched() {
        let mut state = StateManager::new();
        state.put_account(addr(1), Account::with_balance(U256::from(10), 0));
        let before = state.get_account(addr(1));

        let outer = state.checkpoint();
        state.put_account(addr(1), Account::with_balance(U256::from(20), 1));
        let inner = state.checkpoint();
        state.put_storage(addr(1), key(9), val(9));
        state.delete_account(addr(1));
        state.revert(inner).unwrap();
        state.revert(outer).unwrap();

        assert_eq!(state.get_account(addr(1)), before);
        assert_eq!(state.get_storage(addr(1), key(9)), StorageValue::ZERO);
    }

    #[test]
    fn test_out_of_order_commit_fails() {
        let mut state = StateManager::new();
        let outer = state.checkpoint();
        let _inner = state.checkpoint();

        let err = state.commit(outer).unwrap_err();
        assert!(matches!(err, StateError::CheckpointOrder { .. }));
    }

    #[test]
    fn test_out_of_order_revert_fails() {
        let mut state = StateManager::new();
        let outer = state.checkpoint();
        let inner = state.checkpoint();

        let err = state.revert(outer).unwrap_err();
        assert!(matches!(
            err,
            StateError::CheckpointOrder {
                actual: 0,
                expected: 1
            }
        ));

        // The stack is still intact; in-order teardown works.
        state.revert(inner).unwrap();
    }

    #[test]
    fn test_commit_without_checkpoint_fails() {
        let mut state = StateManager::new();
        let cp = state.checkpoint();
        state.revert(cp).unwrap();

        // Nothing open anymore: any token is an orphan.
        let orphan = Checkpoint { id: 999 };
        assert_eq!(
            state.commit(orphan).unwrap_err(),
            StateError::NoActiveCheckpoint
        );
        let orphan = Checkpoint { id: 999 };
        assert_eq!(
            state.revert(orphan).unwrap_err(),
            StateError::NoActiveCheckpoint
        );
    }

    #[test]
    fn test_zero_write_deletes_at_base() {
        let mut state = StateManager::new();
        state.put_storage(addr(1), key(1), val(5));
        assert_eq!(state.committed_slot_count(), 1);

        let cp = state.checkpoint();
        state.put_storage(addr(1), key(1), StorageValue::ZERO);
        // The zero shadows the base value while staged.
        assert_eq!(state.get_storage(addr(1), key(1)), StorageValue::ZERO);
        state.commit(cp).unwrap();

        assert_eq!(state.committed_slot_count(), 0);
        assert_eq!(state.get_storage(addr(1), key(1)), StorageValue::ZERO);
    }

    #[test]
    fn test_put_code_updates_code_hash() {
        let mut state = StateManager::new();
        let code = Bytes::from_slice(&[0x60, 0x00]);

        let cp = state.checkpoint();
        state.put_code(addr(2), code.clone());
        assert!(state.get_account(addr(2)).is_contract());
        assert_eq!(state.get_code(addr(2)), code);

        state.revert(cp).unwrap();
        assert!(!state.get_account(addr(2)).is_contract());
        assert!(state.get_code(addr(2)).is_empty());
    }

    #[test]
    fn test_deleted_account_reads_as_zero() {
        let mut state = StateManager::new();
        state.put_account(addr(3), Account::with_balance(U256::from(1), 5));

        let cp = state.checkpoint();
        state.delete_account(addr(3));
        assert_eq!(state.get_account(addr(3)), Account::default());
        state.commit(cp).unwrap();

        assert_eq!(state.get_account(addr(3)), Account::default());
    }
}
