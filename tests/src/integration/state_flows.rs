//! # State Flows
//!
//! Checkpoint discipline and transaction accounting exercised across
//! `ember-state` and `ember-evm` without the engine facade in between.

#[cfg(test)]
mod tests {
    use ember_crypto::Keypair;
    use ember_evm::prelude::*;
    use primitive_types::U256;

    fn seed() -> U256 {
        U256::from(10).pow(U256::from(20))
    }

    fn fund(state: &mut StateManager, keypair: &Keypair) {
        state.put_account(keypair.address(), Account::with_balance(seed(), 0));
    }

    // =========================================================================
    // CHECKPOINT DISCIPLINE
    // =========================================================================

    #[test]
    fn test_out_of_order_checkpoint_use_is_fatal() {
        let mut state = StateManager::new();
        let outer = state.checkpoint();
        let inner = state.checkpoint();

        // Committing or reverting a non-top checkpoint always fails.
        assert!(matches!(
            state.commit(outer).unwrap_err(),
            StateError::CheckpointOrder { .. }
        ));

        // In-order teardown still works afterwards.
        state.revert(inner).unwrap();
        assert_eq!(state.checkpoint_depth(), 1);
    }

    #[test]
    fn test_fully_reverted_nesting_is_invisible() {
        let mut state = StateManager::new();
        let address = Address::new([7u8; 20]);
        state.put_account(address, Account::with_balance(U256::from(1), 0));

        let outer = state.checkpoint();
        state.put_storage(
            address,
            StorageKey::from_u256(U256::zero()),
            StorageValue::from_u256(U256::from(9)),
        );
        let inner = state.checkpoint();
        state.put_account(address, Account::with_balance(U256::from(2), 1));
        state.revert(inner).unwrap();
        state.revert(outer).unwrap();

        assert_eq!(state.get_account(address).balance, U256::from(1));
        assert_eq!(state.get_account(address).nonce, 0);
        assert_eq!(
            state.get_storage(address, StorageKey::from_u256(U256::zero())),
            StorageValue::ZERO
        );
        assert_eq!(state.checkpoint_depth(), 0);
    }

    #[test]
    fn test_processor_leaves_no_residual_checkpoints() {
        let mut state = StateManager::new();
        let keypair = Keypair::generate();
        fund(&mut state, &keypair);
        let processor = TransactionProcessor::default();

        // A successful transaction.
        let tx = Transaction {
            nonce: 0,
            gas_price: U256::one(),
            gas_limit: 100_000,
            to: Some(Address::new([5u8; 20])),
            value: U256::from(1),
            data: Bytes::new(),
        };
        processor
            .apply(&tx.sign(&keypair).unwrap(), &mut state)
            .unwrap();
        assert_eq!(state.checkpoint_depth(), 0);

        // A reverting creation.
        let tx = Transaction {
            nonce: 1,
            gas_price: U256::one(),
            gas_limit: 100_000,
            to: None,
            value: U256::zero(),
            data: Bytes::from_slice(&[0x60, 0x00, 0x60, 0x00, 0xFD]),
        };
        let result = processor
            .apply(&tx.sign(&keypair).unwrap(), &mut state)
            .unwrap();
        assert!(result.reverted);
        assert_eq!(state.checkpoint_depth(), 0);

        // A read-only call.
        let request = CallRequest {
            caller: keypair.address(),
            to: Address::new([5u8; 20]),
            data: Bytes::new(),
            gas_limit: 100_000,
        };
        processor.call(&request, &mut state).unwrap();
        assert_eq!(state.checkpoint_depth(), 0);
    }

    // =========================================================================
    // TRANSACTION ACCOUNTING
    // =========================================================================

    #[test]
    fn test_nonce_advances_exactly_once_per_applied_transaction() {
        let mut state = StateManager::new();
        let keypair = Keypair::generate();
        fund(&mut state, &keypair);
        let processor = TransactionProcessor::default();
        let sender = keypair.address();

        for expected_nonce in 0..4u64 {
            assert_eq!(state.get_account(sender).nonce, expected_nonce);
            // Alternate success and failure; the nonce advances either way.
            let data = if expected_nonce % 2 == 0 {
                Bytes::new()
            } else {
                Bytes::from_slice(&[0x60, 0x00, 0x60, 0x00, 0xFD])
            };
            let tx = Transaction {
                nonce: expected_nonce,
                gas_price: U256::one(),
                gas_limit: 100_000,
                to: None,
                value: U256::zero(),
                data,
            };
            processor
                .apply(&tx.sign(&keypair).unwrap(), &mut state)
                .unwrap();
        }
        assert_eq!(state.get_account(sender).nonce, 4);
    }

    #[test]
    fn test_replay_is_rejected() {
        let mut state = StateManager::new();
        let keypair = Keypair::generate();
        fund(&mut state, &keypair);
        let processor = TransactionProcessor::default();

        let signed = Transaction {
            nonce: 0,
            gas_price: U256::one(),
            gas_limit: 100_000,
            to: Some(Address::new([9u8; 20])),
            value: U256::zero(),
            data: Bytes::new(),
        }
        .sign(&keypair)
        .unwrap();

        processor.apply(&signed, &mut state).unwrap();
        // Applying the same signed transaction again trips the nonce check.
        let err = processor.apply(&signed, &mut state).unwrap_err();
        assert_eq!(
            err,
            TxError::NonceMismatch {
                expected: 1,
                actual: 0
            }
        );
    }

    #[test]
    fn test_creation_address_is_reproducible_from_fresh_state() {
        // The same key and nonce produce the same contract address in two
        // unrelated state instances.
        let keypair = Keypair::from_bytes([0x11; 32]).unwrap();
        let processor = TransactionProcessor::default();
        let mut created = Vec::new();

        for _ in 0..2 {
            let mut state = StateManager::new();
            fund(&mut state, &keypair);
            let signed = Transaction {
                nonce: 0,
                gas_price: U256::one(),
                gas_limit: 3_000_000,
                to: None,
                value: U256::zero(),
                data: Bytes::from_slice(&[0x60, 0x00]),
            }
            .sign(&keypair)
            .unwrap();
            let result = processor.apply(&signed, &mut state).unwrap();
            created.push(result.created_address.unwrap());
        }

        assert_eq!(created[0], created[1]);
        assert_eq!(created[0], contract_address(keypair.address(), 0));
    }

    #[test]
    fn test_sender_address_surfaces_as_prefixed_hex() {
        let keypair = Keypair::from_bytes([0x22; 32]).unwrap();
        let rendered = keypair.address().to_string();
        assert_eq!(rendered.len(), 42);
        assert!(rendered.starts_with("0x"));
        assert!(rendered[2..].chars().all(|c| c.is_ascii_hexdigit()));
        // Round-trips through the parser.
        assert_eq!(Address::from_hex(&rendered).unwrap(), keypair.address());
    }
}
