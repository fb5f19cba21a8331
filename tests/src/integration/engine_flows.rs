//! # Engine Flows
//!
//! End-to-end flows through the engine facade: account creation, contract
//! deployment, reads via non-mutating calls, sends via signed transactions,
//! and observer delivery.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ember_evm::prelude::*;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    /// Runtime for a counter contract: any invocation loads slot 0, adds
    /// one, stores it back, and returns the new value.
    ///
    /// ```text
    /// PUSH1 0, SLOAD, PUSH1 1, ADD, PUSH1 0, SSTORE,
    /// PUSH1 0, SLOAD, PUSH1 0, MSTORE, PUSH1 32, PUSH1 0, RETURN
    /// ```
    const COUNTER_RUNTIME: [u8; 20] = [
        0x60, 0x00, 0x54, 0x60, 0x01, 0x01, 0x60, 0x00, 0x55, 0x60, 0x00, 0x54, 0x60, 0x00, 0x52,
        0x60, 0x20, 0x60, 0x00, 0xF3,
    ];

    /// Runtime that reverts unconditionally with empty data.
    const REVERT_RUNTIME: [u8; 5] = [0x60, 0x00, 0x60, 0x00, 0xFD];

    /// Wraps a runtime in init code that CODECOPYs it into memory and
    /// returns it (the standard deployment preamble).
    fn init_code_for(runtime: &[u8]) -> Vec<u8> {
        let len = u8::try_from(runtime.len()).expect("fixture runtimes are tiny");
        let mut init = vec![
            0x60, len, // size
            0x60, 0x0C, // offset of the runtime inside the init code
            0x60, 0x00, // destination
            0x39, // CODECOPY
            0x60, len, // size
            0x60, 0x00, // offset
            0xF3, // RETURN
        ];
        init.extend_from_slice(runtime);
        init
    }

    fn returned_u256(result: &ExecutionResult) -> U256 {
        U256::from_big_endian(result.return_data.as_slice())
    }

    // =========================================================================
    // DEPLOYMENT
    // =========================================================================

    /// The canonical sandbox scenario: a fresh account with 10^20 wei and
    /// nonce 0 deploys bytecode `0x6000` at gas limit 3M and gas price 1.
    #[tokio::test]
    async fn test_trivial_deploy_scenario() {
        let engine = Engine::default();
        let account = engine.create_account().await;
        let balance_before = engine.balance_of(account.address).await;
        assert_eq!(balance_before, U256::from(10).pow(U256::from(20)));

        let deployment = engine
            .deploy(&account.keypair, &[0x60, 0x00], TxOptions::default())
            .await
            .expect("trivial deployment succeeds");

        // The created address is the hash-derived function of
        // (sender, nonce-before-increment).
        assert_eq!(deployment.address, contract_address(account.address, 0));
        assert_eq!(engine.nonce_of(account.address).await, 1);

        // Balance decreased by gas_used * gas_price(=1) and nothing else.
        let balance_after = engine.balance_of(account.address).await;
        assert_eq!(
            balance_before - balance_after,
            U256::from(deployment.result.gas_used)
        );
    }

    #[tokio::test]
    async fn test_deployed_runtime_code_is_stored() {
        let engine = Engine::default();
        let account = engine.create_account().await;

        let deployment = engine
            .deploy(
                &account.keypair,
                &init_code_for(&COUNTER_RUNTIME),
                TxOptions::default(),
            )
            .await
            .unwrap();

        // The runtime is observable through a call: counter starts at 1.
        let result = engine
            .call(account.address, deployment.address, &[])
            .await
            .unwrap();
        assert_eq!(returned_u256(&result), U256::one());
    }

    // =========================================================================
    // SEND / CALL ROUND TRIP
    // =========================================================================

    #[tokio::test]
    async fn test_counter_send_and_call_round_trip() {
        let engine = Engine::default();
        let account = engine.create_account().await;

        let contract = engine
            .deploy(
                &account.keypair,
                &init_code_for(&COUNTER_RUNTIME),
                TxOptions::default(),
            )
            .await
            .unwrap()
            .address;

        // First send commits count = 1.
        let result = engine
            .send(&account.keypair, contract, &[], TxOptions::default())
            .await
            .unwrap();
        assert_eq!(returned_u256(&result), U256::one());

        // A read call sees the committed 1 and returns 2, but its own
        // increment is discarded.
        let read = engine.call(account.address, contract, &[]).await.unwrap();
        assert_eq!(returned_u256(&read), U256::from(2));

        let read_again = engine.call(account.address, contract, &[]).await.unwrap();
        assert_eq!(returned_u256(&read_again), U256::from(2));

        // Second send commits count = 2; reads now return 3.
        engine
            .send(&account.keypair, contract, &[], TxOptions::default())
            .await
            .unwrap();
        let read = engine.call(account.address, contract, &[]).await.unwrap();
        assert_eq!(returned_u256(&read), U256::from(3));
    }

    #[tokio::test]
    async fn test_read_calls_cost_nothing_and_burn_no_nonce() {
        let engine = Engine::default();
        let account = engine.create_account().await;

        let contract = engine
            .deploy(
                &account.keypair,
                &init_code_for(&COUNTER_RUNTIME),
                TxOptions::default(),
            )
            .await
            .unwrap()
            .address;

        let balance = engine.balance_of(account.address).await;
        let nonce = engine.nonce_of(account.address).await;

        for _ in 0..5 {
            engine.call(account.address, contract, &[]).await.unwrap();
        }

        assert_eq!(engine.balance_of(account.address).await, balance);
        assert_eq!(engine.nonce_of(account.address).await, nonce);
    }

    #[tokio::test]
    async fn test_call_to_nonexistent_contract_is_implicit_success() {
        let engine = Engine::default();
        let account = engine.create_account().await;
        let nowhere = Address::new([0xAB; 20]);

        let calldata = hex::decode("deadbeef").unwrap();
        let result = engine
            .call(account.address, nowhere, &calldata)
            .await
            .expect("empty code means implicit success, not a revert");
        assert!(result.return_data.is_empty());
        assert_eq!(result.gas_used, 0);
    }

    #[tokio::test]
    async fn test_value_transfer_to_plain_account() {
        let engine = Engine::default();
        let alice = engine.create_account().await;
        let bob = engine.create_account().await;
        let bob_before = engine.balance_of(bob.address).await;

        let options = TxOptions {
            value: U256::from(1_000_000u64),
            ..TxOptions::default()
        };
        engine
            .send(&alice.keypair, bob.address, &[], options)
            .await
            .unwrap();

        assert_eq!(
            engine.balance_of(bob.address).await,
            bob_before + U256::from(1_000_000u64)
        );
    }

    // =========================================================================
    // FAILURE ACCOUNTING
    // =========================================================================

    #[tokio::test]
    async fn test_reverting_send_charges_full_gas_limit() {
        let engine = Engine::default();
        let account = engine.create_account().await;

        let contract = engine
            .deploy(
                &account.keypair,
                &init_code_for(&REVERT_RUNTIME),
                TxOptions::default(),
            )
            .await
            .unwrap()
            .address;

        let balance_before = engine.balance_of(account.address).await;
        let options = TxOptions {
            gas_limit: Some(100_000),
            ..TxOptions::default()
        };
        let err = engine
            .send(&account.keypair, contract, &[], options)
            .await
            .unwrap_err();

        match err {
            EngineError::Reverted { gas_used, .. } => assert_eq!(gas_used, 100_000),
            other => panic!("expected Reverted, got {other:?}"),
        }

        // Full gas limit charged, no refund; nonce burned.
        assert_eq!(
            balance_before - engine.balance_of(account.address).await,
            U256::from(100_000)
        );
        assert_eq!(engine.nonce_of(account.address).await, 2);
    }

    #[tokio::test]
    async fn test_validation_failure_burns_nothing() {
        let engine = Engine::default();
        let account = engine.create_account().await;
        let balance = engine.balance_of(account.address).await;

        // Unfunded signer: upfront validation fails, nothing changes.
        let stranger = Keypair::generate();
        let err = engine
            .send(&stranger, account.address, &[], TxOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Tx(TxError::InsufficientBalance { .. })
        ));

        assert_eq!(engine.balance_of(account.address).await, balance);
        assert_eq!(engine.nonce_of(stranger.address()).await, 0);
    }

    // =========================================================================
    // OBSERVABILITY
    // =========================================================================

    #[tokio::test]
    async fn test_observer_receives_one_event_per_invocation() {
        let engine = Engine::default();
        let (observer, mut events) = ChannelObserver::channel();
        engine.subscribe(Arc::new(observer)).await;

        let account = engine.create_account().await;
        let init = init_code_for(&COUNTER_RUNTIME);

        let contract = engine
            .deploy(&account.keypair, &init, TxOptions::default())
            .await
            .unwrap()
            .address;
        engine
            .send(&account.keypair, contract, &[0x01], TxOptions::default())
            .await
            .unwrap();
        engine
            .call(account.address, contract, &[0x02])
            .await
            .unwrap();

        let deploy_event = events.recv().await.unwrap();
        assert_eq!(deploy_event.kind, InvocationKind::Deployment);
        assert_eq!(deploy_event.from, account.address);
        assert_eq!(deploy_event.to, None);
        assert_eq!(deploy_event.data.as_slice(), init.as_slice());
        assert!(deploy_event.success);

        let send_event = events.recv().await.unwrap();
        assert_eq!(send_event.kind, InvocationKind::Transaction);
        assert_eq!(send_event.to, Some(contract));
        assert_eq!(send_event.data.as_slice(), &[0x01]);

        let call_event = events.recv().await.unwrap();
        assert_eq!(call_event.kind, InvocationKind::Call);
        assert_eq!(call_event.to, Some(contract));
        assert_eq!(call_event.data.as_slice(), &[0x02]);

        // Each event carries a distinct correlation id.
        assert_ne!(deploy_event.id, send_event.id);
        assert_ne!(send_event.id, call_event.id);
    }

    #[tokio::test]
    async fn test_observer_receives_reverted_invocations() {
        let engine = Engine::default();
        let (observer, mut events) = ChannelObserver::channel();
        engine.subscribe(Arc::new(observer)).await;

        let account = engine.create_account().await;
        let contract = engine
            .deploy(
                &account.keypair,
                &init_code_for(&REVERT_RUNTIME),
                TxOptions::default(),
            )
            .await
            .unwrap()
            .address;
        let _ = events.recv().await.unwrap(); // the deployment event

        let _ = engine
            .call(account.address, contract, &[])
            .await
            .unwrap_err();

        let event = events.recv().await.unwrap();
        assert_eq!(event.kind, InvocationKind::Call);
        assert!(!event.success);
    }
}
