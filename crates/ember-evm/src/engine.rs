//! # Engine Facade
//!
//! The host-facing surface: create funded test accounts, deploy contracts,
//! read them through non-mutating calls, and invoke them through signed
//! transactions.
//!
//! The engine is an explicitly constructed object owning its state; there
//! is no process-wide instance. A single async mutex serializes every
//! operation against the state manager (one queue feeding the processor),
//! which is the concurrency contract the execution core requires. The only
//! await points are this lock and observer notification; execution itself
//! never suspends.

use crate::domain::{BlockContext, ExecutionResult};
use crate::errors::EngineError;
use crate::events::{ExecutionEvent, ExecutionObserver, InvocationKind};
use crate::processor::{CallRequest, TransactionProcessor};
use crate::tx::Transaction;
use ember_crypto::Keypair;
use ember_state::StateManager;
use ember_types::{Account, Address, Bytes, U256};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument};

/// Engine configuration. The defaults match the classic sandbox setup:
/// accounts seeded with 100 ether, 3M gas for deployments, 2M for calls
/// and sends, gas price 1.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Balance given to newly created test accounts, in wei.
    pub initial_balance: U256,
    /// Default gas limit for deployments.
    pub deploy_gas_limit: u64,
    /// Default gas limit for calls and sends.
    pub call_gas_limit: u64,
    /// Default gas price.
    pub gas_price: U256,
    /// Block environment for execution.
    pub block: BlockContext,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // 100 ether.
            initial_balance: U256::from(10).pow(U256::from(20)),
            deploy_gas_limit: 3_000_000,
            call_gas_limit: 2_000_000,
            gas_price: U256::one(),
            block: BlockContext::default(),
        }
    }
}

/// Per-invocation overrides for deploy/send.
#[derive(Clone, Debug, Default)]
pub struct TxOptions {
    /// Gas limit override.
    pub gas_limit: Option<u64>,
    /// Gas price override.
    pub gas_price: Option<U256>,
    /// Value to attach, in wei.
    pub value: U256,
}

/// A generated, pre-funded account.
#[derive(Debug)]
pub struct TestAccount {
    /// The account's address.
    pub address: Address,
    /// The account's keypair, used to sign deployments and sends.
    pub keypair: Keypair,
}

/// A successful deployment.
#[derive(Clone, Debug)]
pub struct Deployment {
    /// Address of the created contract.
    pub address: Address,
    /// Full execution result of the creation transaction.
    pub result: ExecutionResult,
}

/// The execution engine.
pub struct Engine {
    config: EngineConfig,
    state: Mutex<StateManager>,
    processor: TransactionProcessor,
    observers: RwLock<Vec<Arc<dyn ExecutionObserver>>>,
}

impl Engine {
    /// Creates an engine with empty state.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let processor = TransactionProcessor::new(config.block.clone());
        Self {
            config,
            state: Mutex::new(StateManager::new()),
            processor,
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Registers an observer for execution events.
    pub async fn subscribe(&self, observer: Arc<dyn ExecutionObserver>) {
        self.observers.write().await.push(observer);
    }

    /// Generates a keypair and funds its address with the configured
    /// initial balance.
    pub async fn create_account(&self) -> TestAccount {
        let keypair = Keypair::generate();
        let address = keypair.address();
        self.state
            .lock()
            .await
            .put_account(address, Account::with_balance(self.config.initial_balance, 0));
        info!(%address, balance = %self.config.initial_balance, "test account created");
        TestAccount { address, keypair }
    }

    /// Balance of `address`.
    pub async fn balance_of(&self, address: Address) -> U256 {
        self.state.lock().await.get_account(address).balance
    }

    /// Nonce of `address`.
    pub async fn nonce_of(&self, address: Address) -> u64 {
        self.state.lock().await.get_account(address).nonce
    }

    /// Deploys a contract. `init_code` is the full creation payload (init
    /// code with any constructor arguments already appended).
    ///
    /// # Errors
    ///
    /// Validation failures as `EngineError::Tx`, reverted deployments as
    /// `EngineError::Reverted`.
    #[instrument(skip(self, signer, init_code), fields(from = %signer.address()))]
    pub async fn deploy(
        &self,
        signer: &Keypair,
        init_code: &[u8],
        options: TxOptions,
    ) -> Result<Deployment, EngineError> {
        let from = signer.address();
        let data = Bytes::from_slice(init_code);

        let outcome = {
            let mut state = self.state.lock().await;
            let tx = Transaction {
                nonce: state.get_account(from).nonce,
                gas_price: options.gas_price.unwrap_or(self.config.gas_price),
                gas_limit: options.gas_limit.unwrap_or(self.config.deploy_gas_limit),
                to: None,
                value: options.value,
                data: data.clone(),
            };
            let signed = tx.sign(signer)?;
            self.processor.apply(&signed, &mut state)
        };

        let (success, gas_used) = match &outcome {
            Ok(result) => (result.is_success(), result.gas_used),
            Err(_) => (false, 0),
        };
        self.notify(ExecutionEvent::new(
            InvocationKind::Deployment,
            from,
            None,
            data,
            success,
            gas_used,
        ))
        .await;

        let result = outcome?;
        if result.reverted {
            return Err(EngineError::Reverted {
                gas_used: result.gas_used,
                return_data: result.return_data,
            });
        }
        let address = result
            .created_address
            .expect("successful creation always yields an address");
        info!(contract = %address, gas_used = result.gas_used, "contract deployed");
        Ok(Deployment { address, result })
    }

    /// Reads a contract through a non-mutating call. All staged effects are
    /// discarded regardless of outcome.
    ///
    /// # Errors
    ///
    /// Reverted calls as `EngineError::Reverted`.
    #[instrument(skip(self, calldata), fields(%caller, %contract))]
    pub async fn call(
        &self,
        caller: Address,
        contract: Address,
        calldata: &[u8],
    ) -> Result<ExecutionResult, EngineError> {
        let data = Bytes::from_slice(calldata);
        let request = CallRequest {
            caller,
            to: contract,
            data: data.clone(),
            gas_limit: self.config.call_gas_limit,
        };

        let outcome = {
            let mut state = self.state.lock().await;
            self.processor.call(&request, &mut state)
        };

        let (success, gas_used) = match &outcome {
            Ok(result) => (result.is_success(), result.gas_used),
            Err(_) => (false, 0),
        };
        self.notify(ExecutionEvent::new(
            InvocationKind::Call,
            caller,
            Some(contract),
            data,
            success,
            gas_used,
        ))
        .await;

        let result = outcome?;
        if result.reverted {
            return Err(EngineError::Reverted {
                gas_used: result.gas_used,
                return_data: result.return_data,
            });
        }
        Ok(result)
    }

    /// Invokes a contract through a signed transaction.
    ///
    /// # Errors
    ///
    /// Validation failures as `EngineError::Tx`, reverted executions as
    /// `EngineError::Reverted`.
    #[instrument(skip(self, signer, calldata), fields(from = %signer.address(), %contract))]
    pub async fn send(
        &self,
        signer: &Keypair,
        contract: Address,
        calldata: &[u8],
        options: TxOptions,
    ) -> Result<ExecutionResult, EngineError> {
        let from = signer.address();
        let data = Bytes::from_slice(calldata);

        let outcome = {
            let mut state = self.state.lock().await;
            let tx = Transaction {
                nonce: state.get_account(from).nonce,
                gas_price: options.gas_price.unwrap_or(self.config.gas_price),
                gas_limit: options.gas_limit.unwrap_or(self.config.call_gas_limit),
                to: Some(contract),
                value: options.value,
                data: data.clone(),
            };
            let signed = tx.sign(signer)?;
            self.processor.apply(&signed, &mut state)
        };

        let (success, gas_used) = match &outcome {
            Ok(result) => (result.is_success(), result.gas_used),
            Err(_) => (false, 0),
        };
        self.notify(ExecutionEvent::new(
            InvocationKind::Transaction,
            from,
            Some(contract),
            data,
            success,
            gas_used,
        ))
        .await;

        let result = outcome?;
        if result.reverted {
            return Err(EngineError::Reverted {
                gas_used: result.gas_used,
                return_data: result.return_data,
            });
        }
        Ok(result)
    }

    async fn notify(&self, event: ExecutionEvent) {
        let observers = self.observers.read().await;
        for observer in observers.iter() {
            observer.on_execution(&event).await;
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

// =============================================================================
// TESTS
// =============================================================================
