//! # Transaction Processor
//!
//! Applies signed transactions against a state manager: upfront validation,
//! gas deduction, interpreter dispatch, and commit-or-revert of the
//! execution checkpoint. Also hosts the read-only call path, which wraps
//! execution in a checkpoint that is always reverted.
//!
//! The gas deduction and nonce bump deliberately happen *before* the
//! checkpoint is opened: a failed execution rolls back everything the
//! contract did, but the sender still pays for the gas and burns the nonce.

use crate::domain::{contract_address, BlockContext, CallContext, ExecutionResult};
use crate::errors::TxError;
use crate::evm::gas::intrinsic_gas;
use crate::evm::Interpreter;
use crate::tx::SignedTransaction;
use ember_state::StateManager;
use ember_types::{Address, Bytes, U256};
use tracing::debug;

/// Parameters of a read-only contract call.
#[derive(Clone, Debug)]
pub struct CallRequest {
    /// Account the call is attributed to.
    pub caller: Address,
    /// Contract to execute.
    pub to: Address,
    /// Calldata.
    pub data: Bytes,
    /// Gas budget.
    pub gas_limit: u64,
}

/// Applies transactions and read-only calls against a [`StateManager`].
#[derive(Clone, Debug, Default)]
pub struct TransactionProcessor {
    block: BlockContext,
}

impl TransactionProcessor {
    /// Creates a processor executing under the given block environment.
    #[must_use]
    pub fn new(block: BlockContext) -> Self {
        Self { block }
    }

    /// Applies a signed transaction.
    ///
    /// Validation failures (signature, nonce, balance, intrinsic gas) are
    /// returned as errors and leave state byte-for-byte unchanged. An
    /// execution failure returns `Ok` with a reverted result: the contract's
    /// effects are rolled back, the full gas limit is charged, and the
    /// sender's nonce increment survives.
    ///
    /// # Errors
    ///
    /// `TxError` for validation failures; `TxError::State` only on
    /// checkpoint misuse, which is a fatal bug.
    pub fn apply(
        &self,
        tx: &SignedTransaction,
        state: &mut StateManager,
    ) -> Result<ExecutionResult, TxError> {
        let sender = tx
            .recover_sender()
            .map_err(|_| TxError::InvalidSignature)?;
        let payload = &tx.payload;

        let account = state.get_account(sender);
        if payload.nonce != account.nonce {
            return Err(TxError::NonceMismatch {
                expected: account.nonce,
                actual: payload.nonce,
            });
        }

        let gas_cost = U256::from(payload.gas_limit) * payload.gas_price;
        let upfront = gas_cost + payload.value;
        if account.balance < upfront {
            return Err(TxError::InsufficientBalance {
                required: upfront,
                available: account.balance,
            });
        }

        let intrinsic = intrinsic_gas(payload.data.as_slice(), payload.is_creation());
        if payload.gas_limit < intrinsic {
            return Err(TxError::IntrinsicGas {
                gas_limit: payload.gas_limit,
                required: intrinsic,
            });
        }

        // Charge gas and burn the nonce outside the checkpoint; these
        // survive an execution failure.
        let mut sender_account = account;
        sender_account.balance = sender_account.balance - gas_cost;
        sender_account.nonce += 1;
        state.put_account(sender, sender_account);

        let checkpoint = state.checkpoint();
        let execution_gas = payload.gas_limit - intrinsic;

        let (mut result, recipient) = if let Some(to) = payload.to {
            let code = state.get_code(to);
            let context = CallContext {
                caller: sender,
                origin: sender,
                address: to,
                value: payload.value,
                data: payload.data.clone(),
                gas_limit: execution_gas,
                gas_price: payload.gas_price,
                block: self.block.clone(),
            };
            let result = Interpreter::new(context, code.as_slice(), state).run();
            (result, to)
        } else {
            let created = contract_address(sender, payload.nonce);
            let context = CallContext {
                caller: sender,
                origin: sender,
                address: created,
                value: payload.value,
                data: Bytes::new(),
                gas_limit: execution_gas,
                gas_price: payload.gas_price,
                block: self.block.clone(),
            };
            let mut result = Interpreter::new(context, payload.data.as_slice(), state).run();
            if !result.reverted {
                // The init code's output becomes the contract's code.
                state.put_code(created, result.return_data.clone());
                result.created_address = Some(created);
            }
            (result, created)
        };

        if result.reverted {
            state.revert(checkpoint)?;
            debug!(
                tx = %tx.hash(),
                halt = ?result.halt,
                "transaction execution failed, checkpoint reverted"
            );
            // No refund on failure: the whole gas budget is charged.
            result.gas_used = payload.gas_limit;
            result.created_address = None;
            result.logs.clear();
            return Ok(result);
        }

        state.commit(checkpoint)?;

        result.gas_used += intrinsic;
        let refund = U256::from(payload.gas_limit - result.gas_used) * payload.gas_price;

        // Refund unused gas and move the value; the upfront check covered
        // both, so neither subtraction can underflow.
        let mut sender_account = state.get_account(sender);
        sender_account.balance = sender_account.balance + refund - payload.value;
        state.put_account(sender, sender_account);

        if !payload.value.is_zero() {
            let mut recipient_account = state.get_account(recipient);
            recipient_account.balance = recipient_account.balance + payload.value;
            state.put_account(recipient, recipient_account);
        }

        debug!(
            tx = %tx.hash(),
            gas_used = result.gas_used,
            created = ?result.created_address,
            logs = result.logs.len(),
            "transaction applied"
        );
        Ok(result)
    }

    /// Executes a read-only call: checkpoint, run, always revert. Never
    /// commits, so residual state is impossible regardless of outcome.
    ///
    /// A target with no code short-circuits through the interpreter's
    /// empty-code rule: immediate implicit success with empty return data.
    ///
    /// # Errors
    ///
    /// `TxError::State` only on checkpoint misuse, which is a fatal bug.
    pub fn call(
        &self,
        request: &CallRequest,
        state: &mut StateManager,
    ) -> Result<ExecutionResult, TxError> {
        let checkpoint = state.checkpoint();
        let code = state.get_code(request.to);
        let context = CallContext {
            caller: request.caller,
            origin: request.caller,
            address: request.to,
            value: U256::zero(),
            data: request.data.clone(),
            gas_limit: request.gas_limit,
            gas_price: U256::zero(),
            block: self.block.clone(),
        };
        let result = Interpreter::new(context, code.as_slice(), state).run();
        state.revert(checkpoint)?;
        Ok(result)
    }
}

// =============================================================================
// TESTS
// =============================================================================
