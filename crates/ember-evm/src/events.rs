//! # Execution Events
//!
//! Observability side channel: after every call, deployment, or
//! transaction, success or failure, the engine hands an event describing
//! {from, to, data} to each registered observer. This is tooling surface
//! only; it is not part of the transactional semantics and observers run
//! outside the state lock.

use async_trait::async_trait;
use ember_types::{Address, Bytes};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// What kind of invocation produced an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationKind {
    /// Read-only contract call.
    Call,
    /// Contract deployment.
    Deployment,
    /// State-mutating transaction.
    Transaction,
}

/// One observed invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionEvent {
    /// Correlation id for tooling.
    pub id: Uuid,
    /// Invocation kind.
    pub kind: InvocationKind,
    /// Caller or transaction sender.
    pub from: Address,
    /// Target contract; `None` for deployments.
    pub to: Option<Address>,
    /// Calldata or init code.
    pub data: Bytes,
    /// Whether execution succeeded.
    pub success: bool,
    /// Gas charged.
    pub gas_used: u64,
}

impl ExecutionEvent {
    /// Creates an event with a fresh correlation id.
    #[must_use]
    pub fn new(
        kind: InvocationKind,
        from: Address,
        to: Option<Address>,
        data: Bytes,
        success: bool,
        gas_used: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            from,
            to,
            data,
            success,
            gas_used,
        }
    }
}

/// Receives execution events from the engine.
#[async_trait]
pub trait ExecutionObserver: Send + Sync {
    /// Called once per invocation, after execution completes.
    async fn on_execution(&self, event: &ExecutionEvent);
}

/// Observer that emits one structured log line per invocation.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

#[async_trait]
impl ExecutionObserver for TracingObserver {
    async fn on_execution(&self, event: &ExecutionEvent) {
        info!(
            id = %event.id,
            kind = ?event.kind,
            from = %event.from,
            to = ?event.to,
            data = ?event.data,
            success = event.success,
            gas_used = event.gas_used,
            "execution observed"
        );
    }
}

/// Observer that forwards events into an unbounded channel, for tests and
/// tooling that want to consume them elsewhere.
#[derive(Debug)]
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelObserver {
    /// Creates the observer and the receiving end of its channel.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl ExecutionObserver for ChannelObserver {
    async fn on_execution(&self, event: &ExecutionEvent) {
        // A dropped receiver just means nobody is listening anymore.
        let _ = self.sender.send(event.clone());
    }
}

// =============================================================================
// TESTS
// =============================================================================
