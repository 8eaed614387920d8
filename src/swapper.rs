use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::types::{NextStep, Order, SwapAction, SwapError, SwapOutput};

/// Performs the on-chain steps of a swap (sign + broadcast).
///
/// Each call must perform exactly one action. Implementations live outside this crate
/// except for [`DryRunExecutor`].
#[async_trait]
pub trait SwapExecutor: Send + Sync {
    async fn initiate(&self, order: &Order) -> Result<String, SwapError>;
    async fn redeem(&self, order: &Order) -> Result<String, SwapError>;
    async fn refund(&self, order: &Order) -> Result<String, SwapError>;
}

/// Swap state for one order, as returned by `get_swap`
pub struct Swap {
    order: Order,
    executor: Arc<dyn SwapExecutor>,
}

impl Swap {
    pub fn new(order: Order, executor: Arc<dyn SwapExecutor>) -> Self {
        Self { order, executor }
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    /// Perform the single on-chain action for `step`
    pub async fn next(&self, step: NextStep) -> Result<SwapOutput, SwapError> {
        let order = &self.order;
        let (action, result) = match step {
            NextStep::Initiate => (SwapAction::Initiate, self.executor.initiate(order).await),
            NextStep::Redeem => (SwapAction::Redeem, self.executor.redeem(order).await),
            NextStep::Refund => (SwapAction::Refund, self.executor.refund(order).await),
            NextStep::None => {
                return Err(SwapError::ActionExecution(format!(
                    "order {} has no pending action ({})",
                    order.id, order.status
                )));
            }
        };

        match result {
            Ok(tx_hash) => {
                info!(
                    order_id = %order.id,
                    "Completed Action {} with transaction hash: {}",
                    action, tx_hash
                );
                Ok(SwapOutput::new(action, tx_hash))
            }
            Err(e) => {
                warn!(order_id = %order.id, %action, error = %e, "Swap action failed");
                Err(match e {
                    SwapError::ActionExecution(msg) => SwapError::ActionExecution(msg),
                    other => SwapError::ActionExecution(format!("{action}: {other}")),
                })
            }
        }
    }
}

impl std::fmt::Debug for Swap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Swap").field("order", &self.order).finish()
    }
}

/// Executor that signs nothing: it logs the step and reports a deterministic pseudo hash.
#[derive(Debug, Default, Clone)]
pub struct DryRunExecutor;

impl DryRunExecutor {
    pub fn tx_hash(order: &Order, action: SwapAction) -> String {
        let mut hasher = Sha256::new();
        hasher.update(order.id.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(action.to_string().as_bytes());
        format!("0x{}", hex::encode(hasher.finalize()))
    }

    fn simulate(&self, order: &Order, action: SwapAction) -> String {
        let tx_hash = Self::tx_hash(order, action);
        info!(order_id = %order.id, %action, "Dry run: not broadcasting");
        tx_hash
    }
}

#[async_trait]
impl SwapExecutor for DryRunExecutor {
    async fn initiate(&self, order: &Order) -> Result<String, SwapError> {
        Ok(self.simulate(order, SwapAction::Initiate))
    }

    async fn redeem(&self, order: &Order) -> Result<String, SwapError> {
        Ok(self.simulate(order, SwapAction::Redeem))
    }

    async fn refund(&self, order: &Order) -> Result<String, SwapError> {
        Ok(self.simulate(order, SwapAction::Refund))
    }
}
