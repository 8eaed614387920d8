//! Client-side swap orchestration.
//!
//! ```text
//! submit ──► OrderbookClient::create_order ──► OrderId
//!
//! watch ──► subscribe(address) ──► batches ──► OrderWatcher::on_orders
//!                                                  │ classify(status)
//!                                                  ▼
//!                                       Swap::next(step) ──► SwapExecutor
//! ```
//!
//! One watcher task per order handles batches sequentially, so two signing calls for
//! the same order never overlap. Each actionable status is driven at most once.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::orderbook::{self, OrderFeed, OrderbookClient};
use crate::retry::RetryConfig;
use crate::swapper::{Swap, SwapExecutor};
use crate::types::{
    Action, Asset, FeeRate, NextStep, Order, OrderId, OrderStatus, SwapAction, SwapError,
    SwapOutput, SwapRequest,
};
use crate::wallet::WalletAdapter;

#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub poll_interval: Duration,
    pub retry: RetryConfig,
    /// Drive the refund step on expiry instead of only reporting it
    pub auto_refund: bool,
    pub event_buffer: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            retry: RetryConfig::default(),
            auto_refund: false,
            event_buffer: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SwapEvent {
    StatusChanged {
        order_id: OrderId,
        status: OrderStatus,
        action: Action,
    },
    ActionCompleted(SwapOutput),
    ActionFailed {
        action: SwapAction,
        error: SwapError,
    },
    /// The order expired and needs a refund that this watcher will not send itself
    RefundRequired(OrderId),
    FeedError(SwapError),
    Finished(Action),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    Finished(Action),
    Cancelled,
}

pub struct SwapOrchestrator {
    orderbook: Arc<dyn OrderbookClient>,
    executor: Arc<dyn SwapExecutor>,
    bitcoin: Arc<dyn WalletAdapter>,
    evm: Arc<dyn WalletAdapter>,
    watch_config: WatchConfig,
}

impl SwapOrchestrator {
    pub fn new(
        orderbook: Arc<dyn OrderbookClient>,
        executor: Arc<dyn SwapExecutor>,
        bitcoin: Arc<dyn WalletAdapter>,
        evm: Arc<dyn WalletAdapter>,
        watch_config: WatchConfig,
    ) -> Self {
        Self {
            orderbook,
            executor,
            bitcoin,
            evm,
            watch_config,
        }
    }

    pub fn bitcoin_wallet(&self) -> &Arc<dyn WalletAdapter> {
        &self.bitcoin
    }

    pub fn evm_wallet(&self) -> &Arc<dyn WalletAdapter> {
        &self.evm
    }

    /// Register a swap intent with the orderbook.
    ///
    /// Both wallets must be connected and each asset must sit on one of their chains.
    /// Orderbook failures are returned as-is, never retried.
    pub async fn submit(
        &self,
        from: Asset,
        to: Asset,
        send_amount: u64,
        fee_rate: FeeRate,
    ) -> Result<OrderId, SwapError> {
        for wallet in [&self.bitcoin, &self.evm] {
            if !wallet.is_connected() {
                return Err(SwapError::WalletNotConnected {
                    chain: wallet.chain(),
                });
            }
        }

        let wallet_chains = [self.bitcoin.chain(), self.evm.chain()];
        for asset in [&from, &to] {
            if !wallet_chains.contains(&asset.chain) {
                return Err(SwapError::WalletNotConnected { chain: asset.chain });
            }
        }

        let request = SwapRequest::quote(from, to, send_amount, fee_rate)?;
        info!(
            "Submitting swap {} -> {}: send {} receive {}",
            request.source_asset, request.destination_asset, request.send_amount, request.receive_amount
        );

        let order_id = self
            .orderbook
            .create_order(&request)
            .await
            .map_err(|e| match e {
                SwapError::OrderSubmission(msg) => SwapError::OrderSubmission(msg),
                other => SwapError::OrderSubmission(other.to_string()),
            })?;

        info!("Swap initiated with orderId: {}", order_id);
        Ok(order_id)
    }

    pub fn get_swap(&self, order: Order) -> Swap {
        Swap::new(order, self.executor.clone())
    }

    /// Address the order feed is keyed by: the EVM side's connected address
    pub fn observer_address(&self) -> Result<String, SwapError> {
        self.evm
            .connection()
            .map(|connection| connection.address)
            .ok_or(SwapError::WalletNotConnected {
                chain: self.evm.chain(),
            })
    }

    /// Follow `order_id` in the feed for `observer_address` and drive each actionable step.
    ///
    /// Must be called inside a tokio runtime. Dropping the returned handle cancels the watch.
    pub fn watch(&self, order_id: OrderId, observer_address: String) -> SwapSubscription {
        let feed = orderbook::subscribe(
            self.orderbook.clone(),
            observer_address,
            self.watch_config.poll_interval,
            self.watch_config.retry.clone(),
        );
        let watcher = OrderWatcher::new(
            order_id.clone(),
            self.executor.clone(),
            self.watch_config.auto_refund,
        );

        let (events_tx, events_rx) = mpsc::channel(self.watch_config.event_buffer.max(1));
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(watcher.run(feed, events_tx, cancel_rx));

        SwapSubscription {
            order_id,
            events: events_rx,
            cancel: cancel_tx,
            handle,
        }
    }
}

/// Handle to a running watch
pub struct SwapSubscription {
    order_id: OrderId,
    events: mpsc::Receiver<SwapEvent>,
    cancel: watch::Sender<bool>,
    handle: JoinHandle<Result<WatchOutcome, SwapError>>,
}

impl SwapSubscription {
    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// Next event, or `None` once the watch has ended and all events were read
    pub async fn next_event(&mut self) -> Option<SwapEvent> {
        self.events.recv().await
    }

    /// Stop watching. An action already being signed is allowed to finish.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    pub async fn join(self) -> Result<WatchOutcome, SwapError> {
        let SwapSubscription {
            handle,
            events,
            cancel: _cancel,
            ..
        } = self;
        // unread events must not hold the task on a full channel
        drop(events);
        handle
            .await
            .map_err(|e| SwapError::Feed(format!("watch task failed: {e}")))?
    }
}

impl std::fmt::Debug for SwapSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapSubscription")
            .field("order_id", &self.order_id)
            .finish()
    }
}

/// Reacts to order batches for a single order.
///
/// Each actionable [`Action`] is driven at most once for the life of the watcher. If the
/// order later returns to an action it already took (e.g. matched again), that step is not
/// repeated; start a new watch to drive it.
pub struct OrderWatcher {
    order_id: OrderId,
    executor: Arc<dyn SwapExecutor>,
    auto_refund: bool,
    last_status: Option<OrderStatus>,
    handled: HashSet<Action>,
}

impl OrderWatcher {
    pub fn new(order_id: OrderId, executor: Arc<dyn SwapExecutor>, auto_refund: bool) -> Self {
        Self {
            order_id,
            executor,
            auto_refund,
            last_status: None,
            handled: HashSet::new(),
        }
    }

    pub fn last_status(&self) -> Option<OrderStatus> {
        self.last_status
    }

    /// Handle one batch. A batch without our order is a no-op.
    pub async fn on_orders(&mut self, orders: &[Order]) -> Vec<SwapEvent> {
        let Some(order) = orders.iter().find(|order| order.id == self.order_id) else {
            debug!(order_id = %self.order_id, "Order not in feed yet");
            return Vec::new();
        };

        let mut events = Vec::new();
        let action = order.action();

        if self.last_status != Some(order.status) {
            info!(order_id = %order.id, status = %order.status, %action, "Order status changed");
            self.last_status = Some(order.status);
            events.push(SwapEvent::StatusChanged {
                order_id: order.id.clone(),
                status: order.status,
                action,
            });
        }

        if action.is_terminal() {
            events.push(SwapEvent::Finished(action));
            return events;
        }

        let step = action.next_step();
        if step == NextStep::None {
            return events;
        }

        if !self.handled.insert(action) {
            debug!(order_id = %order.id, %action, "Action already handled");
            return events;
        }

        if step == NextStep::Refund && !self.auto_refund {
            warn!(order_id = %order.id, "Order expired; refund required");
            events.push(SwapEvent::RefundRequired(order.id.clone()));
            return events;
        }

        let swap = Swap::new(order.clone(), self.executor.clone());
        match swap.next(step).await {
            Ok(output) => events.push(SwapEvent::ActionCompleted(output)),
            Err(e) => {
                error!(order_id = %order.id, error = %e, "Not retrying failed swap action");
                if let Some(action) = step.swap_action() {
                    events.push(SwapEvent::ActionFailed { action, error: e });
                }
            }
        }

        events
    }

    async fn run(
        mut self,
        mut feed: OrderFeed,
        events: mpsc::Sender<SwapEvent>,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<WatchOutcome, SwapError> {
        info!(order_id = %self.order_id, "Watching order");

        loop {
            let batch = tokio::select! {
                biased;
                _ = cancel.changed() => return Ok(self.cancelled()),
                batch = feed.next() => batch,
            };

            let outgoing = match batch {
                None => {
                    return Err(SwapError::Feed("order feed closed".to_string()));
                }
                Some(Err(e)) => {
                    warn!(order_id = %self.order_id, error = %e, "Order feed error");
                    vec![SwapEvent::FeedError(e)]
                }
                Some(Ok(orders)) => self.on_orders(&orders).await,
            };

            for event in outgoing {
                let finished = match event {
                    SwapEvent::Finished(action) => Some(action),
                    _ => None,
                };
                // a full channel must not hide a cancel
                tokio::select! {
                    biased;
                    _ = cancel.changed() => return Ok(self.cancelled()),
                    _ = events.send(event) => {}
                }
                if let Some(action) = finished {
                    info!(order_id = %self.order_id, %action, "Swap finished");
                    return Ok(WatchOutcome::Finished(action));
                }
            }
        }
    }

    fn cancelled(&self) -> WatchOutcome {
        info!(order_id = %self.order_id, "Watch cancelled");
        WatchOutcome::Cancelled
    }
}
