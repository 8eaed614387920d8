pub mod client_service;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::time::sleep;

use crate::retry::{RetryConfig, retry_with_backoff};
use crate::types::{Order, OrderId, SwapError, SwapRequest};

pub use client_service::HttpOrderbook;

/// Orderbook service: registers swap intents and reports order progress
#[async_trait]
pub trait OrderbookClient: Send + Sync {
    async fn create_order(&self, request: &SwapRequest) -> Result<OrderId, SwapError>;

    /// Full current set of orders visible to `address`
    async fn get_orders(&self, address: &str) -> Result<Vec<Order>, SwapError>;
}

/// Long-lived feed of order batches for one address
pub type OrderFeed = BoxStream<'static, Result<Vec<Order>, SwapError>>;

/// Poll `get_orders` every `poll_interval`, retrying transient failures before yielding them.
/// The feed never ends on its own; drop it to unsubscribe.
pub fn subscribe(
    client: Arc<dyn OrderbookClient>,
    address: String,
    poll_interval: Duration,
    retry: RetryConfig,
) -> OrderFeed {
    stream::unfold(
        (client, address, retry, true),
        move |(client, address, retry, first)| async move {
            if !first {
                sleep(poll_interval).await;
            }
            let batch = retry_with_backoff("order feed", &retry, SwapError::Feed, || {
                client.get_orders(&address)
            })
            .await;
            Some((batch, (client, address, retry, false)))
        },
    )
    .boxed()
}
