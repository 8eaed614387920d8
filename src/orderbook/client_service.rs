use async_trait::async_trait;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use tracing::{debug, info};
use url::Url;

use super::OrderbookClient;
use super::types::{CreateOrderRequest, CreateOrderResponse};
use crate::config::OrderbookConfig;
use crate::types::{Order, OrderId, SwapError, SwapRequest};

/// Orderbook reached over its HTTP API
pub struct HttpOrderbook {
    client: Client,
    base_url: Url,
}

impl HttpOrderbook {
    pub fn init(config: &OrderbookConfig) -> Result<Self, SwapError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.auth_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
                .map_err(|e| SwapError::Config(format!("Invalid orderbook token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| SwapError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }
}

#[async_trait]
impl OrderbookClient for HttpOrderbook {
    async fn create_order(&self, request: &SwapRequest) -> Result<OrderId, SwapError> {
        let body = CreateOrderRequest::from(request);
        info!("Creating order {} for {} units", body.order_pair, body.send_amount);

        let response: CreateOrderResponse = self
            .client
            .post(self.endpoint("orders"))
            .json(&body)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| SwapError::OrderSubmission(format!("Failed to create order: {e}")))?
            .json()
            .await
            .map_err(|e| SwapError::OrderSubmission(format!("Invalid create order response: {e}")))?;

        Ok(response.order_id)
    }

    async fn get_orders(&self, address: &str) -> Result<Vec<Order>, SwapError> {
        debug!("Getting orders for address: {}", address);

        let orders = self
            .client
            .get(self.endpoint("orders"))
            .query(&[("address", address)])
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| SwapError::Feed(format!("Failed to get orders: {e}")))?
            .json()
            .await
            .map_err(|e| SwapError::Feed(format!("Invalid orders response: {e}")))?;

        Ok(orders)
    }
}

impl std::fmt::Debug for HttpOrderbook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpOrderbook")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}
