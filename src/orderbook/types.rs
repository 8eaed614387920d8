use serde::{Deserialize, Serialize};

use crate::types::{OrderId, SwapRequest};

/// Body of `POST /orders`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub order_pair: String,
    /// Smallest-unit amounts travel as strings to preserve precision
    pub send_amount: String,
    pub receive_amount: String,
}

impl From<&SwapRequest> for CreateOrderRequest {
    fn from(request: &SwapRequest) -> Self {
        Self {
            order_pair: request.order_pair(),
            send_amount: request.send_amount.to_string(),
            receive_amount: request.receive_amount.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: OrderId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FeeRate, Network, SwapDirection};

    #[test]
    fn create_order_body_uses_string_amounts() {
        let (from, to) = SwapDirection::BtcToWbtc.assets(Network::Testnet);
        let request = SwapRequest::quote(from, to, 10_000, FeeRate::from_bps(30).unwrap()).unwrap();
        let body = serde_json::to_value(CreateOrderRequest::from(&request)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "orderPair": "bitcoin_testnet:BTC::ethereum_sepolia:WBTC",
                "sendAmount": "10000",
                "receiveAmount": "9970",
            })
        );
    }

    #[test]
    fn create_order_response_accepts_numeric_ids() {
        let response: CreateOrderResponse = serde_json::from_str(r#"{"orderId": 1337}"#).unwrap();
        assert_eq!(response.order_id, OrderId::new("1337"));
    }
}
