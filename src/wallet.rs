use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{BitcoinWalletConfig, EvmWalletConfig};
use crate::retry::{RetryConfig, retry_with_backoff};
use crate::types::{Chain, SwapError, WalletConnection};

/// One side of the swap: an address on a chain plus balance lookup.
///
/// Signing happens in the swap executor, never through this trait.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    fn chain(&self) -> Chain;

    async fn get_address(&self) -> Result<String, SwapError>;

    /// Balance in the chain's smallest native unit
    async fn get_balance(&self) -> Result<u128, SwapError>;

    /// Look up address and balance and remember the result as this wallet's connection
    async fn connect(&self) -> Result<WalletConnection, SwapError>;

    /// Snapshot from the last successful `connect`
    fn connection(&self) -> Option<WalletConnection>;

    fn is_connected(&self) -> bool {
        self.connection().is_some_and(|connection| connection.connected)
    }
}

/// Connection bookkeeping shared by adapter implementations
#[derive(Debug, Default)]
pub struct ConnectionState {
    current: RwLock<Option<WalletConnection>>,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn connect<W>(&self, wallet: &W) -> Result<WalletConnection, SwapError>
    where
        W: WalletAdapter + ?Sized,
    {
        let chain = wallet.chain();
        let result = async {
            let address = wallet.get_address().await?;
            let balance = wallet.get_balance().await?;
            Ok::<_, SwapError>(WalletConnection::new(chain, address, balance))
        }
        .await;

        match result {
            Ok(connection) => {
                info!(%chain, address = %connection.address, balance = %connection.balance, "Wallet connected");
                self.set(Some(connection.clone()));
                Ok(connection)
            }
            Err(e) => {
                warn!(%chain, error = %e, "Wallet connection failed");
                self.set(None);
                Err(match e {
                    SwapError::Connection(msg) => SwapError::Connection(msg),
                    other => SwapError::Connection(format!("{chain}: {other}")),
                })
            }
        }
    }

    pub fn get(&self) -> Option<WalletConnection> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn disconnect(&self) {
        self.set(None);
    }

    fn set(&self, value: Option<WalletConnection>) {
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = value;
    }
}

fn endpoint(base: &Url, path: &str) -> String {
    format!("{}/{}", base.as_str().trim_end_matches('/'), path)
}

/// Bitcoin wallet backed by an Esplora REST API
pub struct BitcoinWallet {
    chain: Chain,
    address: String,
    esplora_url: Url,
    client: Client,
    retry: RetryConfig,
    state: ConnectionState,
}

#[derive(Debug, Deserialize)]
struct EsploraAddress {
    chain_stats: EsploraStats,
    mempool_stats: EsploraStats,
}

#[derive(Debug, Deserialize)]
struct EsploraStats {
    funded_txo_sum: u64,
    spent_txo_sum: u64,
}

impl BitcoinWallet {
    pub fn new(chain: Chain, config: &BitcoinWalletConfig, retry: RetryConfig) -> Self {
        Self {
            chain,
            address: config.address.clone(),
            esplora_url: config.esplora_url.clone(),
            client: Client::new(),
            retry,
            state: ConnectionState::new(),
        }
    }

    async fn fetch_balance(&self) -> Result<u128, SwapError> {
        let url = endpoint(&self.esplora_url, &format!("address/{}", self.address));
        debug!("Getting bitcoin balance from {}", url);

        let stats: EsploraAddress = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| SwapError::Connection(format!("Failed to get bitcoin balance: {e}")))?
            .json()
            .await
            .map_err(|e| SwapError::Connection(format!("Invalid esplora response: {e}")))?;

        Ok(esplora_balance(&stats))
    }
}

fn esplora_balance(address: &EsploraAddress) -> u128 {
    let funded = u128::from(address.chain_stats.funded_txo_sum)
        + u128::from(address.mempool_stats.funded_txo_sum);
    let spent = u128::from(address.chain_stats.spent_txo_sum)
        + u128::from(address.mempool_stats.spent_txo_sum);
    funded.saturating_sub(spent)
}

#[async_trait]
impl WalletAdapter for BitcoinWallet {
    fn chain(&self) -> Chain {
        self.chain
    }

    async fn get_address(&self) -> Result<String, SwapError> {
        if self.address.trim().is_empty() {
            return Err(SwapError::Connection("bitcoin address is empty".to_string()));
        }
        Ok(self.address.clone())
    }

    async fn get_balance(&self) -> Result<u128, SwapError> {
        retry_with_backoff("bitcoin balance", &self.retry, SwapError::Connection, || {
            self.fetch_balance()
        })
        .await
    }

    async fn connect(&self) -> Result<WalletConnection, SwapError> {
        self.state.connect(self).await
    }

    fn connection(&self) -> Option<WalletConnection> {
        self.state.get()
    }
}

impl std::fmt::Debug for BitcoinWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitcoinWallet")
            .field("chain", &self.chain)
            .field("address", &self.address)
            .field("esplora_url", &self.esplora_url.as_str())
            .finish()
    }
}

/// EVM wallet backed by a JSON-RPC endpoint
pub struct EvmWallet {
    chain: Chain,
    address: String,
    rpc_url: Url,
    client: Client,
    retry: RetryConfig,
    state: ConnectionState,
}

impl EvmWallet {
    pub fn new(chain: Chain, config: &EvmWalletConfig, retry: RetryConfig) -> Self {
        Self {
            chain,
            address: config.address.clone(),
            rpc_url: config.rpc_url.clone(),
            client: Client::new(),
            retry,
            state: ConnectionState::new(),
        }
    }

    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, SwapError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response: Value = self
            .client
            .post(self.rpc_url.as_str())
            .json(&body)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| SwapError::Connection(format!("Failed to call {method}: {e}")))?
            .json()
            .await
            .map_err(|e| SwapError::Connection(format!("Invalid {method} response: {e}")))?;

        rpc_result(method, response)
    }
}

fn rpc_result(method: &str, mut response: Value) -> Result<Value, SwapError> {
    if let Some(error) = response.get("error").filter(|error| !error.is_null()) {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(SwapError::Connection(format!("{method} rejected: {message}")));
    }

    match response.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(SwapError::Connection(format!("{method} returned no result"))),
    }
}

/// Parse a JSON-RPC hex quantity such as `"0x1bc16d674ec80000"`
pub fn parse_hex_quantity(value: &str) -> Result<u128, SwapError> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| SwapError::Connection(format!("quantity {value} lacks 0x prefix")))?;
    if digits.is_empty() {
        return Err(SwapError::Connection("empty quantity".to_string()));
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| SwapError::Connection(format!("invalid quantity {value}: {e}")))
}

pub fn validate_evm_address(address: &str) -> Result<(), SwapError> {
    let digits = address
        .strip_prefix("0x")
        .ok_or_else(|| SwapError::Connection(format!("{address} lacks 0x prefix")))?;
    let bytes = hex::decode(digits)
        .map_err(|e| SwapError::Connection(format!("{address} is not hex: {e}")))?;
    if bytes.len() != 20 {
        return Err(SwapError::Connection(format!(
            "{address} must be 20 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(())
}

#[async_trait]
impl WalletAdapter for EvmWallet {
    fn chain(&self) -> Chain {
        self.chain
    }

    async fn get_address(&self) -> Result<String, SwapError> {
        validate_evm_address(&self.address)?;
        Ok(self.address.clone())
    }

    async fn get_balance(&self) -> Result<u128, SwapError> {
        let result = retry_with_backoff("evm balance", &self.retry, SwapError::Connection, || {
            self.rpc_call("eth_getBalance", json!([self.address, "latest"]))
        })
        .await?;

        let quantity = result
            .as_str()
            .ok_or_else(|| SwapError::Connection("eth_getBalance result is not a string".to_string()))?;
        parse_hex_quantity(quantity)
    }

    async fn connect(&self) -> Result<WalletConnection, SwapError> {
        self.state.connect(self).await
    }

    fn connection(&self) -> Option<WalletConnection> {
        self.state.get()
    }
}

impl std::fmt::Debug for EvmWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmWallet")
            .field("chain", &self.chain)
            .field("address", &self.address)
            .field("rpc_url", &self.rpc_url.as_str())
            .finish()
    }
}
