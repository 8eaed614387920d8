use std::time::Duration;

use url::Url;
use zeroize::Zeroizing;

use crate::retry::{RetryConfig, env_lookup, read_u64};
use crate::types::{FeeRate, Network, SwapError};

pub const DEFAULT_FEE_RATE: &str = "0.003";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

/// Secret string that is wiped on drop and never printed
#[derive(Clone)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Debug, Clone)]
pub struct OrderbookConfig {
    pub url: Url,
    pub auth_token: Option<Secret>,
}

#[derive(Debug, Clone)]
pub struct BitcoinWalletConfig {
    pub address: String,
    pub esplora_url: Url,
}

#[derive(Debug, Clone)]
pub struct EvmWalletConfig {
    pub address: String,
    pub rpc_url: Url,
}

/// Everything one swap session needs, injected at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub network: Network,
    pub orderbook: OrderbookConfig,
    pub bitcoin: BitcoinWalletConfig,
    pub evm: EvmWalletConfig,
    pub fee_rate: FeeRate,
    pub poll_interval: Duration,
    pub retry: RetryConfig,
}

impl AppConfig {
    /// Read configuration from the process environment (after `.env` is loaded)
    pub fn from_env() -> Result<Self, SwapError> {
        Self::from_lookup(&env_lookup)
    }

    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, SwapError> {
        let network = match lookup("GARDEN_NETWORK") {
            Some(value) => value
                .parse::<Network>()
                .map_err(|_| SwapError::Config(format!("GARDEN_NETWORK: unknown network {value}")))?,
            None => Network::default(),
        };

        let orderbook = OrderbookConfig {
            url: parse_url("GARDEN_ORDERBOOK_URL", &required(lookup, "GARDEN_ORDERBOOK_URL")?)?,
            auth_token: lookup("GARDEN_ORDERBOOK_TOKEN")
                .filter(|token| !token.is_empty())
                .map(Secret::new),
        };

        let bitcoin = BitcoinWalletConfig {
            address: required(lookup, "BITCOIN_ADDRESS")?,
            esplora_url: parse_url(
                "BITCOIN_ESPLORA_URL",
                &required(lookup, "BITCOIN_ESPLORA_URL")?,
            )?,
        };

        let evm = EvmWalletConfig {
            address: required(lookup, "EVM_ADDRESS")?,
            rpc_url: parse_url("EVM_RPC_URL", &required(lookup, "EVM_RPC_URL")?)?,
        };

        let fee_rate = lookup("GARDEN_FEE_RATE")
            .unwrap_or_else(|| DEFAULT_FEE_RATE.to_string())
            .parse::<FeeRate>()?;

        let poll_ms = read_u64(lookup, "GARDEN_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS);
        validate_nonzero("GARDEN_POLL_INTERVAL_MS", poll_ms)?;

        Ok(Self {
            network,
            orderbook,
            bitcoin,
            evm,
            fee_rate,
            poll_interval: Duration::from_millis(poll_ms),
            retry: RetryConfig::from_lookup(lookup),
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, SwapError> {
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| SwapError::Config(format!("{key} not set")))
}

pub fn parse_url(label: &str, value: &str) -> Result<Url, SwapError> {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(SwapError::Config(format!(
            "{label} must start with http:// or https://"
        )));
    }
    Url::parse(value).map_err(|e| SwapError::Config(format!("{label}: {e}")))
}

pub fn validate_nonzero(label: &str, value: u64) -> Result<(), SwapError> {
    if value == 0 {
        Err(SwapError::Config(format!("{label} must be greater than zero")))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn base_vars() -> HashMap<&'static str, String> {
        [
            ("GARDEN_ORDERBOOK_URL", "https://orderbook.example"),
            ("BITCOIN_ADDRESS", "tb1q8eamvjqvq4fdaqmzxfs6936ec96flp90unc7cm"),
            ("BITCOIN_ESPLORA_URL", "https://blockstream.info/testnet/api"),
            ("EVM_ADDRESS", "0x52908400098527886E0F7030069857D2E4169EE7"),
            ("EVM_RPC_URL", "http://127.0.0.1:8545"),
        ]
        .into_iter()
        .map(|(key, value)| (key, value.to_string()))
        .collect()
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<AppConfig, SwapError> {
        AppConfig::from_lookup(&|key: &str| vars.get(key).cloned())
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = load(&base_vars()).unwrap();
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.fee_rate.ppm(), 3_000);
        assert_eq!(config.poll_interval, Duration::from_millis(DEFAULT_POLL_INTERVAL_MS));
        assert!(config.orderbook.auth_token.is_none());
        assert_eq!(config.retry.max_retries, RetryConfig::default().max_retries);
    }

    #[test]
    fn optional_values_override_defaults() {
        let mut vars = base_vars();
        vars.insert("GARDEN_NETWORK", "mainnet".to_string());
        vars.insert("GARDEN_FEE_RATE", "0.001".to_string());
        vars.insert("GARDEN_POLL_INTERVAL_MS", "250".to_string());
        vars.insert("GARDEN_ORDERBOOK_TOKEN", "jwt-token".to_string());
        vars.insert("GARDEN_RETRY_MAX_RETRIES", "7".to_string());

        let config = load(&vars).unwrap();
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.fee_rate.ppm(), 1_000);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.orderbook.auth_token.unwrap().expose(), "jwt-token");
        assert_eq!(config.retry.max_retries, 7);
    }

    #[test]
    fn missing_required_values_are_reported() {
        for key in ["GARDEN_ORDERBOOK_URL", "BITCOIN_ADDRESS", "EVM_RPC_URL"] {
            let mut vars = base_vars();
            vars.remove(key);
            assert_eq!(
                load(&vars).unwrap_err(),
                SwapError::Config(format!("{key} not set"))
            );
        }

        let mut vars = base_vars();
        vars.insert("EVM_ADDRESS", "  ".to_string());
        assert!(matches!(load(&vars), Err(SwapError::Config(_))));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut vars = base_vars();
        vars.insert("GARDEN_NETWORK", "regtest".to_string());
        assert!(matches!(load(&vars), Err(SwapError::Config(_))));

        let mut vars = base_vars();
        vars.insert("GARDEN_FEE_RATE", "1.5".to_string());
        assert!(matches!(load(&vars), Err(SwapError::InvalidFeeRate(_))));

        let mut vars = base_vars();
        vars.insert("GARDEN_POLL_INTERVAL_MS", "0".to_string());
        assert!(matches!(load(&vars), Err(SwapError::Config(_))));

        let mut vars = base_vars();
        vars.insert("BITCOIN_ESPLORA_URL", "ws://localhost".to_string());
        assert!(matches!(load(&vars), Err(SwapError::Config(_))));
    }

    #[test]
    fn urls_require_http() {
        assert!(parse_url("rpc", "http://127.0.0.1:8545").is_ok());
        assert!(parse_url("rpc", "https://blockstream.info/testnet/api").is_ok());
        assert!(parse_url("rpc", "ws://localhost").is_err());
        assert!(parse_url("rpc", "localhost").is_err());
    }

    #[test]
    fn nonzero_validation() {
        assert!(validate_nonzero("poll interval", 1).is_ok());
        assert!(validate_nonzero("poll interval", 0).is_err());
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let config = OrderbookConfig {
            url: parse_url("orderbook", "https://orderbook.example").unwrap(),
            auth_token: Some(Secret::new("jwt-token")),
        };
        let printed = format!("{config:?}");
        assert!(printed.contains("[REDACTED]"));
        assert!(!printed.contains("jwt-token"));
        assert_eq!(config.auth_token.unwrap().expose(), "jwt-token");
    }
}
