use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, Utc};
use derive_new::new;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use super::error::SwapError;

/// Fee rates are stored in parts per million.
pub const PPM_SCALE: u64 = 1_000_000;

/// BTC and WBTC both use 8 decimals.
pub const BTC_DECIMALS: u32 = 8;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Chain {
    Bitcoin,
    BitcoinTestnet,
    Ethereum,
    EthereumSepolia,
}

impl Chain {
    pub fn is_bitcoin(&self) -> bool {
        matches!(self, Chain::Bitcoin | Chain::BitcoinTestnet)
    }

    pub fn is_evm(&self) -> bool {
        !self.is_bitcoin()
    }

    /// Decimals of the chain's native currency (sats, wei)
    pub fn native_decimals(&self) -> u32 {
        if self.is_bitcoin() { BTC_DECIMALS } else { 18 }
    }

    pub fn native_symbol(&self) -> &'static str {
        if self.is_bitcoin() { "BTC" } else { "ETH" }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
}

impl Network {
    pub fn bitcoin_chain(&self) -> Chain {
        match self {
            Network::Mainnet => Chain::Bitcoin,
            Network::Testnet => Chain::BitcoinTestnet,
        }
    }

    pub fn evm_chain(&self) -> Chain {
        match self {
            Network::Mainnet => Chain::Ethereum,
            Network::Testnet => Chain::EthereumSepolia,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub chain: Chain,
    pub symbol: String,
    pub decimals: u32,
}

impl Asset {
    /// Native BTC on a Bitcoin chain
    pub fn btc(chain: Chain) -> Self {
        Self {
            chain,
            symbol: "BTC".to_string(),
            decimals: BTC_DECIMALS,
        }
    }

    /// Wrapped BTC on an EVM chain
    pub fn wbtc(chain: Chain) -> Self {
        Self {
            chain,
            symbol: "WBTC".to_string(),
            decimals: BTC_DECIMALS,
        }
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.chain, self.symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SwapDirection {
    #[default]
    BtcToWbtc,
    WbtcToBtc,
}

impl SwapDirection {
    pub fn toggle(self) -> Self {
        match self {
            SwapDirection::BtcToWbtc => SwapDirection::WbtcToBtc,
            SwapDirection::WbtcToBtc => SwapDirection::BtcToWbtc,
        }
    }

    /// Source and destination assets for this direction on `network`
    pub fn assets(&self, network: Network) -> (Asset, Asset) {
        let btc = Asset::btc(network.bitcoin_chain());
        let wbtc = Asset::wbtc(network.evm_chain());
        match self {
            SwapDirection::BtcToWbtc => (btc, wbtc),
            SwapDirection::WbtcToBtc => (wbtc, btc),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SwapDirection::BtcToWbtc => "BTC to WBTC",
            SwapDirection::WbtcToBtc => "WBTC to BTC",
        }
    }
}

/// Fee rate in parts per million, always in `[0, 1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u64")]
pub struct FeeRate(u64);

impl TryFrom<u64> for FeeRate {
    type Error = SwapError;

    fn try_from(ppm: u64) -> Result<Self, Self::Error> {
        Self::from_ppm(ppm)
    }
}

impl FeeRate {
    pub fn from_ppm(ppm: u64) -> Result<Self, SwapError> {
        if ppm >= PPM_SCALE {
            return Err(SwapError::InvalidFeeRate(format!(
                "{ppm} ppm is not below 100%"
            )));
        }
        Ok(Self(ppm))
    }

    pub fn from_bps(bps: u64) -> Result<Self, SwapError> {
        Self::from_ppm(bps.saturating_mul(100))
    }

    pub fn ppm(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Amount left after the fee, rounded half up: `round((1 - fee) * amount)`
    pub fn apply(&self, amount: u64) -> u64 {
        let kept = u128::from(PPM_SCALE - self.0);
        let scale = u128::from(PPM_SCALE);
        let value = (u128::from(amount) * kept + scale / 2) / scale;
        // value <= amount, so it always fits
        value as u64
    }
}

impl FromStr for FeeRate {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = BigDecimal::from_str(s.trim())
            .map_err(|e| SwapError::InvalidFeeRate(format!("{s}: {e}")))?;

        let scaled = value * BigDecimal::from(PPM_SCALE);
        if !scaled.is_integer() {
            return Err(SwapError::InvalidFeeRate(format!(
                "{s} has more precision than 1e-6"
            )));
        }

        let ppm = scaled
            .to_u64()
            .ok_or_else(|| SwapError::InvalidFeeRate(format!("{s} must be in [0, 1)")))?;

        Self::from_ppm(ppm)
    }
}

impl std::fmt::Display for FeeRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fraction = format!("{:06}", self.0);
        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            write!(f, "0")
        } else {
            write!(f, "0.{fraction}")
        }
    }
}

/// Swap intent registered with the orderbook. Amounts are in smallest units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub source_asset: Asset,
    pub destination_asset: Asset,
    pub send_amount: u64,
    pub receive_amount: u64,
}

impl SwapRequest {
    /// Build a request, deriving `receive_amount` from `send_amount` and the fee
    pub fn quote(
        source_asset: Asset,
        destination_asset: Asset,
        send_amount: u64,
        fee_rate: FeeRate,
    ) -> Result<Self, SwapError> {
        if source_asset.chain == destination_asset.chain {
            return Err(SwapError::InvalidAmount(format!(
                "cannot swap within a single chain ({})",
                source_asset.chain
            )));
        }

        if send_amount == 0 {
            return Err(SwapError::InvalidAmount(
                "send amount must be greater than zero".to_string(),
            ));
        }

        let receive_amount = fee_rate.apply(send_amount);

        if receive_amount == 0 || (!fee_rate.is_zero() && receive_amount >= send_amount) {
            return Err(SwapError::InvalidAmount(format!(
                "send amount {send_amount} is too small to cover a {fee_rate} fee"
            )));
        }

        Ok(Self {
            source_asset,
            destination_asset,
            send_amount,
            receive_amount,
        })
    }

    /// Orderbook pair notation, e.g. `bitcoin_testnet:BTC::ethereum_sepolia:WBTC`
    pub fn order_pair(&self) -> String {
        format!("{}::{}", self.source_asset, self.destination_asset)
    }
}

/// On-chain action performed by the swap executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum SwapAction {
    Initiate,
    Redeem,
    Refund,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutput {
    pub action: SwapAction,
    pub tx_hash: String,
    pub completed_at: DateTime<Utc>,
}

impl SwapOutput {
    pub fn new(action: SwapAction, tx_hash: impl Into<String>) -> Self {
        Self {
            action,
            tx_hash: tx_hash.into(),
            completed_at: Utc::now(),
        }
    }
}

/// Point-in-time snapshot of a connected wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct WalletConnection {
    pub chain: Chain,
    pub address: String,
    pub balance: u128,
    #[new(value = "true")]
    pub connected: bool,
}
