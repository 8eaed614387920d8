//! Client-side orchestration for Bitcoin <-> EVM atomic swaps.
//!
//! Wallets, the orderbook and the swap executor are external services reached through
//! [`WalletAdapter`], [`OrderbookClient`] and [`SwapExecutor`]. This crate submits swap
//! intents, follows the order feed and drives the next on-chain step for each status.

pub mod config;
pub mod controller;
pub mod ext;
pub mod orchestrator;
pub mod orderbook;
pub mod retry;
pub mod swapper;
pub mod tracing;
pub mod types;
pub mod wallet;

pub use config::AppConfig;
pub use controller::SwapController;
pub use orchestrator::{SwapEvent, SwapOrchestrator, SwapSubscription, WatchConfig, WatchOutcome};
pub use orderbook::{HttpOrderbook, OrderbookClient};
pub use swapper::{DryRunExecutor, Swap, SwapExecutor};
pub use types::*;
pub use wallet::{BitcoinWallet, EvmWallet, WalletAdapter};
