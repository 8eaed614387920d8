use thiserror_no_std::Error;

use super::swap::Chain;

/// Errors that can occur while connecting wallets or driving a swap
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwapError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Wallet not connected: {chain}")]
    WalletNotConnected { chain: Chain },
    #[error("Order submission error: {0}")]
    OrderSubmission(String),
    #[error("Action execution error: {0}")]
    ActionExecution(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid fee rate: {0}")]
    InvalidFeeRate(String),
    #[error("Order feed error: {0}")]
    Feed(String),
    #[error("Config error: {0}")]
    Config(String),
}

impl SwapError {
    /// Whether the caller may retry the operation that produced this error.
    ///
    /// Signing failures are never retryable from here: a second broadcast can cost funds.
    pub fn is_transient(&self) -> bool {
        matches!(self, SwapError::Connection(_) | SwapError::Feed(_))
    }
}
