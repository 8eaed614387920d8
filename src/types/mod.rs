pub mod error;
pub mod order;
pub mod swap;

pub use error::SwapError;
pub use order::{Action, NextStep, Order, OrderId, OrderStatus, classify};
pub use swap::{
    Asset, Chain, FeeRate, Network, SwapAction, SwapDirection, SwapOutput, SwapRequest,
    WalletConnection,
};
