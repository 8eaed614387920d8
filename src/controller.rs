use tracing::{error, info};

use crate::ext::{AddressExt, AmountExt};
use crate::orchestrator::{SwapOrchestrator, SwapSubscription};
use crate::types::{
    FeeRate, Network, OrderId, SwapDirection, SwapError, SwapRequest, WalletConnection,
};
use crate::wallet::WalletAdapter;

/// Balance places shown per chain: 8 for BTC, 4 for ETH
fn display_places(connection: &WalletConnection) -> u32 {
    if connection.chain.is_bitcoin() { 8 } else { 4 }
}

/// Presentation state driving the orchestrator: connections, amount, direction
pub struct SwapController {
    orchestrator: SwapOrchestrator,
    network: Network,
    fee_rate: FeeRate,
    direction: SwapDirection,
    send_amount: Option<u64>,
    is_swapping: bool,
}

impl SwapController {
    pub fn new(orchestrator: SwapOrchestrator, network: Network, fee_rate: FeeRate) -> Self {
        Self {
            orchestrator,
            network,
            fee_rate,
            direction: SwapDirection::default(),
            send_amount: None,
            is_swapping: false,
        }
    }

    pub fn orchestrator(&self) -> &SwapOrchestrator {
        &self.orchestrator
    }

    pub async fn connect_bitcoin(&self) -> Result<WalletConnection, SwapError> {
        self.orchestrator.bitcoin_wallet().connect().await.inspect_err(|e| {
            error!("Error connecting Bitcoin wallet: {}", e);
        })
    }

    pub async fn connect_evm(&self) -> Result<WalletConnection, SwapError> {
        self.orchestrator.evm_wallet().connect().await.inspect_err(|e| {
            error!("Error connecting EVM wallet: {}", e);
        })
    }

    pub fn direction(&self) -> SwapDirection {
        self.direction
    }

    pub fn toggle_direction(&mut self) -> SwapDirection {
        self.direction = self.direction.toggle();
        self.direction
    }

    /// Accept a decimal amount of the source asset (e.g. `"0.0001"`)
    pub fn set_amount(&mut self, value: &str) -> Result<u64, SwapError> {
        let (from, _) = self.direction.assets(self.network);
        let amount = u64::from_display(value, from.decimals)?;
        if amount == 0 {
            return Err(SwapError::InvalidAmount("amount must be greater than zero".to_string()));
        }
        self.send_amount = Some(amount);
        Ok(amount)
    }

    pub fn send_amount(&self) -> Option<u64> {
        self.send_amount
    }

    pub fn is_swapping(&self) -> bool {
        self.is_swapping
    }

    pub fn can_submit(&self) -> bool {
        !self.is_swapping
            && self.send_amount.is_some()
            && self.orchestrator.bitcoin_wallet().is_connected()
            && self.orchestrator.evm_wallet().is_connected()
    }

    pub fn quote(&self) -> Result<SwapRequest, SwapError> {
        let amount = self
            .send_amount
            .ok_or_else(|| SwapError::InvalidAmount("no amount entered".to_string()))?;
        let (from, to) = self.direction.assets(self.network);
        SwapRequest::quote(from, to, amount, self.fee_rate)
    }

    pub async fn submit(&mut self) -> Result<OrderId, SwapError> {
        let amount = self
            .send_amount
            .ok_or_else(|| SwapError::InvalidAmount("no amount entered".to_string()))?;
        let (from, to) = self.direction.assets(self.network);

        self.is_swapping = true;
        let result = self
            .orchestrator
            .submit(from, to, amount, self.fee_rate)
            .await;
        self.is_swapping = false;

        result.inspect_err(|e| error!("Error executing swap: {}", e))
    }

    /// Submit, then follow the new order on the EVM address feed
    pub async fn swap(&mut self) -> Result<SwapSubscription, SwapError> {
        let order_id = self.submit().await?;
        let observer = self.orchestrator.observer_address()?;
        info!("Watching order {} for {}", order_id, observer.as_str().shorten());
        Ok(self.orchestrator.watch(order_id, observer))
    }

    /// Human-readable wallet summary
    pub fn status_lines(&self) -> Vec<String> {
        [self.orchestrator.bitcoin_wallet(), self.orchestrator.evm_wallet()]
            .into_iter()
            .map(|wallet| describe_wallet(wallet.as_ref()))
            .collect()
    }
}

fn describe_wallet(wallet: &dyn WalletAdapter) -> String {
    let chain = wallet.chain();
    match wallet.connection() {
        Some(connection) if connection.connected => format!(
            "{}: {} {} ({})",
            chain,
            connection
                .balance
                .to_display(chain.native_decimals(), display_places(&connection)),
            chain.native_symbol(),
            connection.address.as_str().shorten()
        ),
        _ => format!("{chain}: Not connected"),
    }
}
