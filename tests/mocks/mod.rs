#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use garden_swap::retry::RetryConfig;
use garden_swap::wallet::ConnectionState;
use garden_swap::{
    Chain, Order, OrderId, OrderStatus, OrderbookClient, SwapError, SwapExecutor,
    SwapOrchestrator, SwapRequest, WalletAdapter, WalletConnection, WatchConfig,
};

pub struct FakeWallet {
    chain: Chain,
    address: String,
    balance: u128,
    reject: bool,
    state: ConnectionState,
}

impl FakeWallet {
    pub fn new(chain: Chain, address: &str, balance: u128) -> Self {
        Self {
            chain,
            address: address.to_string(),
            balance,
            reject: false,
            state: ConnectionState::new(),
        }
    }

    pub fn rejecting(chain: Chain) -> Self {
        Self {
            reject: true,
            ..Self::new(chain, "", 0)
        }
    }
}

#[async_trait]
impl WalletAdapter for FakeWallet {
    fn chain(&self) -> Chain {
        self.chain
    }

    async fn get_address(&self) -> Result<String, SwapError> {
        if self.reject {
            return Err(SwapError::Connection("user rejected the request".to_string()));
        }
        Ok(self.address.clone())
    }

    async fn get_balance(&self) -> Result<u128, SwapError> {
        Ok(self.balance)
    }

    async fn connect(&self) -> Result<WalletConnection, SwapError> {
        self.state.connect(self).await
    }

    fn connection(&self) -> Option<WalletConnection> {
        self.state.get()
    }
}

/// Orderbook whose feed replays scripted batches, then repeats the last one
#[derive(Default)]
pub struct ScriptedOrderbook {
    batches: Mutex<VecDeque<Result<Vec<Order>, SwapError>>>,
    last: Mutex<Vec<Order>>,
    pub created: Mutex<Vec<SwapRequest>>,
    create_error: Mutex<Option<SwapError>>,
    pub polls: AtomicUsize,
}

impl ScriptedOrderbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, orders: Vec<Order>) -> &Self {
        self.batches.lock().unwrap().push_back(Ok(orders));
        self
    }

    pub fn push_error(&self, error: SwapError) -> &Self {
        self.batches.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn fail_create(&self, error: SwapError) {
        *self.create_error.lock().unwrap() = Some(error);
    }
}

#[async_trait]
impl OrderbookClient for ScriptedOrderbook {
    async fn create_order(&self, request: &SwapRequest) -> Result<OrderId, SwapError> {
        if let Some(error) = self.create_error.lock().unwrap().clone() {
            return Err(error);
        }
        let mut created = self.created.lock().unwrap();
        created.push(request.clone());
        Ok(OrderId::new(created.len().to_string()))
    }

    async fn get_orders(&self, _address: &str) -> Result<Vec<Order>, SwapError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        match self.batches.lock().unwrap().pop_front() {
            Some(Ok(orders)) => {
                *self.last.lock().unwrap() = orders.clone();
                Ok(orders)
            }
            Some(Err(error)) => Err(error),
            None => Ok(self.last.lock().unwrap().clone()),
        }
    }
}

#[derive(Default)]
pub struct CountingExecutor {
    pub initiates: AtomicUsize,
    pub redeems: AtomicUsize,
    pub refunds: AtomicUsize,
    pub fail: bool,
}

impl CountingExecutor {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn record(&self, counter: &AtomicUsize, hash: &str) -> Result<String, SwapError> {
        counter.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(SwapError::ActionExecution("broadcast rejected".to_string()))
        } else {
            Ok(hash.to_string())
        }
    }
}

#[async_trait]
impl SwapExecutor for CountingExecutor {
    async fn initiate(&self, _order: &Order) -> Result<String, SwapError> {
        self.record(&self.initiates, "0xinitiate")
    }

    async fn redeem(&self, _order: &Order) -> Result<String, SwapError> {
        self.record(&self.redeems, "0xredeem")
    }

    async fn refund(&self, _order: &Order) -> Result<String, SwapError> {
        self.record(&self.refunds, "0xrefund")
    }
}

pub const BTC_ADDRESS: &str = "tb1q8eamvjqvq4fdaqmzxfs6936ec96flp90unc7cm";
pub const EVM_ADDRESS: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

pub fn order(id: &str, status: OrderStatus) -> Order {
    Order::new(OrderId::new(id), status)
}

pub fn fast_watch_config() -> WatchConfig {
    WatchConfig {
        poll_interval: Duration::from_millis(1),
        retry: RetryConfig::none(),
        ..WatchConfig::default()
    }
}

pub struct Harness {
    pub orderbook: Arc<ScriptedOrderbook>,
    pub executor: Arc<CountingExecutor>,
    pub bitcoin: Arc<FakeWallet>,
    pub evm: Arc<FakeWallet>,
}

impl Harness {
    pub fn new(executor: CountingExecutor) -> Self {
        Self {
            orderbook: Arc::new(ScriptedOrderbook::new()),
            executor: Arc::new(executor),
            bitcoin: Arc::new(FakeWallet::new(Chain::BitcoinTestnet, BTC_ADDRESS, 10_000)),
            evm: Arc::new(FakeWallet::new(
                Chain::EthereumSepolia,
                EVM_ADDRESS,
                1_500_000_000_000_000_000,
            )),
        }
    }

    pub fn orchestrator(&self, config: WatchConfig) -> SwapOrchestrator {
        SwapOrchestrator::new(
            self.orderbook.clone(),
            self.executor.clone(),
            self.bitcoin.clone(),
            self.evm.clone(),
            config,
        )
    }
}
