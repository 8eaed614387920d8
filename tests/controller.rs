mod mocks;

use garden_swap::{
    Action, Chain, FeeRate, Network, OrderStatus, SwapController, SwapDirection, SwapError,
    SwapEvent, WatchOutcome,
};
use mocks::{CountingExecutor, Harness, fast_watch_config, order};

fn controller(harness: &Harness) -> SwapController {
    SwapController::new(
        harness.orchestrator(fast_watch_config()),
        Network::Testnet,
        "0.003".parse::<FeeRate>().unwrap(),
    )
}

#[tokio::test]
async fn amount_input_is_converted_to_sats() {
    let harness = Harness::new(CountingExecutor::default());
    let mut controller = controller(&harness);

    assert_eq!(controller.set_amount("0.0001").unwrap(), 10_000);
    let request = controller.quote().unwrap();
    assert_eq!(request.send_amount, 10_000);
    assert_eq!(request.receive_amount, 9_970);

    assert!(controller.set_amount("0").is_err());
    assert!(controller.set_amount("0.000000001").is_err());
    assert_eq!(controller.send_amount(), Some(10_000));
}

#[tokio::test]
async fn direction_toggle_reverses_the_quote() {
    let harness = Harness::new(CountingExecutor::default());
    let mut controller = controller(&harness);
    controller.set_amount("0.0001").unwrap();

    assert_eq!(controller.toggle_direction(), SwapDirection::WbtcToBtc);
    let request = controller.quote().unwrap();
    assert_eq!(request.source_asset.chain, Chain::EthereumSepolia);
    assert_eq!(request.destination_asset.chain, Chain::BitcoinTestnet);
    assert_eq!(request.receive_amount, 9_970);
}

#[tokio::test]
async fn submit_is_blocked_until_both_wallets_connect() {
    let harness = Harness::new(CountingExecutor::default());
    let mut controller = controller(&harness);
    controller.set_amount("0.0001").unwrap();

    assert!(!controller.can_submit());
    assert!(matches!(
        controller.submit().await,
        Err(SwapError::WalletNotConnected { .. })
    ));
    assert_eq!(
        controller.status_lines(),
        vec![
            "bitcoin_testnet: Not connected".to_string(),
            "ethereum_sepolia: Not connected".to_string(),
        ]
    );

    controller.connect_bitcoin().await.unwrap();
    controller.connect_evm().await.unwrap();
    assert!(controller.can_submit());
    assert_eq!(
        controller.status_lines(),
        vec![
            "bitcoin_testnet: 0.00010000 BTC (tb1q8e...c7cm)".to_string(),
            "ethereum_sepolia: 1.5000 ETH (0x5290...9EE7)".to_string(),
        ]
    );
}

#[tokio::test]
async fn swap_submits_and_follows_the_new_order() {
    let harness = Harness::new(CountingExecutor::default());
    harness
        .orderbook
        .push(vec![])
        .push(vec![order("1", OrderStatus::Matched)])
        .push(vec![order("1", OrderStatus::CounterpartyInitiated)])
        .push(vec![order("1", OrderStatus::Completed)]);
    let mut controller = controller(&harness);
    controller.connect_bitcoin().await.unwrap();
    controller.connect_evm().await.unwrap();
    controller.set_amount("0.0001").unwrap();

    let mut subscription = controller.swap().await.unwrap();
    assert_eq!(subscription.order_id().as_str(), "1");
    assert!(!controller.is_swapping());

    let mut completed = 0;
    while let Some(event) = subscription.next_event().await {
        if matches!(event, SwapEvent::ActionCompleted(_)) {
            completed += 1;
        }
    }
    assert_eq!(completed, 2);
    assert_eq!(
        subscription.join().await.unwrap(),
        WatchOutcome::Finished(Action::Done)
    );
}
