use std::process::ExitCode;
use std::sync::Arc;

use ::tracing::{error, info, warn};
use clap::{Args, Parser, Subcommand};
use garden_swap::ext::AmountExt;
use garden_swap::{
    AppConfig, BitcoinWallet, DryRunExecutor, EvmWallet, HttpOrderbook, SwapController,
    SwapError, SwapEvent, SwapOrchestrator, WatchConfig,
};

#[derive(Debug, Parser)]
#[command(name = "garden-swap", version, about = "Bitcoin <-> WBTC atomic swap client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Connect both wallets and print their balances
    Balances,
    /// Show what a swap would receive after fees
    Quote(SwapArgs),
    /// Submit a swap and follow it until it finishes
    Swap {
        #[command(flatten)]
        args: SwapArgs,
        /// Send the refund automatically if the order expires
        #[arg(long)]
        auto_refund: bool,
    },
}

#[derive(Debug, Args)]
struct SwapArgs {
    /// Amount of the source asset, e.g. 0.0001
    #[arg(long)]
    amount: String,
    /// Swap WBTC to BTC instead of BTC to WBTC
    #[arg(long)]
    reverse: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    if let Err(e) = garden_swap::tracing::init() {
        eprintln!("Error initializing tracing: {e}");
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn build_controller(config: &AppConfig, auto_refund: bool) -> Result<SwapController, SwapError> {
    let bitcoin = BitcoinWallet::new(
        config.network.bitcoin_chain(),
        &config.bitcoin,
        config.retry.clone(),
    );
    let evm = EvmWallet::new(config.network.evm_chain(), &config.evm, config.retry.clone());
    let orderbook = HttpOrderbook::init(&config.orderbook)?;

    let watch_config = WatchConfig {
        poll_interval: config.poll_interval,
        retry: config.retry.clone(),
        auto_refund,
        ..WatchConfig::default()
    };

    let orchestrator = SwapOrchestrator::new(
        Arc::new(orderbook),
        Arc::new(DryRunExecutor),
        Arc::new(bitcoin),
        Arc::new(evm),
        watch_config,
    );

    Ok(SwapController::new(orchestrator, config.network, config.fee_rate))
}

fn prepare(controller: &mut SwapController, args: &SwapArgs) -> Result<(), SwapError> {
    if args.reverse {
        controller.toggle_direction();
    }
    controller.set_amount(&args.amount)?;
    Ok(())
}

async fn run(cli: Cli) -> Result<(), SwapError> {
    let config = AppConfig::from_env()?;
    info!("Network: {} (fee rate {})", config.network, config.fee_rate);

    match cli.command {
        Command::Balances => {
            let controller = build_controller(&config, false)?;
            // Report both sides even if one fails
            let bitcoin = controller.connect_bitcoin().await;
            let evm = controller.connect_evm().await;
            for line in controller.status_lines() {
                info!("{line}");
            }
            bitcoin?;
            evm?;
            Ok(())
        }
        Command::Quote(args) => {
            let mut controller = build_controller(&config, false)?;
            prepare(&mut controller, &args)?;
            let request = controller.quote()?;
            info!(
                "{}: send {} {} -> receive {} {}",
                controller.direction().label(),
                request.send_amount.to_display(request.source_asset.decimals, request.source_asset.decimals),
                request.source_asset.symbol,
                request.receive_amount.to_display(request.destination_asset.decimals, request.destination_asset.decimals),
                request.destination_asset.symbol,
            );
            Ok(())
        }
        Command::Swap { args, auto_refund } => {
            let mut controller = build_controller(&config, auto_refund)?;
            controller.connect_bitcoin().await?;
            controller.connect_evm().await?;
            prepare(&mut controller, &args)?;

            warn!("No signing backend configured; on-chain actions are simulated");
            let mut subscription = controller.swap().await?;

            loop {
                tokio::select! {
                    event = subscription.next_event() => match event {
                        Some(SwapEvent::StatusChanged { status, action, .. }) => {
                            info!("Order status {status}: {action}");
                        }
                        Some(SwapEvent::ActionCompleted(output)) => {
                            info!(
                                "Completed Action {} with transaction hash: {}",
                                output.action, output.tx_hash
                            );
                        }
                        Some(SwapEvent::ActionFailed { action, error }) => {
                            error!("{action} failed: {error}");
                        }
                        Some(SwapEvent::RefundRequired(order_id)) => {
                            warn!("Order {order_id} expired; rerun with --auto-refund to refund");
                        }
                        Some(SwapEvent::FeedError(e)) => warn!("{e}"),
                        Some(SwapEvent::Finished(action)) => info!("Swap finished: {action}"),
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => {
                        warn!("Interrupted; cancelling watch");
                        subscription.cancel();
                    }
                }
            }

            let outcome = subscription.join().await?;
            info!("Watch ended: {outcome:?}");
            Ok(())
        }
    }
}
