use std::str::FromStr;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter::Targets, layer::SubscriberExt, util::SubscriberInitExt};

/// Level comes from `GARDEN_SWAP_LOG` (e.g. `debug`), defaulting to `info`
pub fn init() -> Result<(), String> {
    let log_level = match std::env::var("GARDEN_SWAP_LOG") {
        Ok(value) => LevelFilter::from_str(&value)
            .map_err(|e| format!("Invalid GARDEN_SWAP_LOG value {value}: {e}"))?,
        Err(_) => LevelFilter::INFO,
    };

    let stdout_log_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_ansi(true)
        .with_target(true)
        .with_writer(std::io::stdout);

    let target = Targets::new().with_target("garden_swap", log_level);

    tracing_subscriber::Registry::default()
        .with(target)
        .with(stdout_log_layer)
        .try_init()
        .map_err(|e| format!("Failed to install tracing subscriber: {e}"))
}
