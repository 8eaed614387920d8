use std::time::Duration;

use rand::Rng;
use tokio::time::{sleep, timeout};
use tracing::warn;

use crate::types::SwapError;

/// Bounded retry policy for reads against wallets and the orderbook feed.
///
/// Never used for signing or order creation.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub timeout: Duration,
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(10_000),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter_ms: 250,
        }
    }
}

impl RetryConfig {
    /// Read the `GARDEN_RETRY_*` keys; unset or unparsable keys keep their defaults
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        let millis = |key: &str, fallback: Duration| {
            Duration::from_millis(read_u64(lookup, key, fallback.as_millis() as u64))
        };
        Self {
            timeout: millis("GARDEN_RETRY_TIMEOUT_MS", default.timeout),
            max_retries: read_u64(lookup, "GARDEN_RETRY_MAX_RETRIES", default.max_retries as u64)
                as usize,
            base_delay: millis("GARDEN_RETRY_BASE_DELAY_MS", default.base_delay),
            max_delay: millis("GARDEN_RETRY_MAX_DELAY_MS", default.max_delay),
            jitter_ms: read_u64(lookup, "GARDEN_RETRY_JITTER_MS", default.jitter_ms),
        }
    }

    /// Single attempt, no backoff
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            jitter_ms: 0,
            ..Self::default()
        }
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let backoff = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt as u32));
        let capped = std::cmp::min(backoff, self.max_delay);
        let jitter = if self.jitter_ms == 0 {
            Duration::from_millis(0)
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=self.jitter_ms))
        };
        capped + jitter
    }
}

pub(crate) fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

pub(crate) fn read_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str, fallback: u64) -> u64 {
    lookup(key)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(fallback)
}

/// Run `action` until it succeeds, fails with a non-transient error, or retries run out.
/// A timed-out attempt is reported as `on_timeout(label)`.
pub async fn retry_with_backoff<T, F, Fut>(
    label: &'static str,
    config: &RetryConfig,
    on_timeout: fn(String) -> SwapError,
    mut action: F,
) -> Result<T, SwapError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, SwapError>>,
{
    let attempts = config.max_retries.saturating_add(1);
    for attempt in 0..attempts {
        let err = match timeout(config.timeout, action()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => err,
            Err(_) => on_timeout(format!("{label} timed out after {:?}", config.timeout)),
        };

        if !err.is_transient() || attempt + 1 >= attempts {
            return Err(err);
        }
        warn!(attempt = attempt + 1, error = %err, "{label} failed; retrying");

        sleep(config.backoff(attempt)).await;
    }

    Err(on_timeout(format!("{label} retry exhausted")))
}
