use crate::config::RetryConfig;
use crate::types::{ReviewError, Result};
use backoff::{backoff::Backoff, exponential::ExponentialBackoff, SystemClock};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Run `operation` until it succeeds or the attempt budget is spent.
///
/// Waits between attempts start at `initial_delay_ms` and double each time, the
/// last error is returned once every attempt has failed.
pub async fn retry_with_backoff<T, F, Fut>(config: &RetryConfig, operation_name: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut backoff = exponential_backoff(config);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(value);
            }
            Err(e) => {
                if attempt < max_attempts {
                    if let Some(delay) = backoff.next_backoff() {
                        warn!("Attempt {} of {} failed, retrying in {:?}: {}", attempt, operation_name, delay, e);
                        tokio::time::sleep(delay).await;
                    }
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ReviewError::General(format!("{} was never attempted", operation_name))))
}

fn exponential_backoff(config: &RetryConfig) -> ExponentialBackoff<SystemClock> {
    let initial = config.initial_delay();
    ExponentialBackoff {
        current_interval: initial,
        initial_interval: initial,
        randomization_factor: 0.0,
        multiplier: 2.0,
        max_interval: initial.saturating_mul(32).max(Duration::from_millis(1)),
        max_elapsed_time: None,
        ..Default::default()
    }
}
