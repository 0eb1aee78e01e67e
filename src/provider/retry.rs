//! Retry policy for provider CLI invocations.
//!
//! Only spawn errors and non-zero exits are retried. Timeouts and
//! cancellations surface immediately.

use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::warn;

use crate::cancel::CancelToken;
use crate::error::ProviderError;

/// Configuration: 2 total attempts, base 1s, max 5s.
pub const MAX_ATTEMPTS: u32 = 2;
const INITIAL_INTERVAL_SECS: u64 = 1;
const MAX_INTERVAL_SECS: u64 = 5;

/// Retry an async provider operation with exponential backoff.
///
/// The backoff sleep races the cancel token, so a user abort during the
/// wait returns promptly instead of burning another attempt.
pub(crate) async fn retry_transient<T, Fut, F>(
    cancel: &CancelToken,
    mut attempt: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut backoff = ExponentialBackoff {
        initial_interval: Duration::from_secs(INITIAL_INTERVAL_SECS),
        max_interval: Duration::from_secs(MAX_INTERVAL_SECS),
        max_elapsed_time: None, // We control retries manually
        ..Default::default()
    };

    let mut attempts = 0;
    loop {
        attempts += 1;

        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) if attempts >= MAX_ATTEMPTS => {
                return Err(ProviderError::RetriesExhausted(Box::new(e)));
            }
            Err(e) => {
                warn!("Provider attempt {attempts} failed: {e}; retrying");
                if let Some(wait) = backoff.next_backoff() {
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
                        _ = tokio::time::sleep(wait) => {}
                    }
                }
            }
        }
    }
}
