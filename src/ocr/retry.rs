//! Retry: transport-level failures are retried with exponential backoff;
//! application-level refusals are not. `is_transient` tells the caller
//! which terminal value counts as which.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs `call` up to `retry_max` additional times after the first attempt,
/// doubling `delay` from `backoff_base` and capping at `backoff_cap`, as
/// long as `is_transient` holds of the latest result. Stops early (without
/// consuming a retry) if the job is cancelled mid-wait.
pub async fn call_with_retry<T, F, Fut>(
    retry_max: u32,
    backoff_base: Duration,
    backoff_cap: Duration,
    cancel: &CancellationToken,
    is_transient: impl Fn(&T) -> bool,
    mut call: F,
) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = T>,
{
    let mut delay = backoff_base;
    let mut attempt = 0u32;
    loop {
        let result = call().await;
        if attempt >= retry_max || !is_transient(&result) {
            return result;
        }
        attempt += 1;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return result,
            _ = tokio::time::sleep(delay) => {}
        }
        delay = (delay * 2).min(backoff_cap);
    }
}
