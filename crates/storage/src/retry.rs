//! Fixed-delay retry combinator for transfer stages.

use std::future::Future;

use tracing::warn;

use crate::error::StorageError;
use crate::types::RetrySettings;

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent.
///
/// `op` receives the 1-based attempt number. Between attempts the task
/// sleeps for `settings.delay`.
///
/// # Arguments
/// * `settings` - Attempt budget and delay
/// * `operation` - Label used in log events
/// * `op` - Closure producing one attempt
pub async fn retry_with_fixed_delay<T, F, Fut>(
    settings: &RetrySettings,
    operation: &str,
    mut op: F,
) -> Result<T, StorageError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, StorageError>>,
{
    let max_attempts: u32 = settings.max_attempts.max(1);
    let mut attempt: u32 = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && err.is_retryable() => {
                warn!(operation, attempt, error = %err, "attempt failed, retrying");
                tokio::time::sleep(settings.delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
