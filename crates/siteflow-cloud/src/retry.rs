//! Retry-poll helpers for eventually consistent provider operations
//!
//! Right after creation a provider may still answer "not found" for a bucket,
//! distribution or certificate. These helpers re-run an operation on a fixed
//! delay until it succeeds, and give up with [`CloudError::Timeout`] once the
//! attempt budget is spent.

use crate::error::{CloudError, Result};
use crate::provider::RetryConfig;
use std::future::Future;
use tokio::time::sleep;

/// Re-run `op` while it fails with an error accepted by `is_pending`.
///
/// Any other error is returned immediately.
pub async fn await_ready<T, F, Fut, P>(
    operation: &str,
    retry: &RetryConfig,
    mut op: F,
    is_pending: P,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&CloudError) -> bool,
{
    let attempts = retry.max_attempts.max(1);
    for attempt in 0..attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if is_pending(&e) => {
                tracing::debug!(
                    "{} not ready (attempt {}/{}): {}",
                    operation,
                    attempt + 1,
                    attempts,
                    e
                );
                if attempt + 1 < attempts {
                    sleep(retry.delay_for_attempt(attempt)).await;
                }
            }
            Err(e) => return Err(e),
        }
    }

    Err(CloudError::Timeout {
        operation: operation.to_string(),
        attempts,
    })
}

/// Re-run `op` until its value satisfies `done`.
pub async fn poll_until<T, F, Fut, D>(
    operation: &str,
    retry: &RetryConfig,
    mut op: F,
    done: D,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    D: Fn(&T) -> bool,
{
    let attempts = retry.max_attempts.max(1);
    for attempt in 0..attempts {
        let value = op().await?;
        if done(&value) {
            return Ok(value);
        }
        tracing::debug!("{} still pending (attempt {}/{})", operation, attempt + 1, attempts);
        if attempt + 1 < attempts {
            sleep(retry.delay_for_attempt(attempt)).await;
        }
    }

    Err(CloudError::Timeout {
        operation: operation.to_string(),
        attempts,
    })
}
