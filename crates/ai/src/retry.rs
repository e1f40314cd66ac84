//! Bounded exponential backoff for transient generation failures.

use std::future::Future;
use pulse_core::RetryPolicy;
use tracing::warn;

use crate::generation::{GenerationError, Result};

/// Run `op`, retrying transient failures according to `policy`.
///
/// Non-transient errors are returned immediately. After the last retry the
/// final error is returned unchanged.
pub async fn call_with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retry = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if retry < policy.max_retries && err.is_transient() => {
                let delay = policy.delay_for(retry);
                warn!(
                    "Generation quota/rate limit hit ({}). Retrying in {}ms... ({} retries left)",
                    describe(&err),
                    delay.as_millis(),
                    policy.max_retries - retry
                );
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn describe(err: &GenerationError) -> String {
    err.code().map(|c| c.to_string()).unwrap_or_else(|| err.to_string())
}
