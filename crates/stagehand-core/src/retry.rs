//! Fixed-backoff retry for bootstrap operations
//!
//! Deployment steps are never retried. This is only used while waiting for
//! infrastructure to come up (e.g. the database accepting connections).

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// How often and how far apart to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(1),
        }
    }
}

/// Run `op` until it succeeds or the policy is exhausted
///
/// Returns the last error once all attempts have failed.
pub async fn retry_fixed<F, Fut, T, E>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded after {} attempts", what, attempt);
                }
                return Ok(value);
            }
            Err(err) if attempt >= max_attempts => return Err(err),
            Err(err) => {
                warn!(
                    "{} failed (attempt {}/{}): {}",
                    what, attempt, max_attempts, err
                );
                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
                attempt += 1;
            }
        }
    }
}
