use crate::GarminError;
use rand::{RngExt, rng};
use std::time::Duration;

/// Retry policy with exponential backoff and jitter.
///
/// Only errors classified transient by [`GarminError::is_transient`] are
/// retried; a 429 with a `Retry-After` header sleeps for exactly the
/// advertised interval instead of the backoff.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    pub async fn retry_async<F, Fut, T>(&self, mut f: F) -> Result<T, GarminError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, GarminError>>,
    {
        let mut attempt = 0u32;
        loop {
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries || !e.is_transient() {
                        return Err(e);
                    }
                    let delay = match &e {
                        GarminError::RateLimited {
                            retry_after: Some(secs),
                        } => Duration::from_secs(*secs),
                        _ => {
                            // exponential backoff with jitter
                            let max_delay = self.base_delay * (1u32 << attempt);
                            let mut rng = rng();
                            let jitter = rng.random_range(0..max_delay.as_millis() as u64 + 1);
                            Duration::from_millis(jitter)
                        }
                    };
                    tracing::debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
