//! Bounded exponential-backoff retry

use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retries a fallible async operation with exponentially growing delays.
///
/// `retries` is the total number of attempts. With the defaults the delays
/// between attempts are 1s then 2s, and a third failure is returned as-is.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    retries: u32,
    delay: Duration,
    backoff: f64,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration, backoff: f64) -> Self {
        Self {
            retries: retries.max(1),
            delay,
            backoff: backoff.max(1.0),
        }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Delay slept after the attempt with the given zero-based index fails.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.delay.mul_f64(self.backoff.powi(attempt as i32))
    }

    /// Run `op`, retrying every error.
    pub async fn run<F, Fut, T, E>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        self.run_if(op, |_| true).await
    }

    /// Run `op`, retrying only errors accepted by `should_retry`.
    pub async fn run_if<F, Fut, T, E, P>(&self, mut op: F, should_retry: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let last = attempt + 1 >= self.retries;
                    if last || !should_retry(&err) {
                        return Err(err);
                    }
                    let delay = self.delay_for(attempt);
                    debug!(
                        "Attempt {}/{} failed: {}, retrying in {} ms",
                        attempt + 1,
                        self.retries,
                        err,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), 2.0)
    }
}
