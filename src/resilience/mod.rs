//! Resilience primitives for upstream fetches
//!
//! Each primitive exposes an `execute`-style wrapper; [`ResilienceStack`]
//! composes them in a fixed order: retry around {rate limit, then timeout}.
//! Session pooling lives in the HTTP layer, inside the timeout.

mod pool;
mod rate_limiter;
mod retry;
mod timeout;

pub use pool::{ConnectionPool, PooledSession};
pub use rate_limiter::RateLimiter;
pub use retry::RetryPolicy;
pub use timeout::{Elapsed, TimeoutGuard};

use crate::config::{ConfigError, Settings};
use crate::error::FetchError;
use std::future::Future;
use std::sync::Arc;

/// Retry, rate limiting and timeout composed for one fetch.
#[derive(Clone)]
pub struct ResilienceStack {
    rate_limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    timeout: TimeoutGuard,
}

impl ResilienceStack {
    pub fn new(rate_limiter: Arc<RateLimiter>, retry: RetryPolicy, timeout: TimeoutGuard) -> Self {
        Self {
            rate_limiter,
            retry,
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let outgoing = &settings.outgoing;
        Ok(Self::new(
            Arc::new(RateLimiter::new(
                settings.rate_limit.calls_per_second,
                settings.rate_limit.burst_limit,
            )),
            RetryPolicy::new(
                outgoing.retries,
                outgoing.retry_delay_duration()?,
                outgoing.retry_backoff,
            ),
            TimeoutGuard::new(outgoing.request_timeout_duration()?),
        ))
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn timeout(&self) -> &TimeoutGuard {
        &self.timeout
    }

    /// Run `op` once per attempt: every attempt waits for the rate limiter
    /// and is bounded by the timeout; failed attempts back off and retry.
    pub async fn execute<F, Fut, T>(&self, op: F) -> Result<T, FetchError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let op = &op;
        let rate_limiter = &self.rate_limiter;
        let timeout = self.timeout;
        self.retry
            .run_if(
                move || async move {
                    rate_limiter.acquire().await;
                    timeout.execute(op()).await
                },
                FetchError::is_retryable,
            )
            .await
    }
}

impl Default for ResilienceStack {
    fn default() -> Self {
        Self::new(
            Arc::new(RateLimiter::new(0.5, 3)),
            RetryPolicy::default(),
            TimeoutGuard::default(),
        )
    }
}
