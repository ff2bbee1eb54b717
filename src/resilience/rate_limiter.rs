//! Sliding-window rate limiter with a burst cap

use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

const WINDOW: Duration = Duration::from_secs(1);

/// Limits outbound calls to `burst_limit` per rolling second.
///
/// `calls_per_second` is kept for reporting; the enforced cap is the burst
/// limit. Waiters are served in the order they reach the internal lock.
#[derive(Debug)]
pub struct RateLimiter {
    calls_per_second: f64,
    burst_limit: usize,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(calls_per_second: f64, burst_limit: usize) -> Self {
        Self {
            calls_per_second,
            burst_limit: burst_limit.max(1),
            calls: Mutex::new(VecDeque::with_capacity(burst_limit.max(1))),
        }
    }

    pub fn calls_per_second(&self) -> f64 {
        self.calls_per_second
    }

    pub fn burst_limit(&self) -> usize {
        self.burst_limit
    }

    /// Wait until one more call is permitted, then record it.
    pub async fn acquire(&self) {
        let mut calls = self.calls.lock().await;
        let now = Instant::now();
        prune(&mut calls, now);

        if calls.len() >= self.burst_limit {
            if let Some(&oldest) = calls.front() {
                let resume_at = oldest + WINDOW;
                debug!(
                    "Rate limit reached, waiting {} ms",
                    resume_at.saturating_duration_since(now).as_millis()
                );
                sleep_until(resume_at).await;
                prune(&mut calls, Instant::now());
            }
        }

        calls.push_back(Instant::now());
    }

    /// Acquire a slot, then run `op`.
    pub async fn execute<F, T>(&self, op: F) -> T
    where
        F: Future<Output = T>,
    {
        self.acquire().await;
        op.await
    }

    /// Number of calls recorded in the current window.
    pub async fn in_window(&self) -> usize {
        let mut calls = self.calls.lock().await;
        prune(&mut calls, Instant::now());
        calls.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(1.0, 3)
    }
}

fn prune(calls: &mut VecDeque<Instant>, now: Instant) {
    while let Some(&front) = calls.front() {
        if now.duration_since(front) >= WINDOW {
            calls.pop_front();
        } else {
            break;
        }
    }
}
