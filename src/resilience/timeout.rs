//! Wall-clock bound for a single operation

use std::future::Future;
use std::time::Duration;

/// Marker returned when a guarded operation ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed {
    pub after: Duration,
}

/// Cancels the wrapped future once `duration` has passed.
///
/// Cancellation drops the future, so anything it holds (pooled sessions in
/// particular) is released before the caller sees the timeout.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutGuard {
    duration: Duration,
}

impl TimeoutGuard {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub async fn execute<F, T, E>(&self, op: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<Elapsed>,
    {
        match tokio::time::timeout(self.duration, op).await {
            Ok(result) => result,
            Err(_) => Err(Elapsed {
                after: self.duration,
            }
            .into()),
        }
    }
}

impl Default for TimeoutGuard {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;

    #[tokio::test(start_paused = true)]
    async fn test_fast_op_completes() {
        let guard = TimeoutGuard::new(Duration::from_secs(1));
        let result: Result<u8, FetchError> = guard.execute(async { Ok(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_op_times_out() {
        let guard = TimeoutGuard::new(Duration::from_secs(1));
        let result: Result<(), FetchError> = guard
            .execute(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert_eq!(result, Err(FetchError::Timeout(Duration::from_secs(1))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_inner_error_passes_through() {
        let guard = TimeoutGuard::default();
        let result: Result<(), FetchError> = guard
            .execute(async { Err(FetchError::HttpStatus(500)) })
            .await;
        assert_eq!(result, Err(FetchError::HttpStatus(500)));
    }
}
