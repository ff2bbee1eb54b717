//! Error types for upstream fetches.
//!
//! Every variant describes a single failed attempt against one engine.
//! None of them are fatal to a search run: after retries are exhausted the
//! engine simply contributes no results.

use crate::resilience::Elapsed;
use std::time::Duration;

/// Failure of a single fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The attempt exceeded its wall-clock budget.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection refused, DNS failure, reset, body read failure.
    #[error("network error: {0}")]
    Network(String),

    /// Upstream answered with anything other than 200.
    #[error("unexpected HTTP status: {0}")]
    HttpStatus(u16),

    /// A session could not be created for the connection pool.
    #[error("failed to create session: {0}")]
    Session(String),

    /// The request itself is malformed (bad URL, bad proxy).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// Transient failures are retried; malformed requests never succeed on retry.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidRequest(_))
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Network(_) => "network_error",
            Self::HttpStatus(_) => "http_status",
            Self::Session(_) => "session",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}

impl From<Elapsed> for FetchError {
    fn from(elapsed: Elapsed) -> Self {
        Self::Timeout(elapsed.after)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else if let Some(status) = err.status() {
            Self::HttpStatus(status.as_u16())
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(FetchError::HttpStatus(503).to_string(), "unexpected HTTP status: 503");
        assert_eq!(
            FetchError::Network("connection refused".into()).to_string(),
            "network error: connection refused"
        );
    }

    #[test]
    fn only_invalid_requests_are_not_retried() {
        assert!(FetchError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(FetchError::HttpStatus(429).is_retryable());
        assert!(FetchError::Network("reset".into()).is_retryable());
        assert!(!FetchError::InvalidRequest("bad url".into()).is_retryable());
    }

    #[test]
    fn elapsed_converts_to_timeout() {
        let err: FetchError = Elapsed {
            after: Duration::from_secs(30),
        }
        .into();
        assert_eq!(err, FetchError::Timeout(Duration::from_secs(30)));
        assert_eq!(err.kind(), "timeout");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FetchError>();
    }
}
