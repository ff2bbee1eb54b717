//! Search result and fetch-attempt data models

use crate::error::FetchError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ordered, de-duplicated result URLs from one search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// URLs in first-discovery order
    #[serde(rename = "search_results")]
    pub urls: Vec<String>,
    /// When the set was finalized
    #[serde(rename = "search_time")]
    pub captured_at: DateTime<Utc>,
}

impl ResultSet {
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            urls,
            captured_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }
}

/// Failure kind recorded when a fetched body cannot be parsed
pub const PARSE_FAILURE: &str = "parse";

/// How a single engine fetch ended
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(String),
    Timeout,
    NetworkError(String),
    HttpStatus(u16),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Error kind label, `None` on success
    pub fn failure_kind(&self) -> Option<&'static str> {
        match self {
            Self::Success(_) => None,
            Self::Timeout => Some("timeout"),
            Self::NetworkError(_) => Some("network"),
            Self::HttpStatus(_) => Some("http_status"),
        }
    }

    /// Body on success
    pub fn into_body(self) -> Option<String> {
        match self {
            Self::Success(body) => Some(body),
            _ => None,
        }
    }
}

impl From<Result<String, FetchError>> for FetchOutcome {
    fn from(result: Result<String, FetchError>) -> Self {
        match result {
            Ok(body) => Self::Success(body),
            Err(FetchError::Timeout(_)) => Self::Timeout,
            Err(FetchError::HttpStatus(code)) => Self::HttpStatus(code),
            Err(other) => Self::NetworkError(other.to_string()),
        }
    }
}

/// One engine fetch, after retries
#[derive(Debug, Clone)]
pub struct FetchAttempt {
    pub engine: String,
    pub query: String,
    pub started: DateTime<Utc>,
    pub elapsed: Duration,
    pub outcome: FetchOutcome,
}
