//! phone-recon: concurrent multi-engine web search for a phone number
//!
//! Queries several external search engines in rate-limited, retried,
//! timeout-bounded batches, merges their result URLs into one
//! de-duplicated set, caches it on disk and categorizes it.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod engines;
pub mod error;
pub mod metrics;
pub mod network;
pub mod output;
pub mod query;
pub mod resilience;
pub mod resources;
pub mod search;

pub use analysis::{AnalysisReport, Category, ResultAnalyzer};
pub use cache::Cache;
pub use config::Settings;
pub use engines::EngineAdapter;
pub use error::FetchError;
pub use query::PhoneQuery;
pub use search::{ResultSet, SearchOrchestrator};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Analyze a result set with the default rules
pub fn analyze(results: &ResultSet) -> AnalysisReport {
    ResultAnalyzer::new().analyze(results)
}
