//! Search orchestration module
//!
//! Runs a query across the configured engines in batches, merges and
//! de-duplicates their results, and caches the final set.

mod merge;
mod models;
mod orchestrator;

pub use merge::{clean_url, ResultMerger};
pub use models::*;
pub use orchestrator::{SearchOrchestrator, SearchOrchestratorBuilder};
