//! Metrics collection module
//!
//! Tracks per-engine fetch outcomes, latency and reliability.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Number of latency samples kept per engine
const LATENCY_WINDOW: usize = 100;

#[derive(Debug, Default)]
struct EngineCounters {
    attempts: u64,
    successes: u64,
    failures: u64,
    latencies_ms: Vec<u64>,
    failure_kinds: HashMap<&'static str, u64>,
}

/// Process-wide fetch metrics
pub struct Metrics {
    /// Total searches run (cache hits included)
    total_searches: AtomicU64,
    /// Searches answered from cache
    cache_hits: AtomicU64,
    engines: RwLock<HashMap<String, EngineCounters>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            total_searches: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            engines: RwLock::new(HashMap::new()),
        }
    }

    // A panicked writer leaves counters usable; metrics never poison callers.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, EngineCounters>> {
        self.engines.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, EngineCounters>> {
        self.engines.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn inc_search(&self) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the final outcome of one engine fetch
    ///
    /// `failure` is the error kind label, `None` on success.
    pub fn record_fetch(&self, engine: &str, elapsed: Duration, failure: Option<&'static str>) {
        let mut engines = self.write();
        let counters = engines.entry(engine.to_string()).or_default();
        counters.attempts += 1;

        if counters.latencies_ms.len() >= LATENCY_WINDOW {
            counters.latencies_ms.remove(0);
        }
        counters.latencies_ms.push(elapsed.as_millis() as u64);

        match failure {
            None => counters.successes += 1,
            Some(kind) => {
                counters.failures += 1;
                *counters.failure_kinds.entry(kind).or_insert(0) += 1;
            }
        }
    }

    pub fn total_searches(&self) -> u64 {
        self.total_searches.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Average latency over the retained window
    pub fn avg_latency_ms(&self, engine: &str) -> Option<u64> {
        let engines = self.read();
        engines.get(engine).and_then(|c| average(&c.latencies_ms))
    }

    /// Success percentage for an engine; 100 when nothing was recorded
    pub fn reliability(&self, engine: &str) -> f64 {
        let engines = self.read();
        engines.get(engine).map_or(100.0, reliability)
    }

    /// Snapshot of every engine seen so far, sorted by name
    pub fn engine_stats(&self) -> BTreeMap<String, EngineStats> {
        self.read()
            .iter()
            .map(|(name, c)| {
                (
                    name.clone(),
                    EngineStats {
                        attempts: c.attempts,
                        successes: c.successes,
                        failures: c.failures,
                        avg_latency_ms: average(&c.latencies_ms),
                        reliability: reliability(c),
                        failure_kinds: c
                            .failure_kinds
                            .iter()
                            .map(|(k, v)| (k.to_string(), *v))
                            .collect(),
                    },
                )
            })
            .collect()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn average(samples: &[u64]) -> Option<u64> {
    if samples.is_empty() {
        None
    } else {
        Some(samples.iter().sum::<u64>() / samples.len() as u64)
    }
}

fn reliability(c: &EngineCounters) -> f64 {
    if c.attempts == 0 {
        100.0
    } else {
        (c.successes as f64 / c.attempts as f64) * 100.0
    }
}

/// Statistics for a single engine
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub avg_latency_ms: Option<u64>,
    pub reliability: f64,
    pub failure_kinds: BTreeMap<String, u64>,
}
