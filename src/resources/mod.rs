//! Process memory pressure checks between search batches

use crate::cache::Cache;
use crate::config::ResourceSettings;
use std::fs;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Source of the process's memory usage, as a percent of total memory
pub trait MemorySampler: Send + Sync {
    /// `None` when the value cannot be determined
    fn memory_percent(&self) -> Option<f64>;
}

/// Reads resident set size and total memory from procfs (Linux)
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcMemorySampler;

impl MemorySampler for ProcMemorySampler {
    fn memory_percent(&self) -> Option<f64> {
        let status = fs::read_to_string("/proc/self/status").ok()?;
        let meminfo = fs::read_to_string("/proc/meminfo").ok()?;
        let rss = kb_field(&status, "VmRSS:")?;
        let total = kb_field(&meminfo, "MemTotal:")?;
        if total == 0 {
            return None;
        }
        Some(rss as f64 / total as f64 * 100.0)
    }
}

/// Value in kB of a `Name:   1234 kB` procfs line
fn kb_field(contents: &str, name: &str) -> Option<u64> {
    contents
        .lines()
        .find_map(|line| line.strip_prefix(name))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|value| value.parse().ok())
}

type CleanupHook = Box<dyn Fn() + Send + Sync>;

/// Samples memory and runs a cleanup hook above a threshold
///
/// Never blocks and never fails: a sampling error reads as no pressure.
pub struct ResourcePressureMonitor {
    threshold: f64,
    sampler: Box<dyn MemorySampler>,
    cleanup: Option<CleanupHook>,
    triggered: AtomicU64,
}

impl ResourcePressureMonitor {
    pub fn new(threshold: f64) -> Self {
        Self::with_sampler(threshold, ProcMemorySampler)
    }

    pub fn with_sampler(threshold: f64, sampler: impl MemorySampler + 'static) -> Self {
        Self {
            threshold,
            sampler: Box::new(sampler),
            cleanup: None,
            triggered: AtomicU64::new(0),
        }
    }

    /// Hook run when the threshold is exceeded
    pub fn on_pressure(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.cleanup = Some(Box::new(hook));
        self
    }

    /// Monitor whose cleanup drops the cache's in-memory front
    pub fn from_settings(settings: &ResourceSettings, cache: Option<Arc<Cache>>) -> Self {
        let monitor = Self::new(settings.memory_threshold);
        match cache {
            Some(cache) => monitor.on_pressure(move || cache.clear_memory()),
            None => monitor,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Times the threshold has been exceeded
    pub fn trigger_count(&self) -> u64 {
        self.triggered.load(Ordering::Relaxed)
    }

    /// Returns `true` when usage is above the threshold (cleanup has run)
    pub fn check(&self) -> bool {
        let Some(percent) = self.sampler.memory_percent() else {
            debug!("Memory usage unavailable, assuming no pressure");
            return false;
        };

        if percent <= self.threshold {
            return false;
        }

        info!(
            "Memory usage {:.1}% above threshold {:.1}%, performing cleanup",
            percent, self.threshold
        );
        self.triggered.fetch_add(1, Ordering::Relaxed);
        if let Some(cleanup) = &self.cleanup {
            cleanup();
        }
        true
    }
}

impl Default for ResourcePressureMonitor {
    fn default() -> Self {
        Self::new(ResourceSettings::default().memory_threshold)
    }
}

impl std::fmt::Debug for ResourcePressureMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourcePressureMonitor")
            .field("threshold", &self.threshold)
            .field("triggered", &self.trigger_count())
            .finish()
    }
}
