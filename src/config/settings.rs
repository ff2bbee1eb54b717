//! Settings structures for phone-recon configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid setting {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Main settings structure loaded from settings.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub search: SearchSettings,
    pub outgoing: OutgoingSettings,
    pub rate_limit: RateLimitSettings,
    pub cache: CacheSettings,
    pub resources: ResourceSettings,
    pub output: OutputSettings,
    pub engines: Vec<EngineConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search: SearchSettings::default(),
            outgoing: OutgoingSettings::default(),
            rate_limit: RateLimitSettings::default(),
            cache: CacheSettings::default(),
            resources: ResourceSettings::default(),
            output: OutputSettings::default(),
            engines: default_engines(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (PHONE_RECON_* prefix)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("PHONE_RECON_CACHE_DIR") {
            self.cache.directory = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("PHONE_RECON_OUTPUT_DIR") {
            self.output.directory = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("PHONE_RECON_BATCH_SIZE") {
            if let Ok(size) = val.parse() {
                self.search.batch_size = size;
            }
        }
        if let Ok(val) = std::env::var("PHONE_RECON_TIMEOUT") {
            if let Ok(timeout) = val.parse() {
                self.outgoing.request_timeout = timeout;
            }
        }
        if let Ok(val) = std::env::var("PHONE_RECON_PROXY") {
            self.outgoing.proxies = val
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }
    }

    /// Get engine config by name
    pub fn get_engine(&self, name: &str) -> Option<&EngineConfig> {
        self.engines.iter().find(|e| e.name == name)
    }

    /// Get all enabled engines, in configured order
    pub fn enabled_engines(&self) -> Vec<&EngineConfig> {
        self.engines.iter().filter(|e| !e.disabled).collect()
    }

    /// Reject settings that indicate misconfiguration rather than upstream trouble
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.batch_size == 0 {
            return Err(ConfigError::invalid("search.batch_size", "must be > 0"));
        }
        if self.search.max_results == 0 {
            return Err(ConfigError::invalid("search.max_results", "must be > 0"));
        }
        if self.outgoing.retries == 0 {
            return Err(ConfigError::invalid("outgoing.retries", "must be > 0"));
        }
        let timeout = self.outgoing.request_timeout_duration()?;
        if timeout.is_zero() {
            return Err(ConfigError::invalid(
                "outgoing.request_timeout",
                "must be > 0",
            ));
        }
        self.outgoing.retry_delay_duration()?;
        if self.outgoing.retry_backoff < 1.0 {
            return Err(ConfigError::invalid("outgoing.retry_backoff", "must be >= 1"));
        }
        if self.outgoing.pool_size == 0 {
            return Err(ConfigError::invalid("outgoing.pool_size", "must be > 0"));
        }
        if self.rate_limit.burst_limit == 0 {
            return Err(ConfigError::invalid("rate_limit.burst_limit", "must be > 0"));
        }
        self.cache.ttl()?;
        if self.enabled_engines().is_empty() {
            return Err(ConfigError::invalid("engines", "no enabled engines"));
        }
        for engine in &self.engines {
            if engine.name.is_empty() {
                return Err(ConfigError::invalid("engines.name", "must not be empty"));
            }
        }
        Ok(())
    }
}

/// Search orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Number of engines fetched concurrently per batch
    pub batch_size: usize,
    /// Maximum number of URLs kept in a result set
    pub max_results: usize,
    /// Pause between batches in milliseconds
    pub batch_pause_ms: u64,
    /// URLs containing any of these substrings (case-insensitive) are dropped
    pub blacklist: Vec<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            batch_size: 3,
            max_results: 20,
            batch_pause_ms: 500,
            blacklist: vec![
                "google.".to_string(),
                "bing.".to_string(),
                "facebook.".to_string(),
                "youtube.".to_string(),
                "yandex.".to_string(),
                "baidu.".to_string(),
                "searx.".to_string(),
            ],
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Per-attempt timeout in seconds
    pub request_timeout: f64,
    /// Total attempts per engine fetch
    pub retries: u32,
    /// Initial retry delay in seconds
    pub retry_delay: f64,
    /// Multiplier applied to the delay after each failed attempt
    pub retry_backoff: f64,
    /// Maximum number of live HTTP sessions
    pub pool_size: usize,
    /// Proxies rotated across requests (empty = direct)
    pub proxies: Vec<String>,
    /// Fixed user agent (none = rotate)
    pub useragent: Option<String>,
    /// Accept-Language header value
    pub accept_language: String,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl OutgoingSettings {
    pub fn request_timeout_duration(&self) -> Result<Duration, ConfigError> {
        seconds_to_duration("outgoing.request_timeout", self.request_timeout)
    }

    pub fn retry_delay_duration(&self) -> Result<Duration, ConfigError> {
        seconds_to_duration("outgoing.retry_delay", self.retry_delay)
    }
}

/// Negative, NaN, infinite and out-of-range values are rejected
fn seconds_to_duration(field: &str, seconds: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(seconds)
        .map_err(|e| ConfigError::invalid(field, format!("{seconds} seconds: {e}")))
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 30.0,
            retries: 3,
            retry_delay: 1.0,
            retry_backoff: 2.0,
            pool_size: 5,
            proxies: Vec::new(),
            useragent: None,
            accept_language: "en-US,en;q=0.5".to_string(),
            verify_ssl: true,
            extra_headers: HashMap::new(),
        }
    }
}

/// Outbound rate limiting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Intended steady-state rate (informational)
    pub calls_per_second: f64,
    /// Hard cap on calls per rolling second
    pub burst_limit: usize,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            calls_per_second: 0.5,
            burst_limit: 3,
        }
    }
}

/// Persistent cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Directory holding one JSON file per namespace
    pub directory: PathBuf,
    /// Entry time-to-live in days
    pub ttl_days: u64,
    /// Entries kept in the in-memory front
    pub memory_capacity: u64,
}

impl CacheSettings {
    /// Entry time-to-live; must fit both `std` and `chrono` durations
    pub fn ttl(&self) -> Result<Duration, ConfigError> {
        self.ttl_days
            .checked_mul(24 * 60 * 60)
            .map(Duration::from_secs)
            .filter(|ttl| chrono::Duration::from_std(*ttl).is_ok())
            .ok_or_else(|| ConfigError::invalid("cache.ttl_days", "too large"))
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: default_data_dir().join("cache"),
            ttl_days: 7,
            memory_capacity: 1000,
        }
    }
}

/// Resource pressure settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSettings {
    /// Memory usage percentage that triggers cleanup
    pub memory_threshold: f64,
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            memory_threshold: 85.0,
        }
    }
}

/// Result file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory for saved result files
    pub directory: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: default_data_dir().join("results"),
        }
    }
}

/// Individual engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine name (unique identifier)
    pub name: String,
    /// Adapter type to use
    pub engine: String,
    /// Endpoint override (none = adapter default)
    pub endpoint: Option<String>,
    /// Whether engine is disabled
    pub disabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            engine: String::new(),
            endpoint: None,
            disabled: false,
        }
    }
}

impl EngineConfig {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            engine: name.clone(),
            name,
            ..Default::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join("phone-recon"))
        .unwrap_or_else(|| PathBuf::from(".phone-recon"))
}

/// Default engine configurations
fn default_engines() -> Vec<EngineConfig> {
    vec![
        EngineConfig::new("yandex"),
        EngineConfig::new("baidu"),
        EngineConfig::new("searx"),
        // Adapters ship, but these engines block scrapers aggressively.
        EngineConfig::new("google").disabled(),
        EngineConfig::new("bing").disabled(),
    ]
}
