//! Persistent, namespaced cache with time-based expiry
//!
//! Each namespace is one JSON file in the cache directory holding
//! `{key: {timestamp, data}}`. Every write rewrites the whole file. A
//! bounded in-memory front (moka) saves re-reading the file; expiry is
//! always judged from the stored timestamp, never from the front.
//!
//! The cache is best-effort: read failures look like misses and write
//! failures are reported but never raised.

use crate::config::{CacheSettings, ConfigError};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Namespace used for search result sets
pub const SEARCH_NAMESPACE: &str = "search";

/// Default entry lifetime
pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// One stored value with its creation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub timestamp: String,
    pub data: serde_json::Value,
}

impl CacheEntry {
    fn new(data: serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            data,
        }
    }

    /// Parse the stored timestamp: RFC 3339, or a naive ISO-8601 local time.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
            .map(|ts| ts.with_timezone(&Utc))
    }
}

type NamespaceFile = HashMap<String, CacheEntry>;

/// Outcome of a cache read
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    Hit(T),
    /// No store for the namespace, or no entry for the key
    Miss,
    /// Entry exists but is older than the TTL
    Expired,
    /// Store or entry could not be read or decoded
    Unreadable(String),
}

impl<T> CacheLookup<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Hit(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// Outcome of a cache write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheWrite {
    Stored,
    Failed(String),
}

/// File-backed cache with per-namespace write serialization
pub struct Cache {
    directory: PathBuf,
    ttl: chrono::Duration,
    memory: moka::future::Cache<(String, String), CacheEntry>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Cache {
    /// Create a cache in `directory` with the default 7 day TTL
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self::with_ttl(directory, DEFAULT_TTL, 1000)
    }

    pub fn with_ttl(directory: impl Into<PathBuf>, ttl: Duration, memory_capacity: u64) -> Self {
        Self {
            directory: directory.into(),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(7)),
            memory: moka::future::Cache::builder()
                .max_capacity(memory_capacity)
                .build(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Result<Self, ConfigError> {
        Ok(Self::with_ttl(
            settings.directory.clone(),
            settings.ttl()?,
            settings.memory_capacity,
        ))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the backing file for a namespace
    pub fn namespace_path(&self, namespace: &str) -> Option<PathBuf> {
        let valid = !namespace.is_empty()
            && namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        valid.then(|| self.directory.join(format!("{namespace}.json")))
    }

    /// Look up `key`, distinguishing every way of not getting a value
    pub async fn lookup<T: DeserializeOwned>(&self, key: &str, namespace: &str) -> CacheLookup<T> {
        let memory_key = (namespace.to_string(), key.to_string());
        let entry = match self.memory.get(&memory_key).await {
            Some(entry) => entry,
            None => match self.read_entry(key, namespace).await {
                Ok(Some(entry)) => {
                    self.memory.insert(memory_key, entry.clone()).await;
                    entry
                }
                Ok(None) => return CacheLookup::Miss,
                Err(e) => {
                    debug!("Cache store {} unreadable: {}", namespace, e);
                    return CacheLookup::Unreadable(e.to_string());
                }
            },
        };

        let Some(created) = entry.created_at() else {
            return CacheLookup::Unreadable(format!("bad timestamp {:?}", entry.timestamp));
        };
        if Utc::now() - created >= self.ttl {
            return CacheLookup::Expired;
        }

        match serde_json::from_value(entry.data) {
            Ok(value) => CacheLookup::Hit(value),
            Err(e) => CacheLookup::Unreadable(e.to_string()),
        }
    }

    /// Get a live value for `key`, or `None`
    pub async fn get<T: DeserializeOwned>(&self, key: &str, namespace: &str) -> Option<T> {
        self.lookup(key, namespace).await.into_option()
    }

    /// Store `data` under `key`, keeping every other key in the namespace
    pub async fn set<T: Serialize>(&self, key: &str, data: &T, namespace: &str) -> CacheWrite {
        let Some(path) = self.namespace_path(namespace) else {
            return CacheWrite::Failed(format!("invalid namespace {namespace:?}"));
        };
        let value = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => return CacheWrite::Failed(e.to_string()),
        };

        let lock = self.namespace_lock(namespace);
        let _guard = lock.lock().await;

        let mut entries = match read_namespace(&path).await {
            Ok(entries) => entries.unwrap_or_default(),
            Err(StoreError::Corrupt(e)) => {
                warn!("Discarding corrupt cache store {}: {}", namespace, e);
                NamespaceFile::new()
            }
            Err(e) => {
                warn!("Leaving cache store {} untouched: {}", namespace, e);
                return CacheWrite::Failed(e.to_string());
            }
        };
        let entry = CacheEntry::new(value);
        entries.insert(key.to_string(), entry.clone());

        if let Err(e) = write_namespace(&self.directory, &path, &entries).await {
            warn!("Failed to write cache store {}: {}", namespace, e);
            return CacheWrite::Failed(e.to_string());
        }

        self.memory
            .insert((namespace.to_string(), key.to_string()), entry)
            .await;
        CacheWrite::Stored
    }

    /// Drop the in-memory front; the files are untouched
    pub fn clear_memory(&self) {
        self.memory.invalidate_all();
    }

    async fn read_entry(
        &self,
        key: &str,
        namespace: &str,
    ) -> Result<Option<CacheEntry>, StoreError> {
        let Some(path) = self.namespace_path(namespace) else {
            return Err(StoreError::InvalidNamespace(namespace.to_string()));
        };
        Ok(read_namespace(&path)
            .await?
            .and_then(|mut entries| entries.remove(key)))
    }

    fn namespace_lock(&self, namespace: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(namespace.to_string()).or_default())
    }
}

/// Why a namespace file could not be read
#[derive(Debug, Error)]
enum StoreError {
    #[error("invalid namespace {0:?}")]
    InvalidNamespace(String),
    #[error("failed to read cache store: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt cache store: {0}")]
    Corrupt(#[from] serde_json::Error),
}

async fn read_namespace(path: &Path) -> Result<Option<NamespaceFile>, StoreError> {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_slice(&content)?))
}

async fn write_namespace(
    directory: &Path,
    path: &Path,
    entries: &NamespaceFile,
) -> std::io::Result<()> {
    tokio::fs::create_dir_all(directory).await?;
    let json = serde_json::to_vec(entries)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache() -> (tempfile::TempDir, Cache) {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = Cache::new(dir.path().join("cache"));
        (dir, cache)
    }

    #[tokio::test]
    async fn test_missing_store_is_miss() {
        let (_dir, cache) = temp_cache();
        let lookup: CacheLookup<Vec<String>> = cache.lookup("q", SEARCH_NAMESPACE).await;
        assert_eq!(lookup, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let (_dir, cache) = temp_cache();
        let urls = vec!["https://a.com".to_string()];
        assert_eq!(cache.set("q", &urls, SEARCH_NAMESPACE).await, CacheWrite::Stored);

        let cached: Option<Vec<String>> = cache.get("q", SEARCH_NAMESPACE).await;
        assert_eq!(cached, Some(urls));
    }

    #[tokio::test]
    async fn test_set_preserves_other_keys() {
        let (dir, cache) = temp_cache();
        cache.set("a", &1u32, SEARCH_NAMESPACE).await;
        cache.set("b", &2u32, SEARCH_NAMESPACE).await;
        cache.set("a", &3u32, SEARCH_NAMESPACE).await;

        // A fresh instance has an empty memory front and must read the file
        let reopened = Cache::new(dir.path().join("cache"));
        assert_eq!(reopened.get::<u32>("a", SEARCH_NAMESPACE).await, Some(3));
        assert_eq!(reopened.get::<u32>("b", SEARCH_NAMESPACE).await, Some(2));
    }

    #[tokio::test]
    async fn test_namespaces_are_separate_files() {
        let (dir, cache) = temp_cache();
        cache.set("k", &"search", SEARCH_NAMESPACE).await;
        cache.set("k", &"social", "social").await;

        assert!(dir.path().join("cache/search.json").exists());
        assert!(dir.path().join("cache/social.json").exists());
        assert_eq!(
            cache.get::<String>("k", "social").await.as_deref(),
            Some("social")
        );
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent() {
        let (dir, _) = temp_cache();
        let cache_dir = dir.path().join("cache");
        std::fs::create_dir_all(&cache_dir).unwrap();

        let old = (Utc::now() - chrono::Duration::days(8)).to_rfc3339();
        let file = serde_json::json!({
            "q": { "timestamp": old, "data": ["https://stale.com"] }
        });
        std::fs::write(cache_dir.join("search.json"), file.to_string()).unwrap();

        let cache = Cache::new(&cache_dir);
        let lookup: CacheLookup<Vec<String>> = cache.lookup("q", SEARCH_NAMESPACE).await;
        assert_eq!(lookup, CacheLookup::Expired);
        assert!(cache.get::<Vec<String>>("q", SEARCH_NAMESPACE).await.is_none());
    }

    #[tokio::test]
    async fn test_naive_local_timestamp_is_accepted() {
        let (dir, _) = temp_cache();
        let cache_dir = dir.path().join("cache");
        std::fs::create_dir_all(&cache_dir).unwrap();

        let recent = Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f");
        let file = serde_json::json!({
            "q": { "timestamp": recent.to_string(), "data": 5 }
        });
        std::fs::write(cache_dir.join("search.json"), file.to_string()).unwrap();

        let cache = Cache::new(&cache_dir);
        assert_eq!(cache.get::<u32>("q", SEARCH_NAMESPACE).await, Some(5));
    }

    #[tokio::test]
    async fn test_corrupt_store_is_unreadable_then_overwritten() {
        let (dir, _) = temp_cache();
        let cache_dir = dir.path().join("cache");
        std::fs::create_dir_all(&cache_dir).unwrap();
        std::fs::write(cache_dir.join("search.json"), "{not json").unwrap();

        let cache = Cache::new(&cache_dir);
        let lookup: CacheLookup<u32> = cache.lookup("q", SEARCH_NAMESPACE).await;
        assert!(matches!(lookup, CacheLookup::Unreadable(_)));

        assert_eq!(cache.set("q", &9u32, SEARCH_NAMESPACE).await, CacheWrite::Stored);
        let reopened = Cache::new(&cache_dir);
        assert_eq!(reopened.get::<u32>("q", SEARCH_NAMESPACE).await, Some(9));
    }

    #[tokio::test]
    async fn test_unreadable_store_is_left_untouched() {
        let (dir, _) = temp_cache();
        let cache_dir = dir.path().join("cache");
        // A directory where the namespace file should be cannot be read
        std::fs::create_dir_all(cache_dir.join("search.json")).unwrap();

        let cache = Cache::new(&cache_dir);
        let write = cache.set("q", &1u32, SEARCH_NAMESPACE).await;
        assert!(matches!(write, CacheWrite::Failed(_)));
        assert!(cache_dir.join("search.json").is_dir());
        assert!(!cache_dir.join("search.json.tmp").exists());
        assert_eq!(cache.get::<u32>("q", SEARCH_NAMESPACE).await, None);
    }

    #[tokio::test]
    async fn test_unwritable_directory_fails_softly() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        // A regular file where the cache directory should be
        let cache = Cache::new(&blocker);
        let write = cache.set("q", &1u32, SEARCH_NAMESPACE).await;
        assert!(matches!(write, CacheWrite::Failed(_)));
    }

    #[tokio::test]
    async fn test_invalid_namespace_rejected() {
        let (_dir, cache) = temp_cache();
        assert!(matches!(
            cache.set("q", &1u32, "../escape").await,
            CacheWrite::Failed(_)
        ));
        let lookup: CacheLookup<u32> = cache.lookup("q", "../escape").await;
        assert!(matches!(lookup, CacheLookup::Unreadable(_)));
    }

    #[tokio::test]
    async fn test_concurrent_writes_to_one_namespace_keep_all_keys() {
        let (dir, cache) = temp_cache();
        let cache = Arc::new(cache);

        let writes = (0..10).map(|i| {
            let cache = Arc::clone(&cache);
            async move { cache.set(&format!("k{i}"), &i, SEARCH_NAMESPACE).await }
        });
        let results = futures::future::join_all(writes).await;
        assert!(results.iter().all(|r| *r == CacheWrite::Stored));

        let reopened = Cache::new(dir.path().join("cache"));
        for i in 0..10 {
            assert_eq!(reopened.get::<i32>(&format!("k{i}"), SEARCH_NAMESPACE).await, Some(i));
        }
    }
}
