//! Search orchestration across engines
//!
//! A search runs CacheCheck, then the engines in fixed-size batches
//! (concurrently within a batch), then merging and finalizing. Engine
//! failures only ever shrink the result set; a search always returns one.

use super::merge::ResultMerger;
use super::models::{FetchAttempt, FetchOutcome, ResultSet, PARSE_FAILURE};
use crate::cache::{Cache, CacheLookup, CacheWrite, SEARCH_NAMESPACE};
use crate::config::{ConfigError, Settings};
use crate::engines::{EngineLoader, EngineRegistry, RegisteredEngine};
use crate::metrics::Metrics;
use crate::network::{Fetcher, HttpClient};
use crate::resilience::ResilienceStack;
use crate::resources::ResourcePressureMonitor;
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Runs one query against every configured engine
pub struct SearchOrchestrator {
    engines: Vec<RegisteredEngine>,
    fetcher: Arc<dyn Fetcher>,
    stack: ResilienceStack,
    cache: Option<Arc<Cache>>,
    monitor: ResourcePressureMonitor,
    metrics: Arc<Metrics>,
    batch_size: usize,
    batch_pause: Duration,
    blacklist: Vec<String>,
    max_results: usize,
}

impl SearchOrchestrator {
    pub fn builder(registry: EngineRegistry, fetcher: Arc<dyn Fetcher>) -> SearchOrchestratorBuilder {
        SearchOrchestratorBuilder::new(registry, fetcher)
    }

    /// Wire the full production stack from settings
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        settings.validate()?;
        let registry = EngineLoader::load(settings)?;
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpClient::with_settings(&settings.outgoing));
        let cache = Arc::new(Cache::from_settings(&settings.cache)?);

        let orchestrator = Self::builder(registry, fetcher)
            .resilience(ResilienceStack::from_settings(settings)?)
            .monitor(ResourcePressureMonitor::from_settings(
                &settings.resources,
                Some(cache.clone()),
            ))
            .cache(cache)
            .batch_size(settings.search.batch_size)
            .batch_pause(Duration::from_millis(settings.search.batch_pause_ms))
            .blacklist(settings.search.blacklist.clone())
            .max_results(settings.search.max_results)
            .build()?;
        Ok(orchestrator)
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn engine_names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Search every engine for `query`
    ///
    /// A live cache entry for the exact query string short-circuits all
    /// fetching.
    pub async fn search(&self, query: &str) -> ResultSet {
        self.metrics.inc_search();

        if let Some(cached) = self.cached(query).await {
            info!("Returning cached results ({} urls)", cached.len());
            self.metrics.inc_cache_hit();
            return cached;
        }

        let mut merger = ResultMerger::new(&self.blacklist, self.max_results);
        let batches: Vec<&[RegisteredEngine]> = self.engines.chunks(self.batch_size).collect();

        for (index, batch) in batches.iter().enumerate() {
            info!(
                "Running batch {}/{} ({} engines)",
                index + 1,
                batches.len(),
                batch.len()
            );
            let lists = join_all(batch.iter().map(|engine| self.fetch_engine(engine, query))).await;

            for (engine, urls) in batch.iter().zip(lists) {
                let added = merger.extend(urls);
                debug!("Engine {} contributed {} new urls", engine.name, added);
            }

            if index + 1 < batches.len() {
                if self.monitor.check() {
                    info!("Memory threshold reached, cleanup performed");
                }
                tokio::time::sleep(self.batch_pause).await;
            }
        }

        let results = merger.finish();
        info!("Search finished with {} urls", results.len());

        if let Some(cache) = &self.cache {
            if let CacheWrite::Failed(reason) = cache.set(query, &results, SEARCH_NAMESPACE).await {
                warn!("Failed to cache search results: {}", reason);
            }
        }

        results
    }

    /// Search several queries and merge them under the same rules
    pub async fn search_all<S: AsRef<str>>(&self, queries: &[S]) -> ResultSet {
        let mut merger = ResultMerger::new(&self.blacklist, self.max_results);
        for query in queries {
            let results = self.search(query.as_ref()).await;
            merger.extend(results.urls);
        }
        merger.finish()
    }

    async fn cached(&self, query: &str) -> Option<ResultSet> {
        let cache = self.cache.as_ref()?;
        match cache.lookup::<ResultSet>(query, SEARCH_NAMESPACE).await {
            CacheLookup::Hit(results) => Some(results),
            CacheLookup::Miss => None,
            CacheLookup::Expired => {
                debug!("Cached results expired");
                None
            }
            CacheLookup::Unreadable(reason) => {
                debug!("Cached results unreadable: {}", reason);
                None
            }
        }
    }

    /// Fetch and parse one engine; any failure yields an empty list
    async fn fetch_engine(&self, engine: &RegisteredEngine, query: &str) -> Vec<String> {
        let url = match engine.adapter.build_url(query) {
            Ok(url) => url,
            Err(e) => {
                warn!("Failed to build request for {}: {}", engine.name, e);
                return Vec::new();
            }
        };

        debug!("Fetching {} with engine {}", url, engine.name);
        let started = Utc::now();
        let clock = Instant::now();
        let fetcher = &self.fetcher;
        let result = self.stack.execute(|| fetcher.fetch(&url)).await;

        let attempt = FetchAttempt {
            engine: engine.name.clone(),
            query: query.to_string(),
            started,
            elapsed: clock.elapsed(),
            outcome: FetchOutcome::from(result),
        };

        let body = match attempt.outcome {
            FetchOutcome::Success(body) => body,
            ref failed => {
                warn!(
                    "Engine {} failed after {:?}: {:?}",
                    attempt.engine, attempt.elapsed, failed
                );
                self.metrics
                    .record_fetch(&attempt.engine, attempt.elapsed, failed.failure_kind());
                return Vec::new();
            }
        };

        match engine.adapter.parse(&body) {
            Ok(urls) => {
                debug!("Engine {} returned {} urls", engine.name, urls.len());
                self.metrics.record_fetch(&attempt.engine, attempt.elapsed, None);
                urls
            }
            Err(e) => {
                warn!("Failed to parse response from {}: {}", engine.name, e);
                self.metrics
                    .record_fetch(&attempt.engine, attempt.elapsed, Some(PARSE_FAILURE));
                Vec::new()
            }
        }
    }
}

/// Builder that validates orchestration settings up front
pub struct SearchOrchestratorBuilder {
    registry: EngineRegistry,
    fetcher: Arc<dyn Fetcher>,
    stack: ResilienceStack,
    cache: Option<Arc<Cache>>,
    monitor: ResourcePressureMonitor,
    metrics: Arc<Metrics>,
    batch_size: usize,
    batch_pause: Duration,
    blacklist: Vec<String>,
    max_results: usize,
}

impl SearchOrchestratorBuilder {
    pub fn new(registry: EngineRegistry, fetcher: Arc<dyn Fetcher>) -> Self {
        let defaults = crate::config::SearchSettings::default();
        Self {
            registry,
            fetcher,
            stack: ResilienceStack::default(),
            cache: None,
            monitor: ResourcePressureMonitor::default(),
            metrics: Arc::new(Metrics::new()),
            batch_size: defaults.batch_size,
            batch_pause: Duration::from_millis(defaults.batch_pause_ms),
            blacklist: defaults.blacklist,
            max_results: defaults.max_results,
        }
    }

    pub fn resilience(mut self, stack: ResilienceStack) -> Self {
        self.stack = stack;
        self
    }

    pub fn cache(mut self, cache: Arc<Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn monitor(mut self, monitor: ResourcePressureMonitor) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    pub fn blacklist(mut self, blacklist: Vec<String>) -> Self {
        self.blacklist = blacklist;
        self
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn build(self) -> Result<SearchOrchestrator, ConfigError> {
        if self.registry.is_empty() {
            return Err(ConfigError::invalid("engines", "no engines registered"));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::invalid("search.batch_size", "must be > 0"));
        }
        if self.max_results == 0 {
            return Err(ConfigError::invalid("search.max_results", "must be > 0"));
        }

        Ok(SearchOrchestrator {
            engines: self.registry.engines().to_vec(),
            fetcher: self.fetcher,
            stack: self.stack,
            cache: self.cache,
            monitor: self.monitor,
            metrics: self.metrics,
            batch_size: self.batch_size,
            batch_pause: self.batch_pause,
            blacklist: self.blacklist,
            max_results: self.max_results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::EngineAdapter;
    use crate::error::FetchError;
    use crate::resilience::{RateLimiter, RetryPolicy, TimeoutGuard};
    use crate::resources::MemorySampler;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Adapter whose "body" is a newline-separated list of URLs
    struct ListEngine {
        name: &'static str,
        fail_parse: bool,
    }

    impl ListEngine {
        fn new(name: &'static str) -> Arc<dyn EngineAdapter> {
            Arc::new(Self {
                name,
                fail_parse: false,
            })
        }

        fn broken(name: &'static str) -> Arc<dyn EngineAdapter> {
            Arc::new(Self {
                name,
                fail_parse: true,
            })
        }
    }

    impl EngineAdapter for ListEngine {
        fn name(&self) -> &str {
            self.name
        }

        fn endpoint(&self) -> &str {
            "http://engines.test"
        }

        fn build_url(&self, query: &str) -> anyhow::Result<String> {
            Ok(format!("http://engines.test/{}?q={}", self.name, query))
        }

        fn parse(&self, body: &str) -> anyhow::Result<Vec<String>> {
            if self.fail_parse {
                return Err(anyhow!("unexpected markup"));
            }
            Ok(body.lines().map(str::to_string).collect())
        }
    }

    /// Fetcher that answers by engine path and records every request
    #[derive(Default)]
    struct ScriptedFetcher {
        bodies: HashMap<String, Result<String, FetchError>>,
        requests: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn respond(mut self, engine: &str, result: Result<&str, FetchError>) -> Self {
            self.bodies
                .insert(engine.to_string(), result.map(str::to_string));
            self
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            let engine = url
                .trim_start_matches("http://engines.test/")
                .split('?')
                .next()
                .unwrap_or_default();
            self.bodies
                .get(engine)
                .cloned()
                .unwrap_or(Err(FetchError::HttpStatus(404)))
        }
    }

    fn fast_stack() -> ResilienceStack {
        ResilienceStack::new(
            Arc::new(RateLimiter::new(100.0, 100)),
            RetryPolicy::new(1, Duration::ZERO, 1.0),
            TimeoutGuard::new(Duration::from_secs(5)),
        )
    }

    fn registry(adapters: Vec<Arc<dyn EngineAdapter>>) -> EngineRegistry {
        let mut registry = EngineRegistry::new();
        for adapter in adapters {
            registry.register_adapter(adapter).unwrap();
        }
        registry
    }

    fn orchestrator(
        adapters: Vec<Arc<dyn EngineAdapter>>,
        fetcher: Arc<ScriptedFetcher>,
    ) -> SearchOrchestratorBuilder {
        SearchOrchestrator::builder(registry(adapters), fetcher)
            .resilience(fast_stack())
            .batch_pause(Duration::ZERO)
            .blacklist(vec!["google.".to_string()])
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_other_engines() {
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .respond("a", Ok("http://ignored.com"))
                .respond("b", Ok("http://x.com")),
        );
        let search = orchestrator(vec![ListEngine::broken("a"), ListEngine::new("b")], fetcher)
            .build()
            .unwrap();

        let results = search.search("5550100").await;
        assert_eq!(results.urls, vec!["http://x.com"]);
    }

    #[tokio::test]
    async fn test_unparseable_body_counts_as_failure() {
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .respond("a", Ok("<html>captcha</html>"))
                .respond("b", Ok("http://x.com")),
        );
        let search = orchestrator(vec![ListEngine::broken("a"), ListEngine::new("b")], fetcher)
            .build()
            .unwrap();

        search.search("5550100").await;

        let stats = search.metrics().engine_stats();
        assert_eq!(stats["a"].attempts, 1);
        assert_eq!(stats["a"].successes, 0);
        assert_eq!(stats["a"].failures, 1);
        assert_eq!(stats["a"].failure_kinds[PARSE_FAILURE], 1);
        assert_eq!(stats["b"].successes, 1);
    }

    #[test]
    fn test_from_settings_rejects_unrepresentable_durations() {
        let mut settings = Settings::default();
        settings.outgoing.retry_delay = f64::INFINITY;
        assert!(SearchOrchestrator::from_settings(&settings).is_err());

        let mut settings = Settings::default();
        settings.outgoing.request_timeout = 1e30;
        assert!(SearchOrchestrator::from_settings(&settings).is_err());

        let mut settings = Settings::default();
        settings.cache.ttl_days = u64::MAX;
        assert!(SearchOrchestrator::from_settings(&settings).is_err());
    }

    #[tokio::test]
    async fn test_merge_follows_engine_order() {
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .respond("a", Ok("https://one.example/\nhttps://two.example/"))
                .respond("b", Ok("https://two.example/\nhttps://www.google.com/x\nhttps://three.example/"))
                .respond("c", Err(FetchError::Timeout(Duration::from_secs(30))))
                .respond("d", Ok("https://four.example/\nhttps://one.example/")),
        );
        let search = orchestrator(
            vec![
                ListEngine::new("a"),
                ListEngine::new("b"),
                ListEngine::new("c"),
                ListEngine::new("d"),
            ],
            fetcher,
        )
        .batch_size(2)
        .build()
        .unwrap();

        let results = search.search("q").await;
        assert_eq!(
            results.urls,
            vec![
                "https://one.example/",
                "https://two.example/",
                "https://three.example/",
                "https://four.example/",
            ]
        );

        let stats = search.metrics().engine_stats();
        assert_eq!(stats["c"].failures, 1);
        assert_eq!(stats["a"].successes, 1);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(Cache::new(dir.path()));
        let fetcher = Arc::new(ScriptedFetcher::default().respond("a", Ok("https://one.example/")));
        let search = orchestrator(vec![ListEngine::new("a")], fetcher.clone())
            .cache(cache)
            .build()
            .unwrap();

        let first = search.search("5550100").await;
        let second = search.search("5550100").await;

        assert_eq!(first, second);
        assert_eq!(fetcher.requests().len(), 1);
        assert_eq!(search.metrics().cache_hits(), 1);
    }

    #[tokio::test]
    async fn test_results_are_capped() {
        let body: Vec<String> = (0..25).map(|i| format!("https://site{i}.example/")).collect();
        let body = body.join("\n");
        let fetcher = Arc::new(ScriptedFetcher::default().respond("a", Ok(body.as_str())));
        let search = orchestrator(vec![ListEngine::new("a")], fetcher)
            .build()
            .unwrap();

        assert_eq!(search.search("q").await.len(), 20);
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        struct Flaky(AtomicUsize);

        #[async_trait]
        impl Fetcher for Flaky {
            async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
                if self.0.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(FetchError::HttpStatus(503))
                } else {
                    Ok("https://late.example/".to_string())
                }
            }
        }

        let fetcher = Arc::new(Flaky(AtomicUsize::new(0)));
        let search = SearchOrchestrator::builder(registry(vec![ListEngine::new("a")]), fetcher.clone())
            .resilience(ResilienceStack::new(
                Arc::new(RateLimiter::new(100.0, 100)),
                RetryPolicy::new(3, Duration::ZERO, 2.0),
                TimeoutGuard::new(Duration::from_secs(5)),
            ))
            .build()
            .unwrap();

        assert_eq!(search.search("q").await.urls, vec!["https://late.example/"]);
        assert_eq!(fetcher.0.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_pressure_checked_between_batches_only() {
        struct High;
        impl MemorySampler for High {
            fn memory_percent(&self) -> Option<f64> {
                Some(99.0)
            }
        }

        let fetcher = Arc::new(ScriptedFetcher::default());
        let search = orchestrator(
            vec![ListEngine::new("a"), ListEngine::new("b"), ListEngine::new("c")],
            fetcher,
        )
        .batch_size(1)
        .monitor(ResourcePressureMonitor::with_sampler(85.0, High))
        .build()
        .unwrap();

        let results = search.search("q").await;
        assert!(results.is_empty());
        assert_eq!(search.monitor.trigger_count(), 2);
    }

    #[test]
    fn test_builder_rejects_bad_setup() {
        let fetcher: Arc<dyn Fetcher> = Arc::new(ScriptedFetcher::default());
        assert!(SearchOrchestrator::builder(EngineRegistry::new(), fetcher.clone())
            .build()
            .is_err());
        assert!(
            SearchOrchestrator::builder(registry(vec![ListEngine::new("a")]), fetcher)
                .batch_size(0)
                .build()
                .is_err()
        );
    }
}
