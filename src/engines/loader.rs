//! Engine loader for building the registry from configuration

use super::registry::EngineRegistry;
use super::traits::EngineAdapter;
use super::{baidu, bing, google, searx, yandex};
use crate::config::{EngineConfig, Settings};
use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Loader for initializing engines from configuration
pub struct EngineLoader;

impl EngineLoader {
    /// Build a registry from the enabled engines in settings
    ///
    /// Unknown engine types and duplicate names are setup errors.
    pub fn load(settings: &Settings) -> Result<EngineRegistry> {
        let mut registry = EngineRegistry::new();

        for config in &settings.engines {
            if config.disabled {
                debug!("Skipping disabled engine: {}", config.name);
                continue;
            }

            let adapter = Self::create_engine(config)
                .with_context(|| format!("failed to load engine {}", config.name))?;
            info!("Loaded engine: {} ({})", config.name, adapter.endpoint());
            registry.register(config.name.clone(), adapter)?;
        }

        info!("Loaded {} engines", registry.len());
        Ok(registry)
    }

    /// Create an adapter instance for one engine entry
    pub fn create_engine(config: &EngineConfig) -> Result<Arc<dyn EngineAdapter>> {
        let endpoint = config.endpoint.as_deref();
        // `engine` defaults to the entry's name
        let kind = if config.engine.is_empty() {
            config.name.as_str()
        } else {
            config.engine.as_str()
        };
        let adapter: Arc<dyn EngineAdapter> = match kind {
            "yandex" => Arc::new(endpoint.map_or_else(yandex::Yandex::new, yandex::Yandex::with_endpoint)),
            "baidu" => Arc::new(endpoint.map_or_else(baidu::Baidu::new, baidu::Baidu::with_endpoint)),
            "searx" => Arc::new(endpoint.map_or_else(searx::Searx::new, searx::Searx::with_endpoint)),
            "google" => Arc::new(endpoint.map_or_else(google::Google::new, google::Google::with_endpoint)),
            "bing" => Arc::new(endpoint.map_or_else(bing::Bing::new, bing::Bing::with_endpoint)),
            other => return Err(anyhow!("unknown engine type: {other}")),
        };

        // An endpoint that cannot carry a query is a configuration error
        adapter.build_url("probe")?;
        Ok(adapter)
    }

    /// Adapter types this build knows about
    pub fn available_engines() -> Vec<&'static str> {
        vec!["yandex", "baidu", "searx", "google", "bing"]
    }
}
