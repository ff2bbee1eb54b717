//! Engine adapter trait and descriptors

use anyhow::{anyhow, Result};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use url::Url;

/// Name and endpoint of a configured engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineDescriptor {
    pub name: String,
    pub endpoint: String,
}

/// Request-building and response-parsing logic for one search engine
pub trait EngineAdapter: Send + Sync {
    /// Engine name, unique within a registry
    fn name(&self) -> &str;

    /// Base URL queries are sent to
    fn endpoint(&self) -> &str;

    /// Build the request URL for a query
    fn build_url(&self, query: &str) -> Result<String>;

    /// Extract result URLs from a response body, in page order
    fn parse(&self, body: &str) -> Result<Vec<String>>;

    fn descriptor(&self) -> EngineDescriptor {
        EngineDescriptor {
            name: self.name().to_string(),
            endpoint: self.endpoint().to_string(),
        }
    }
}

/// Append `params` to `endpoint` as an encoded query string
pub fn url_with_params(endpoint: &str, params: &[(&str, &str)]) -> Result<String> {
    let url = Url::parse_with_params(endpoint, params)
        .map_err(|e| anyhow!("invalid endpoint {endpoint}: {e}"))?;
    Ok(url.to_string())
}

/// Compile a CSS selector
pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {css}: {e:?}"))
}

/// Keep absolute http(s) links only
pub fn is_external_link(href: &str) -> bool {
    href.starts_with("http://") || href.starts_with("https://")
}
