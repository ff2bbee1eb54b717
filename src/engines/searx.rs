//! SearXNG instance adapter

use super::traits::*;
use anyhow::Result;
use scraper::Html;

pub const DEFAULT_ENDPOINT: &str = "https://searx.be/search";

/// A public SearXNG instance, queried through its HTML interface
pub struct Searx {
    endpoint: String,
}

impl Searx {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for Searx {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineAdapter for Searx {
    fn name(&self) -> &str {
        "searx"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_url(&self, query: &str) -> Result<String> {
        url_with_params(&self.endpoint, &[("q", query)])
    }

    fn parse(&self, body: &str) -> Result<Vec<String>> {
        let document = Html::parse_document(body);
        let results = selector("article.result")?;
        let link = selector("a.url_header, h3 a")?;

        Ok(document
            .select(&results)
            .filter_map(|article| {
                article
                    .select(&link)
                    .filter_map(|a| a.value().attr("href"))
                    .find(|href| is_external_link(href))
                    .map(str::to_string)
            })
            .collect())
    }
}
