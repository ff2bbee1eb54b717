//! Yandex search engine adapter

use super::traits::*;
use anyhow::Result;
use scraper::Html;

pub const DEFAULT_ENDPOINT: &str = "https://yandex.com/search/";

/// Yandex web search (HTML results)
pub struct Yandex {
    endpoint: String,
}

impl Yandex {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for Yandex {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineAdapter for Yandex {
    fn name(&self) -> &str {
        "yandex"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_url(&self, query: &str) -> Result<String> {
        url_with_params(&self.endpoint, &[("text", query)])
    }

    fn parse(&self, body: &str) -> Result<Vec<String>> {
        let document = Html::parse_document(body);
        let links = selector("a.organic__url, a.OrganicTitle-Link")?;

        Ok(document
            .select(&links)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| is_external_link(href))
            .map(str::to_string)
            .collect())
    }
}
