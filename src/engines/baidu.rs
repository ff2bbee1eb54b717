//! Baidu search engine adapter

use super::traits::*;
use anyhow::Result;
use scraper::Html;

pub const DEFAULT_ENDPOINT: &str = "https://www.baidu.com/s";

/// Baidu web search (HTML results)
///
/// Result anchors point at `baidu.com/link?url=` redirects; the real target
/// is carried in the container's `mu` attribute when Baidu provides it.
pub struct Baidu {
    endpoint: String,
}

impl Baidu {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for Baidu {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineAdapter for Baidu {
    fn name(&self) -> &str {
        "baidu"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_url(&self, query: &str) -> Result<String> {
        url_with_params(&self.endpoint, &[("wd", query), ("ie", "utf-8")])
    }

    fn parse(&self, body: &str) -> Result<Vec<String>> {
        let document = Html::parse_document(body);
        let containers = selector("div.result, div.c-container")?;
        let title_link = selector("h3 a")?;

        let mut urls = Vec::new();
        for container in document.select(&containers) {
            let target = container
                .value()
                .attr("mu")
                .filter(|mu| is_external_link(mu))
                .or_else(|| {
                    container
                        .select(&title_link)
                        .next()
                        .and_then(|a| a.value().attr("href"))
                        .filter(|href| is_external_link(href))
                });
            if let Some(url) = target {
                urls.push(url.to_string());
            }
        }
        Ok(urls)
    }
}
