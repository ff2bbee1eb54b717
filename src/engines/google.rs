//! Google search engine adapter

use super::traits::*;
use anyhow::Result;
use scraper::Html;

pub const DEFAULT_ENDPOINT: &str = "https://www.google.com/search";

/// Google web search (HTML results)
///
/// Ships disabled: Google answers automated traffic with a CAPTCHA page far
/// more often than with results.
pub struct Google {
    endpoint: String,
}

impl Google {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// Unwrap a `/url?q=<target>&sa=...` redirect link
    fn decode_redirect(href: &str) -> Option<String> {
        let target = href.strip_prefix("/url?q=")?;
        let target = target.split("&sa=").next().unwrap_or(target);
        let decoded = urlencoding::decode(target).ok()?.into_owned();
        is_external_link(&decoded).then_some(decoded)
    }
}

impl Default for Google {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineAdapter for Google {
    fn name(&self) -> &str {
        "google"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_url(&self, query: &str) -> Result<String> {
        url_with_params(&self.endpoint, &[("q", query), ("num", "20")])
    }

    fn parse(&self, body: &str) -> Result<Vec<String>> {
        let document = Html::parse_document(body);
        let links = selector("a[href]")?;

        Ok(document
            .select(&links)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(Self::decode_redirect)
            .collect())
    }
}
