//! Bing search engine adapter

use super::traits::*;
use anyhow::Result;
use base64::Engine as _;
use scraper::Html;

pub const DEFAULT_ENDPOINT: &str = "https://www.bing.com/search";

/// Bing web search (HTML results), disabled by default
pub struct Bing {
    endpoint: String,
}

impl Bing {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// Decode Bing's click-tracking URLs
    ///
    /// Links look like `https://www.bing.com/ck/a?...&u=a1<base64>&...`; the
    /// target is the base64 payload of `u` after the `a1` prefix.
    fn decode_bing_url(url: &str) -> String {
        if !url.starts_with("https://www.bing.com/ck/a?") {
            return url.to_string();
        }

        let encoded = url::Url::parse(url).ok().and_then(|parsed| {
            parsed
                .query_pairs()
                .find(|(k, _)| k == "u")
                .map(|(_, v)| v.into_owned())
        });

        let Some(encoded) = encoded else {
            return url.to_string();
        };
        let Some(payload) = encoded.strip_prefix("a1") else {
            return url.to_string();
        };

        let payload = payload.trim_end_matches('=');
        base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload)
            .or_else(|_| base64::engine::general_purpose::STANDARD_NO_PAD.decode(payload))
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_else(|| url.to_string())
    }
}

impl Default for Bing {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineAdapter for Bing {
    fn name(&self) -> &str {
        "bing"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_url(&self, query: &str) -> Result<String> {
        url_with_params(&self.endpoint, &[("q", query)])
    }

    fn parse(&self, body: &str) -> Result<Vec<String>> {
        let document = Html::parse_document(body);
        let title_links = selector("li.b_algo h2 a")?;

        Ok(document
            .select(&title_links)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| is_external_link(href))
            .map(Self::decode_bing_url)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        let url = Bing::new().build_url("5550100").unwrap();
        assert_eq!(url, "https://www.bing.com/search?q=5550100");
    }

    #[test]
    fn test_decode_bing_url() {
        let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode("https://target.example/page");
        let wrapped = format!("https://www.bing.com/ck/a?!&&p=abc&u=a1{encoded}&ntb=1");
        assert_eq!(Bing::decode_bing_url(&wrapped), "https://target.example/page");
        assert_eq!(
            Bing::decode_bing_url("https://plain.example/"),
            "https://plain.example/"
        );
    }

    #[test]
    fn test_parse_algo_results() {
        let html = r#"
            <ol id="b_results">
              <li class="b_algo"><h2><a href="https://one.example/">One</a></h2><p>snippet</p></li>
              <li class="b_ad"><h2><a href="https://ad.example/">Ad</a></h2></li>
              <li class="b_algo"><h2><a href="https://two.example/">Two</a></h2></li>
            </ol>"#;
        let urls = Bing::new().parse(html).unwrap();
        assert_eq!(urls, vec!["https://one.example/", "https://two.example/"]);
    }
}
