//! Result merging: cleanup, blacklist filtering and de-duplication

use super::models::ResultSet;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Query parameters that only carry tracking state
const TRACKING_PARAMS: &[&str] = &[
    "gclid", "gclsrc", "fbclid", "msclkid", "twclid", "yclid", "mc_eid", "mc_cid", "_hsenc",
    "_hsmi", "__hstc", "__hsfp", "s_kwcid", "click_id",
];

static TRACKING_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(utm_|_ga)").expect("tracking pattern is valid"));

fn is_tracking_param(name: &str) -> bool {
    TRACKING_PARAMS.contains(&name) || TRACKING_PATTERN.is_match(name)
}

/// Trim a raw result URL and drop tracking parameters
///
/// Returns `None` for anything that is not an absolute http(s) URL. The URL
/// is only re-serialized when a parameter was actually removed, so
/// untouched links keep their exact form.
pub fn clean_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let mut parsed = Url::parse(trimmed).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return None;
    }

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if !pairs.iter().any(|(k, _)| is_tracking_param(k)) {
        return Some(trimmed.to_string());
    }

    let kept: Vec<&(String, String)> = pairs.iter().filter(|(k, _)| !is_tracking_param(k)).collect();
    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }
    Some(parsed.to_string())
}

/// Accumulates engine results in discovery order
#[derive(Debug, Clone)]
pub struct ResultMerger {
    blacklist: Vec<String>,
    max_results: usize,
    seen: HashSet<String>,
    urls: Vec<String>,
}

impl ResultMerger {
    pub fn new(blacklist: &[String], max_results: usize) -> Self {
        Self {
            blacklist: blacklist.iter().map(|b| b.to_lowercase()).collect(),
            max_results,
            seen: HashSet::new(),
            urls: Vec::new(),
        }
    }

    fn is_blacklisted(&self, url: &str) -> bool {
        let lower = url.to_lowercase();
        self.blacklist.iter().any(|b| lower.contains(b.as_str()))
    }

    /// Add one engine's URLs; returns how many were new
    pub fn extend<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.urls.len();
        for raw in urls {
            let Some(url) = clean_url(raw.as_ref()) else {
                continue;
            };
            if self.is_blacklisted(&url) || self.seen.contains(&url) {
                continue;
            }
            self.seen.insert(url.clone());
            self.urls.push(url);
        }
        self.urls.len() - before
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Truncate to the cap and timestamp the set
    pub fn finish(mut self) -> ResultSet {
        self.urls.truncate(self.max_results);
        ResultSet::new(self.urls)
    }
}
