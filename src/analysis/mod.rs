//! Result analysis: domain frequency and rule-based categories

use crate::search::ResultSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

const SOCIAL_PLATFORMS: &[&str] = &["linkedin", "facebook", "twitter", "instagram"];
const DOCUMENT_EXTENSIONS: &[&str] = &[".pdf", ".doc", ".txt"];
const CONTACT_MARKERS: &[&str] = &["contact", "about", "profile"];

/// Category assigned to each result URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    SocialMedia,
    Government,
    Documents,
    ContactInfo,
    Others,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SocialMedia => "social_media",
            Self::Government => "government",
            Self::Documents => "documents",
            Self::ContactInfo => "contact_info",
            Self::Others => "others",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categories and domain counts for one result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// URLs per category, in result order; empty categories are omitted
    pub categories: BTreeMap<Category, Vec<String>>,
    /// Occurrences per domain
    pub domain_frequency: BTreeMap<String, usize>,
    pub total_results: usize,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisReport {
    /// The `n` most frequent domains, ties broken by name
    pub fn top_domains(&self, n: usize) -> Vec<(&str, usize)> {
        let mut domains: Vec<(&str, usize)> = self
            .domain_frequency
            .iter()
            .map(|(domain, count)| (domain.as_str(), *count))
            .collect();
        domains.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        domains.truncate(n);
        domains
    }

    pub fn category(&self, category: Category) -> &[String] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Pure analyzer over result sets
#[derive(Debug, Clone)]
pub struct ResultAnalyzer {
    social_platforms: Vec<String>,
}

impl ResultAnalyzer {
    pub fn new() -> Self {
        Self::with_social_platforms(SOCIAL_PLATFORMS.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_social_platforms(social_platforms: Vec<String>) -> Self {
        Self { social_platforms }
    }

    pub fn analyze(&self, results: &ResultSet) -> AnalysisReport {
        let mut categories: BTreeMap<Category, Vec<String>> = BTreeMap::new();
        let mut domain_frequency: BTreeMap<String, usize> = BTreeMap::new();

        for url in results.iter() {
            let parsed = Url::parse(url).ok();
            let domain = parsed
                .as_ref()
                .and_then(|u| u.host_str())
                .unwrap_or_default()
                .to_lowercase();

            let category = self.categorize(url, parsed.as_ref(), &domain);
            categories.entry(category).or_default().push(url.to_string());
            *domain_frequency.entry(domain).or_insert(0) += 1;
        }

        AnalysisReport {
            categories,
            domain_frequency,
            total_results: results.len(),
            timestamp: Utc::now(),
        }
    }

    /// First matching rule wins
    pub fn categorize(&self, url: &str, parsed: Option<&Url>, domain: &str) -> Category {
        if self.social_platforms.iter().any(|p| domain.contains(p.as_str())) {
            return Category::SocialMedia;
        }
        if domain.contains(".gov") {
            return Category::Government;
        }

        let lower = url.to_lowercase();
        let path = parsed.map(|u| u.path().to_lowercase()).unwrap_or_default();
        if DOCUMENT_EXTENSIONS
            .iter()
            .any(|ext| path.ends_with(ext) || lower.ends_with(ext))
        {
            return Category::Documents;
        }
        if CONTACT_MARKERS.iter().any(|m| lower.contains(m)) {
            return Category::ContactInfo;
        }
        Category::Others
    }
}

impl Default for ResultAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
