//! Query building module
//!
//! Normalizes a phone number as typed by the user and expands it into the
//! search queries sent to engines:
//! - the number exactly as entered, quoted
//! - the bare digits, quoted, alone and with `contact` / `profile`
//! - operator forms (`intext:`, `site:`, `filetype:`, `inurl:`)

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fewer digits than this cannot be a dialable number
pub const MIN_DIGITS: usize = 5;

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[\d\s\-().]+$").expect("phone pattern is valid"));

/// Errors for input that cannot be searched as a phone number
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("phone number is empty")]
    Empty,
    #[error("phone number contains unexpected characters: {0}")]
    InvalidCharacters(String),
    #[error("phone number has {0} digits, need at least 5")]
    TooShort(usize),
}

/// A phone number as entered plus its digits-only form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneQuery {
    /// Input with surrounding whitespace trimmed
    pub raw: String,
    /// Digits only (`+`, spaces, dashes, dots and parentheses removed)
    pub digits: String,
}

impl PhoneQuery {
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(QueryError::Empty);
        }
        if !PHONE_PATTERN.is_match(raw) {
            return Err(QueryError::InvalidCharacters(raw.to_string()));
        }

        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.len() < MIN_DIGITS {
            return Err(QueryError::TooShort(digits.len()));
        }

        Ok(Self {
            raw: raw.to_string(),
            digits,
        })
    }

    /// Query used for a default search: the number as entered
    pub fn primary(&self) -> &str {
        &self.raw
    }

    /// Every query variant, most specific first; duplicates removed
    pub fn variants(&self) -> Vec<String> {
        let digits = &self.digits;
        let candidates = [
            format!("\"{}\"", self.raw),
            format!("\"{digits}\""),
            format!("\"{digits}\" contact"),
            format!("\"{digits}\" profile"),
            format!(
                "intext:\"{digits}\" site:linkedin.com OR site:facebook.com OR site:twitter.com"
            ),
            format!("filetype:pdf OR filetype:doc intext:\"{digits}\""),
            format!("inurl:contact intext:\"{digits}\""),
            format!("intext:email AROUND(5) \"{digits}\""),
        ];

        let mut variants: Vec<String> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !variants.contains(&candidate) {
                variants.push(candidate);
            }
        }
        variants
    }

    /// Safe file-name fragment for this number
    pub fn file_stem(&self) -> &str {
        &self.digits
    }
}

impl std::fmt::Display for PhoneQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_formatting() {
        let query = PhoneQuery::parse("  +1 (555) 010-0199 ").unwrap();
        assert_eq!(query.raw, "+1 (555) 010-0199");
        assert_eq!(query.digits, "15550100199");
        assert_eq!(query.primary(), "+1 (555) 010-0199");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(PhoneQuery::parse("   "), Err(QueryError::Empty));
        assert_eq!(PhoneQuery::parse("+12 34"), Err(QueryError::TooShort(4)));
        assert!(matches!(
            PhoneQuery::parse("call 5550100"),
            Err(QueryError::InvalidCharacters(_))
        ));
    }

    #[test]
    fn test_variants() {
        let query = PhoneQuery::parse("+86 138 0013 8000").unwrap();
        let variants = query.variants();
        assert_eq!(variants.len(), 8);
        assert_eq!(variants[0], "\"+86 138 0013 8000\"");
        assert_eq!(variants[1], "\"8613800138000\"");
        assert_eq!(variants[2], "\"8613800138000\" contact");
        assert!(variants[5].starts_with("filetype:pdf"));
    }

    #[test]
    fn test_variants_collapse_when_already_digits() {
        let query = PhoneQuery::parse("5550100199").unwrap();
        let variants = query.variants();
        assert_eq!(variants.len(), 7);
        assert_eq!(variants[0], "\"5550100199\"");
        assert_eq!(variants[1], "\"5550100199\" contact");
    }
}
