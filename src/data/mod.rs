//! Core data models for country-cidr
//!
//! This module contains the country code and CIDR set types shared by the
//! sources, the cache and the resolver.

pub mod http;
pub mod sources;

pub use http::{FetchOutcome, HttpFetcher};
pub use sources::{CodeCase, Source};

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Errors produced when validating a country code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CountryCodeError {
    /// The code is not exactly two characters after trimming
    #[error("country code must be a 2-letter ISO code, e.g. 'US', 'IN' (got '{0}')")]
    InvalidLength(String),
}

/// An ISO 3166-1 alpha-2 country code, stored lowercase
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CountryCode(String);

impl CountryCode {
    /// Parses a country code, trimming whitespace and lowercasing it.
    ///
    /// # Returns
    /// * `Ok(CountryCode)` if the trimmed input is exactly two characters
    /// * `Err(CountryCodeError::InvalidLength)` otherwise
    pub fn parse(s: &str) -> Result<Self, CountryCodeError> {
        let code = s.trim().to_lowercase();
        if code.chars().count() != 2 {
            return Err(CountryCodeError::InvalidLength(s.to_string()));
        }
        Ok(Self(code))
    }

    /// Lowercase form, used as the cache key and in primary registry paths
    pub fn as_lower(&self) -> &str {
        &self.0
    }

    /// Uppercase form, used by the fallback registry and for set names
    pub fn to_upper(&self) -> String {
        self.0.to_uppercase()
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, duplicate-free list of CIDR entries
///
/// Order is first-seen order across every source consulted. Two entries are
/// duplicates only if their text is identical; `10.0.0.0/8` and `10.0.0.1/8`
/// are kept apart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CidrSet {
    entries: Vec<String>,
    #[serde(skip)]
    seen: HashSet<String>,
}

impl CidrSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from raw candidate lines.
    ///
    /// Candidates are trimmed; empty ones and ones without a `/` separator are
    /// dropped, then duplicates are removed keeping the first occurrence.
    pub fn from_candidates<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for candidate in candidates {
            set.insert(candidate.as_ref());
        }
        set
    }

    /// Inserts one candidate, returning whether it was kept
    pub fn insert(&mut self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        if !looks_like_cidr(candidate) || !self.seen.insert(candidate.to_string()) {
            return false;
        }
        self.entries.push(candidate.to_string());
        true
    }

    /// Whether the set already holds this exact entry
    pub fn contains(&self, entry: &str) -> bool {
        self.seen.contains(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }

    /// Splits the set into (IPv4, IPv6) entries, preserving order
    pub fn split_families(&self) -> (Vec<&str>, Vec<&str>) {
        self.iter().partition(|c| !is_ipv6(c))
    }
}

impl IntoIterator for CidrSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Cheap sanity filter, not a CIDR parser
fn looks_like_cidr(candidate: &str) -> bool {
    !candidate.is_empty() && candidate.contains('/')
}

/// IPv6 entries are told apart by the `:` in their address part
pub fn is_ipv6(cidr: &str) -> bool {
    cidr.contains(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_code_is_lowercased_and_trimmed() {
        let code = CountryCode::parse("  US \n").unwrap();
        assert_eq!(code.as_lower(), "us");
        assert_eq!(code.to_upper(), "US");
        assert_eq!(code.to_string(), "us");
    }

    #[test]
    fn test_country_code_rejects_wrong_length() {
        for bad in ["", " ", "u", "usa", "  u  ", "united states"] {
            let err = CountryCode::parse(bad).unwrap_err();
            assert_eq!(err, CountryCodeError::InvalidLength(bad.to_string()));
        }
    }

    #[test]
    fn test_country_code_error_message() {
        let err = CountryCode::parse("usa").unwrap_err();
        assert!(err.to_string().contains("2-letter"));
        assert!(err.to_string().contains("usa"));
    }

    #[test]
    fn test_sanitize_drops_blank_and_non_cidr_entries() {
        let raw = vec![
            "".to_string(),
            "  ".to_string(),
            "not-a-cidr".to_string(),
            "10.0.0.0/8".to_string(),
        ];
        let set = CidrSet::from_candidates(&raw);
        assert_eq!(set.as_slice(), &["10.0.0.0/8".to_string()]);
    }

    #[test]
    fn test_dedup_keeps_first_seen_position() {
        let set = CidrSet::from_candidates([
            "1.2.3.0/24",
            "5.6.0.0/16",
            "1.2.3.0/24",
            "2001:db8::/32",
            "5.6.0.0/16",
        ]);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec!["1.2.3.0/24", "5.6.0.0/16", "2001:db8::/32"]
        );
    }

    #[test]
    fn test_dedup_is_textual_not_semantic() {
        let set = CidrSet::from_candidates(["10.0.0.0/8", "10.0.0.1/8", "010.0.0.0/8"]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_insert_reports_whether_kept() {
        let mut set = CidrSet::new();
        assert!(set.insert("8.8.8.0/24"));
        assert!(!set.insert(" 8.8.8.0/24 "));
        assert!(!set.insert("garbage"));
        assert_eq!(set.len(), 1);
        assert!(set.contains("8.8.8.0/24"));
    }

    #[test]
    fn test_split_families() {
        let set = CidrSet::from_candidates(["8.8.8.0/24", "2001:4860::/32", "8.8.4.0/24"]);
        let (v4, v6) = set.split_families();
        assert_eq!(v4, vec!["8.8.8.0/24", "8.8.4.0/24"]);
        assert_eq!(v6, vec!["2001:4860::/32"]);
    }

    #[test]
    fn test_cidr_set_serializes_as_array() {
        let set = CidrSet::from_candidates(["8.8.8.0/24"]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["8.8.8.0/24"]"#);
    }
}
