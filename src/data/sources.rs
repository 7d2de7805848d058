//! Registry sources for country CIDR listings
//!
//! Two registries are supported: ipdeny (separate IPv4 and IPv6 listings,
//! lowercase country code in the path) and ipinfo (one combined listing,
//! uppercase country code). The resolver walks `Source::default_chain()` in
//! order until one stage produces entries.

use super::http::{FetchOutcome, HttpFetcher};
use super::CountryCode;
use crate::config::{expand_template, ResolverConfig};
use crate::diagnostics::Diagnostics;

/// Letter case used when substituting the country code into a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCase {
    Lower,
    Upper,
}

impl CodeCase {
    fn apply(self, code: &CountryCode) -> String {
        match self {
            CodeCase::Lower => code.as_lower().to_string(),
            CodeCase::Upper => code.to_upper(),
        }
    }
}

/// One stage of the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// ipdeny IPv4 + IPv6 listings; `#` lines are comments
    Primary { case: CodeCase },
    /// ipinfo combined listing, always queried with the uppercase code
    Fallback,
}

impl Source {
    /// Primary (lowercase), then fallback, then primary again with the code
    /// upper-cased for hosts that serve case-sensitive paths
    pub fn default_chain() -> Vec<Source> {
        vec![
            Source::Primary {
                case: CodeCase::Lower,
            },
            Source::Fallback,
            Source::Primary {
                case: CodeCase::Upper,
            },
        ]
    }

    /// Short name used in diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            Source::Primary {
                case: CodeCase::Lower,
            } => "primary registry",
            Source::Primary {
                case: CodeCase::Upper,
            } => "primary registry (uppercase code)",
            Source::Fallback => "fallback registry",
        }
    }

    /// URLs this source queries for `code`, in request order
    pub fn urls(&self, config: &ResolverConfig, code: &CountryCode) -> Vec<String> {
        match self {
            Source::Primary { case } => {
                let cc = case.apply(code);
                vec![
                    expand_template(&config.primary_v4_template, &cc),
                    expand_template(&config.primary_v6_template, &cc),
                ]
            }
            Source::Fallback => vec![expand_template(&config.fallback_template, &code.to_upper())],
        }
    }

    /// Fetches every endpoint of this source and returns the raw candidate
    /// lines in order.
    ///
    /// Failures never escape: each endpoint contributes its lines or nothing,
    /// and one diagnostics line per endpoint records what happened.
    pub async fn attempt(
        &self,
        http: &HttpFetcher,
        config: &ResolverConfig,
        code: &CountryCode,
        diagnostics: &mut Diagnostics,
    ) -> Vec<String> {
        let mut candidates = Vec::new();
        for url in self.urls(config, code) {
            match http.get(&url).await {
                FetchOutcome::Body(body) => {
                    let lines = self.extract_lines(&body);
                    diagnostics.record(format!("GET {} -> 200, {} entries", url, lines.len()));
                    candidates.extend(lines);
                }
                FetchOutcome::Failed { reason } => {
                    diagnostics.record(format!("GET {} -> {}", url, reason));
                }
            }
        }
        candidates
    }

    /// Splits a response body into candidate lines
    fn extract_lines(&self, body: &str) -> Vec<String> {
        let skip_comments = matches!(self, Source::Primary { .. });
        body.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| !(skip_comments && line.starts_with('#')))
            .map(str::to_string)
            .collect()
    }
}
