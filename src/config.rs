//! Resolver configuration
//!
//! Endpoint templates, the request timeout, the cache TTL and the cache
//! location are carried in one value handed to the resolver at construction.
//! URL templates use `{cc}` as the country code placeholder.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

/// Primary registry, IPv4 listing
pub const IPDENY_V4_TEMPLATE: &str = "https://www.ipdeny.com/ipblocks/data/countries/{cc}.zone";

/// Primary registry, IPv6 listing
pub const IPDENY_V6_TEMPLATE: &str = "https://www.ipdeny.com/ipv6/ipaddresses/ip6-{cc}.txt";

/// Fallback registry, combined listing
pub const IPINFO_TEMPLATE: &str = "https://ipinfo.io/countries/{cc}/cidr";

/// Placeholder substituted with the country code
pub const CODE_PLACEHOLDER: &str = "{cc}";

/// Per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum age of a cache record before it is refetched (24 hours)
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 3600);

/// Everything the resolver needs to know about its environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Primary registry IPv4 URL template
    pub primary_v4_template: String,
    /// Primary registry IPv6 URL template
    pub primary_v6_template: String,
    /// Fallback registry URL template
    pub fallback_template: String,
    /// Timeout applied to every request
    pub timeout: Duration,
    /// Default freshness window for cached records
    pub ttl: Duration,
    /// Directory holding one cache file per country
    pub cache_dir: PathBuf,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            primary_v4_template: IPDENY_V4_TEMPLATE.to_string(),
            primary_v6_template: IPDENY_V6_TEMPLATE.to_string(),
            fallback_template: IPINFO_TEMPLATE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            ttl: DEFAULT_TTL,
            cache_dir: default_cache_dir(),
        }
    }
}

impl ResolverConfig {
    /// Points all three templates at a different host, keeping the default paths.
    ///
    /// Used to run the resolver against a mirror or a local test server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.primary_v4_template = format!("{}/ipblocks/data/countries/{{cc}}.zone", base);
        self.primary_v6_template = format!("{}/ipv6/ipaddresses/ip6-{{cc}}.txt", base);
        self.fallback_template = format!("{}/countries/{{cc}}/cidr", base);
        self
    }

    /// Sets the cache directory
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }
}

/// Fills a URL template with a country code
pub fn expand_template(template: &str, code: &str) -> String {
    template.replace(CODE_PLACEHOLDER, code)
}

/// Platform cache directory (`~/.cache/country-cidr/` on Linux), or `./cache`
/// when no home directory can be determined
pub fn default_cache_dir() -> PathBuf {
    ProjectDirs::from("", "", "country-cidr")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("cache"))
}
