//! Country CIDR resolution
//!
//! `Resolver::resolve` is the whole pipeline: validate the code, serve a fresh
//! cache record if there is one, otherwise walk the source chain until a stage
//! yields entries, clean them up and store them for next time.

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::CacheManager;
use crate::config::ResolverConfig;
use crate::data::{CidrSet, CountryCode, CountryCodeError, HttpFetcher, Source};
use crate::diagnostics::Diagnostics;

/// Errors that can fail a resolution outright
///
/// Network failures never appear here; they only show up as fewer entries and
/// as lines in the diagnostics trace.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The country code is malformed
    #[error(transparent)]
    InvalidCountryCode(#[from] CountryCodeError),

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Whether a record fetched at `fetched_at` is still usable at `now`
///
/// The comparison is strict: a record exactly `ttl` old is stale.
pub fn is_fresh(fetched_at: i64, now: i64, ttl: Duration) -> bool {
    let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    now.saturating_sub(fetched_at) < ttl
}

/// Fetches country CIDR lists through a cache and an ordered source chain
#[derive(Debug, Clone)]
pub struct Resolver {
    config: ResolverConfig,
    cache: CacheManager,
    http: HttpFetcher,
    chain: Vec<Source>,
}

impl Resolver {
    /// Creates a resolver using the default source chain
    pub fn new(config: ResolverConfig) -> Result<Self, ResolveError> {
        Self::with_chain(config, Source::default_chain())
    }

    /// Creates a resolver with an explicit source chain
    pub fn with_chain(config: ResolverConfig, chain: Vec<Source>) -> Result<Self, ResolveError> {
        let http = HttpFetcher::new(config.timeout)?;
        let cache = CacheManager::with_dir(config.cache_dir.clone());
        Ok(Self {
            config,
            cache,
            http,
            chain,
        })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Resolves the CIDR list for `code`.
    ///
    /// # Arguments
    /// * `code` - Two-letter country code, any case, surrounding whitespace allowed
    /// * `force_refresh` - Skip the cache even if it is fresh
    /// * `ttl` - Maximum age of a cache record that may be served
    /// * `diagnostics` - Trace that receives one line per pipeline event
    ///
    /// # Returns
    /// * `Ok(CidrSet)` - Possibly empty if every source failed
    /// * `Err(ResolveError::InvalidCountryCode)` - Before any cache or network access
    pub async fn resolve(
        &self,
        code: &str,
        force_refresh: bool,
        ttl: Duration,
        diagnostics: &mut Diagnostics,
    ) -> Result<CidrSet, ResolveError> {
        let code = CountryCode::parse(code)?;

        let cached = self.cache.read(&code);
        let now = Utc::now().timestamp();
        if force_refresh {
            diagnostics.record(format!("cache bypassed for {}: forced refresh", code));
        } else if cached.cidrs.is_empty() {
            diagnostics.record(format!("cache miss for {}", code));
        } else if is_fresh(cached.fetched_at, now, ttl) {
            info!("Using cached CIDR list for {}", code);
            diagnostics.record(format!(
                "cache hit for {}: {} entries, {}s old",
                code,
                cached.cidrs.len(),
                now.saturating_sub(cached.fetched_at)
            ));
            return Ok(cached.cidrs);
        } else {
            info!("Cache for {} is expired, downloading fresh copy", code);
            diagnostics.record(format!(
                "cache stale for {}: {}s old, ttl {}s",
                code,
                now.saturating_sub(cached.fetched_at),
                ttl.as_secs()
            ));
        }

        let raw = self.fetch_chain(&code, diagnostics).await;
        let cidrs = CidrSet::from_candidates(&raw);

        if !cidrs.is_empty() {
            match self.cache.write(&code, &cidrs) {
                Ok(()) => diagnostics.record(format!(
                    "cache written: {}",
                    self.cache.cache_path(&code).display()
                )),
                Err(e) => {
                    warn!("Failed to write cache for {}: {}", code, e);
                    diagnostics.record(format!("cache write failed: {}", e));
                }
            }
        } else {
            warn!("No CIDRs found for {} from any source", code);
        }

        diagnostics.record(format!("total: {} entries", cidrs.len()));
        Ok(cidrs)
    }

    /// Walks the chain, stopping at the first stage with any raw output
    async fn fetch_chain(&self, code: &CountryCode, diagnostics: &mut Diagnostics) -> Vec<String> {
        let stages = self.chain.len();
        for (i, source) in self.chain.iter().enumerate() {
            diagnostics.record(format!("stage {}/{}: {}", i + 1, stages, source.label()));
            let raw = source
                .attempt(&self.http, &self.config, code, diagnostics)
                .await;
            if !raw.is_empty() {
                info!("{} returned {} candidate lines for {}", source.label(), raw.len(), code);
                return raw;
            }
        }
        Vec::new()
    }
}
