//! Command-line interface parsing for country-cidr
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! a `RunConfig` for the binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use thiserror::Error;
use tracing::Level;

use crate::config::{ResolverConfig, CODE_PLACEHOLDER, DEFAULT_TIMEOUT, DEFAULT_TTL};
use crate::data::CountryCode;
use crate::format::{OutputFormat, SetNames};

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// A URL template override does not contain the `{cc}` placeholder
    #[error("Invalid URL template for {flag}: '{template}' must contain {{cc}}")]
    InvalidTemplate { flag: &'static str, template: String },
}

/// Fetch the IP blocks (CIDRs) assigned to a country
#[derive(Parser, Debug)]
#[command(name = "country-cidr")]
#[command(about = "Fetch country IP blocks (CIDRs) with caching and registry fallback")]
#[command(version)]
pub struct Cli {
    /// ISO 3166-1 alpha-2 country code (e.g. US, IN)
    #[arg(long, short = 'c')]
    pub country: String,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Cidr)]
    pub format: OutputFormat,

    /// Name for the ipset sets (default: country-<CC>)
    #[arg(long)]
    pub ipset_name: Option<String>,

    /// Name for the nftables sets (default: country_<CC>)
    #[arg(long)]
    pub set_name: Option<String>,

    /// Ignore the cache and force a refresh
    #[arg(long)]
    pub no_cache: bool,

    /// Cache TTL in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_TTL.as_secs())]
    pub ttl: u64,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Directory holding cached lists (default: platform cache dir)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Write the lookup trace to this file
    #[arg(long, value_name = "PATH")]
    pub debug_file: Option<PathBuf>,

    /// Override the primary registry IPv4 URL template ({cc} = country code)
    #[arg(long, value_name = "URL")]
    pub primary_v4_url: Option<String>,

    /// Override the primary registry IPv6 URL template ({cc} = country code)
    #[arg(long, value_name = "URL")]
    pub primary_v6_url: Option<String>,

    /// Override the fallback registry URL template ({cc} = country code)
    #[arg(long, value_name = "URL")]
    pub fallback_url: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = ArgAction::Count)]
    pub verbose: u8,
}

/// Everything the binary needs for one run, derived from CLI arguments
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Country code as typed; validated by the resolver
    pub country: String,
    pub format: OutputFormat,
    /// Explicit set names; unset ones are derived from the country code
    pub ipset_name: Option<String>,
    pub set_name: Option<String>,
    pub force_refresh: bool,
    pub resolver: ResolverConfig,
    pub debug_file: Option<PathBuf>,
    pub log_level: Level,
}

impl RunConfig {
    /// Creates a RunConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(RunConfig)` with defaults filled in
    /// * `Err(CliError)` if a URL template override lacks `{cc}`
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mut resolver = ResolverConfig {
            timeout: Duration::from_secs(cli.timeout),
            ttl: Duration::from_secs(cli.ttl),
            ..ResolverConfig::default()
        };
        if let Some(dir) = &cli.cache_dir {
            resolver.cache_dir = dir.clone();
        }
        if let Some(url) = &cli.primary_v4_url {
            resolver.primary_v4_template = checked_template("--primary-v4-url", url)?;
        }
        if let Some(url) = &cli.primary_v6_url {
            resolver.primary_v6_template = checked_template("--primary-v6-url", url)?;
        }
        if let Some(url) = &cli.fallback_url {
            resolver.fallback_template = checked_template("--fallback-url", url)?;
        }

        Ok(RunConfig {
            country: cli.country.clone(),
            format: cli.format,
            ipset_name: cli.ipset_name.clone(),
            set_name: cli.set_name.clone(),
            force_refresh: cli.no_cache,
            resolver,
            debug_file: cli.debug_file.clone(),
            log_level: log_level(cli.verbose),
        })
    }

    /// Set names for the output, falling back to names derived from `code`
    pub fn set_names(&self, code: &CountryCode) -> SetNames {
        let defaults = SetNames::for_country(code);
        SetNames {
            ipset: self.ipset_name.clone().unwrap_or(defaults.ipset),
            nftables: self.set_name.clone().unwrap_or(defaults.nftables),
        }
    }
}

fn checked_template(flag: &'static str, template: &str) -> Result<String, CliError> {
    if !template.contains(CODE_PLACEHOLDER) {
        return Err(CliError::InvalidTemplate {
            flag,
            template: template.to_string(),
        });
    }
    Ok(template.to_string())
}

/// Maps the `-v` count to a log level; warnings only by default
pub fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}
