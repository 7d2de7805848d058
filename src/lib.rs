//! country-cidr library
//!
//! Fetches the CIDR blocks assigned to a country from public registries, with
//! an on-disk cache and a fixed fallback chain. The binary in `main.rs` is a
//! thin wrapper around `resolver::Resolver`.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod diagnostics;
pub mod format;
pub mod resolver;

pub use cache::{CacheManager, CacheRecord};
pub use config::ResolverConfig;
pub use data::{CidrSet, CountryCode, CountryCodeError};
pub use diagnostics::Diagnostics;
pub use resolver::{ResolveError, Resolver};
