//! Output formats for resolved CIDR lists
//!
//! Renders a `CidrSet` as a plain list, as `ipset` commands, as `nft`
//! commands, or as JSON.

use clap::ValueEnum;
use serde::Serialize;

use crate::data::{CidrSet, CountryCode};

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One CIDR per line
    #[default]
    Cidr,
    /// `ipset create` / `ipset add` commands
    Ipset,
    /// `nft add set` / `nft add element` commands
    Nftables,
    /// JSON object with the country and its CIDRs
    Json,
}

/// Names used by the set-based formats
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetNames {
    /// Base name for `ipset` sets (`-v4`/`-v6` are appended)
    pub ipset: String,
    /// Base name for nftables sets (`_v4`/`_v6` are appended)
    pub nftables: String,
}

impl SetNames {
    /// `country-US` for ipset and `country_US` for nftables
    pub fn for_country(code: &CountryCode) -> Self {
        let upper = code.to_upper();
        Self {
            ipset: format!("country-{}", upper),
            nftables: format!("country_{}", upper),
        }
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    country: String,
    cidrs: &'a CidrSet,
}

/// Renders `cidrs` in the requested format, without a trailing newline
pub fn render(
    format: OutputFormat,
    code: &CountryCode,
    cidrs: &CidrSet,
    names: &SetNames,
) -> Result<String, serde_json::Error> {
    Ok(match format {
        OutputFormat::Cidr => cidrs.iter().collect::<Vec<_>>().join("\n"),
        OutputFormat::Ipset => format_ipset(cidrs, &names.ipset),
        OutputFormat::Nftables => format_nftables(cidrs, &names.nftables),
        OutputFormat::Json => serde_json::to_string_pretty(&JsonOutput {
            country: code.to_upper(),
            cidrs,
        })?,
    })
}

/// `ipset` commands creating `<name>-v4` and `<name>-v6` and adding each entry
/// to the set of its family
pub fn format_ipset(cidrs: &CidrSet, set_name: &str) -> String {
    let v4 = format!("{}-v4", set_name);
    let v6 = format!("{}-v6", set_name);
    let mut lines = vec![
        format!("ipset create {} hash:net family inet -exist", v4),
        format!("ipset create {} hash:net family inet6 -exist", v6),
    ];
    for cidr in cidrs.iter() {
        let set = if crate::data::is_ipv6(cidr) { &v6 } else { &v4 };
        lines.push(format!("ipset add {} {} -exist", set, cidr));
    }
    lines.join("\n")
}

/// `nft` commands creating an interval set per non-empty family in the
/// `inet filter` table and loading its elements in one command
pub fn format_nftables(cidrs: &CidrSet, set_name: &str) -> String {
    let (v4, v6) = cidrs.split_families();
    let mut lines = Vec::new();
    for (suffix, addr_type, entries) in [("v4", "ipv4_addr", v4), ("v6", "ipv6_addr", v6)] {
        if entries.is_empty() {
            continue;
        }
        lines.push(format!(
            "nft add set inet filter {}_{} {{ type {}; flags interval; }}",
            set_name, suffix, addr_type
        ));
        lines.push(format!(
            "nft add element inet filter {}_{} {{ {} }}",
            set_name,
            suffix,
            entries.join(", ")
        ));
    }
    lines.join("\n")
}
