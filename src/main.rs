//! country-cidr - print the IP blocks assigned to a country
//!
//! Resolves the country's CIDR list (cache first, then the registry chain)
//! and writes it to stdout in the requested format. Exit status is 0 on
//! success, 1 when no source produced any CIDRs and 2 for invalid input.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use country_cidr::cli::{Cli, RunConfig};
use country_cidr::format::render;
use country_cidr::{CountryCode, Diagnostics, Resolver};

/// Exit status when every source came back empty
const EXIT_NO_CIDRS: u8 = 1;

/// Exit status for malformed arguments, matching clap's usage errors
const EXIT_INVALID_INPUT: u8 = 2;

/// Logs go to stderr so stdout only ever carries the CIDR output.
fn init_logging(config: &RunConfig) {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(config.log_level)
        .with_target(false)
        .init();
}

/// Writes the trace if a debug file was requested; failure is only logged
fn dump_diagnostics(config: &RunConfig, diagnostics: &Diagnostics) {
    if let Some(path) = &config.debug_file {
        match diagnostics.write_to(path) {
            Ok(()) => info!("Wrote lookup trace to {}", path.display()),
            Err(e) => warn!("Failed to write debug file {}: {}", path.display(), e),
        }
    }
}

async fn run(config: RunConfig) -> ExitCode {
    let code = match CountryCode::parse(&config.country) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return ExitCode::from(EXIT_INVALID_INPUT);
        }
    };

    let resolver = match Resolver::new(config.resolver.clone()) {
        Ok(resolver) => resolver,
        Err(e) => {
            error!("{}", e);
            eprintln!("ERROR: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut diagnostics = Diagnostics::new();
    let result = resolver
        .resolve(
            code.as_lower(),
            config.force_refresh,
            config.resolver.ttl,
            &mut diagnostics,
        )
        .await;
    dump_diagnostics(&config, &diagnostics);

    let cidrs = match result {
        Ok(cidrs) => cidrs,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return ExitCode::from(EXIT_INVALID_INPUT);
        }
    };

    let mut stdout = io::stdout().lock();
    if cidrs.is_empty() {
        let _ = writeln!(stdout, "# No CIDRs found for country {}", code.to_upper());
        for line in diagnostics.lines() {
            let _ = writeln!(stdout, "# {}", line);
        }
        eprintln!("ERROR: no CIDRs found for country {}", code.to_upper());
        return ExitCode::from(EXIT_NO_CIDRS);
    }

    let output = match render(config.format, &code, &cidrs, &config.set_names(&code)) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("ERROR: failed to render output: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = writeln!(stdout, "{}", output) {
        // Closed pipe (e.g. `| head`) is not an error.
        if e.kind() != io::ErrorKind::BrokenPipe {
            eprintln!("ERROR: failed to write output: {}", e);
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match RunConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return ExitCode::from(EXIT_INVALID_INPUT);
        }
    };

    init_logging(&config);
    run(config).await
}
