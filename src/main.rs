//! PoissonIO CLI entry point

use anyhow::{Context, Result};
use poissonio::config::cli::Cli;
use poissonio::config::{cli_convert, toml, validator, Config};
use poissonio::coordinator;
use poissonio::output::{binary, json, text};
use poissonio::target::file::FileTarget;
use poissonio::target::Target;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    println!("PoissonIO v{}", env!("CARGO_PKG_VERSION"));
    println!("Storage benchmark with Poisson-distributed arrivals");
    println!();

    cli.validate()?;

    if let Some(ref path) = cli.inspect {
        let records = binary::read_stats_file(path)?;
        text::print_stats_file(path, &records);
        return Ok(());
    }

    let config = build_config(&cli)?;

    validator::validate_config(&config).context("Configuration validation failed")?;

    if config.runtime.dry_run {
        let mut target = FileTarget::open(&config.target.path, config.target.open_flags())?;
        let extent = coordinator::resolve_extent(&config, target.size())?;
        target.close()?;

        text::print_configuration(&config, Some(extent));
        println!();
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    text::print_configuration(&config, None);
    println!();
    println!("Starting test...");
    println!();

    let report = coordinator::run_benchmark(&config)?;

    text::print_results(&report);

    if let Some(ref path) = config.output.json_output {
        json::write_json(path, &report, &config)?;
        info!(path = %path.display(), "JSON report written");
        println!("JSON report written to {}", path.display());
    }

    Ok(())
}

/// Install the tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise each `-v` raises the level from `warn`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Build configuration from the TOML file (if any), positionals and flags
fn build_config(cli: &Cli) -> Result<Config> {
    match cli.config {
        Some(ref path) => {
            let file_config = toml::parse_toml_file(path)?;
            toml::merge_cli_with_config(cli, file_config)
        }
        None => {
            let mut config = cli_convert::positional_config(cli)?
                .context("No workload given: pass the positional arguments or --config <FILE>")?;
            cli_convert::apply_flags(cli, &mut config)?;
            Ok(config)
        }
    }
}
