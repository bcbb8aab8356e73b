//! CLI to Config conversion utilities

use crate::config::cli::Cli;
use crate::config::{Config, WorkloadConfig};
use crate::util::buffer::FillPattern;
use crate::workload::TaskClass;
use anyhow::{anyhow, Context, Result};

/// Parse a size string (e.g., "1G", "100M", "4k") to bytes
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if s.ends_with("k") || s.ends_with("kb") {
        (s.trim_end_matches("kb").trim_end_matches("k"), 1024u64)
    } else if s.ends_with("m") || s.ends_with("mb") {
        (s.trim_end_matches("mb").trim_end_matches("m"), 1024 * 1024)
    } else if s.ends_with("g") || s.ends_with("gb") {
        (s.trim_end_matches("gb").trim_end_matches("g"), 1024 * 1024 * 1024)
    } else if s.ends_with("t") || s.ends_with("tb") {
        (s.trim_end_matches("tb").trim_end_matches("t"), 1024 * 1024 * 1024 * 1024)
    } else if s.ends_with("b") {
        (s.trim_end_matches("b"), 1)
    } else {
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .parse()
        .with_context(|| format!("Invalid size format: {}", s))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| anyhow!("Size out of range: {}", s))
}

/// Parse a duration string (e.g., "60", "60s", "5m", "1h") to seconds
pub fn parse_duration(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if s.ends_with("sec") || s.ends_with("s") {
        (s.trim_end_matches("sec").trim_end_matches("s"), 1u64)
    } else if s.ends_with("min") || s.ends_with("m") {
        (s.trim_end_matches("min").trim_end_matches("m"), 60)
    } else if s.ends_with("hr") || s.ends_with("h") {
        (s.trim_end_matches("hr").trim_end_matches("h"), 3600)
    } else {
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .parse()
        .with_context(|| format!("Invalid duration format: {}", s))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| anyhow!("Duration out of range: {}", s))
}

/// Parse an interval (e.g., "0.01", "10ms", "500us", "2s") to seconds
///
/// A bare number is taken as seconds and may be fractional.
pub fn parse_interval(s: &str) -> Result<f64> {
    let s = s.trim().to_lowercase();

    let (num_str, divisor) = if s.ends_with("us") {
        (s.trim_end_matches("us"), 1_000_000.0)
    } else if s.ends_with("ms") {
        (s.trim_end_matches("ms"), 1000.0)
    } else if s.ends_with("s") {
        (s.trim_end_matches("s"), 1.0)
    } else {
        (s.as_str(), 1.0)
    };

    let num: f64 = num_str
        .parse()
        .with_context(|| format!("Invalid interval format: {}", s))?;

    Ok(num / divisor)
}

/// Parse a time string (e.g., "100ms", "1s") to whole milliseconds, rounding up
pub fn parse_time_ms(s: &str) -> Result<u64> {
    let secs = parse_interval(s)?;
    if !secs.is_finite() || secs < 0.0 {
        anyhow::bail!("Invalid time: {}", s);
    }
    let micros = (secs * 1e6).round() as u64;
    Ok(micros.div_ceil(1000))
}

/// Build the workload and target from the eleven positional arguments
///
/// Returns `None` when no positional argument was given.
pub fn positional_config(cli: &Cli) -> Result<Option<Config>> {
    if cli.has_no_positionals() {
        return Ok(None);
    }

    let missing = cli.missing_positionals();
    if !missing.is_empty() {
        anyhow::bail!("Missing positional arguments: {}", missing.join(" "));
    }

    let present = |value: Option<u8>| value.unwrap_or_default();
    let percentages = [
        present(cli.rread_prob),
        present(cli.rwrite_prob),
        present(cli.sread_prob),
        present(cli.swrite_prob),
    ];

    let size_args = [&cli.rread_size, &cli.rwrite_size, &cli.sread_size, &cli.swrite_size];
    let mut sizes = [0u64; 4];
    for ((size, arg), class) in sizes.iter_mut().zip(size_args).zip(TaskClass::ALL) {
        let text = arg.as_deref().unwrap_or_default();
        *size = parse_size(text).with_context(|| format!("Invalid {} size", class))?;
    }

    let duration_secs = parse_duration(cli.duration.as_deref().unwrap_or_default())
        .context("Invalid duration")?;
    let interval_secs = parse_interval(cli.interval.as_deref().unwrap_or_default())
        .context("Invalid interval")?;

    let path = cli
        .target
        .clone()
        .ok_or_else(|| anyhow!("Missing target path"))?;

    let workload = WorkloadConfig::new(percentages, sizes, duration_secs, interval_secs);
    Ok(Some(Config::new(workload, path)))
}

/// Apply flag overrides to a configuration
pub fn apply_flags(cli: &Cli, config: &mut Config) -> Result<()> {
    if let Some(capacity) = cli.queue_capacity {
        config.runtime.queue_capacity = capacity;
    }
    if let Some(seed) = cli.seed {
        config.workload.seed = Some(seed);
    }
    if let Some(ref pattern) = cli.write_pattern {
        config.workload.write_pattern = pattern
            .parse::<FillPattern>()
            .map_err(|e| anyhow!(e))
            .context("Invalid write pattern")?;
    }

    if let Some(ref extent) = cli.extent {
        config.target.extent = Some(parse_size(extent).context("Invalid extent")?);
    }
    if let Some(ref alignment) = cli.alignment {
        config.target.alignment = Some(parse_size(alignment).context("Invalid alignment")?);
    }
    if cli.direct {
        config.target.direct = true;
    }
    if cli.buffered {
        config.target.sync = false;
    }

    if let Some(ref path) = cli.stats_file {
        config.output.stats_file = Some(path.clone());
    }
    if let Some(ref path) = cli.json_output {
        config.output.json_output = Some(path.clone());
    }

    if let Some(ref poll) = cli.poll_interval {
        config.runtime.poll_interval_ms = parse_time_ms(poll).context("Invalid poll interval")?;
    }
    if cli.dry_run {
        config.runtime.dry_run = true;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("512b").unwrap(), 512);
        assert_eq!(parse_size("4k").unwrap(), 4096);
        assert_eq!(parse_size("4KB").unwrap(), 4096);
        assert_eq!(parse_size("1M").unwrap(), 1024 * 1024);
        assert_eq!(parse_size("2g").unwrap(), 2 * 1024 * 1024 * 1024);
        assert!(parse_size("abc").is_err());
        assert!(parse_size("99999999999t").is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("60").unwrap(), 60);
        assert_eq!(parse_duration("60s").unwrap(), 60);
        assert_eq!(parse_duration("5m").unwrap(), 300);
        assert_eq!(parse_duration("1h").unwrap(), 3600);
        assert!(parse_duration("1.5").is_err());
    }

    #[test]
    fn test_parse_interval() {
        assert!((parse_interval("0.01").unwrap() - 0.01).abs() < 1e-12);
        assert!((parse_interval("10ms").unwrap() - 0.01).abs() < 1e-12);
        assert!((parse_interval("500us").unwrap() - 0.0005).abs() < 1e-12);
        assert!((parse_interval("2s").unwrap() - 2.0).abs() < 1e-12);
        assert!(parse_interval("fast").is_err());
    }

    #[test]
    fn test_parse_time_ms() {
        assert_eq!(parse_time_ms("100ms").unwrap(), 100);
        assert_eq!(parse_time_ms("1s").unwrap(), 1000);
        assert_eq!(parse_time_ms("1500us").unwrap(), 2);
        assert!(parse_time_ms("-1").is_err());
    }

    #[test]
    fn test_positional_config() {
        let cli = Cli::try_parse_from([
            "poissonio", "10", "25", "50", "15", "512", "4k", "128k", "0", "2m", "10ms", "/dev/sdb",
        ])
        .unwrap();
        let config = positional_config(&cli).unwrap().unwrap();

        assert_eq!(config.workload.percentages(), [10, 25, 50, 15]);
        assert_eq!(config.workload.sizes(), [512, 4096, 131072, 0]);
        assert_eq!(config.workload.duration_secs, 120);
        assert!((config.workload.interval_secs - 0.01).abs() < 1e-12);
        assert_eq!(config.target.path, std::path::PathBuf::from("/dev/sdb"));
    }

    #[test]
    fn test_no_positionals() {
        let cli = Cli::try_parse_from(["poissonio", "--config", "x.toml"]).unwrap();
        assert!(positional_config(&cli).unwrap().is_none());
    }

    #[test]
    fn test_apply_flags() {
        let cli = Cli::try_parse_from([
            "poissonio", "100", "0", "0", "0", "512", "0", "0", "0", "1", "0.1", "disk.img",
            "--buffered", "--extent", "1M", "--alignment", "4k", "--write-pattern", "zeros",
            "--poll-interval", "20ms", "--stats-file", "out.bin", "--dry-run",
        ])
        .unwrap();
        let mut config = positional_config(&cli).unwrap().unwrap();
        apply_flags(&cli, &mut config).unwrap();

        assert!(!config.target.sync);
        assert_eq!(config.target.extent, Some(1024 * 1024));
        assert_eq!(config.target.alignment, Some(4096));
        assert_eq!(config.workload.write_pattern, FillPattern::Zeros);
        assert_eq!(config.runtime.poll_interval_ms, 20);
        assert_eq!(config.stats_path(), std::path::PathBuf::from("out.bin"));
        assert!(config.runtime.dry_run);
    }

    #[test]
    fn test_apply_flags_bad_pattern() {
        let cli = Cli::try_parse_from(["poissonio", "--config", "x.toml", "--write-pattern", "stripes"]).unwrap();
        let mut config = Config::new(WorkloadConfig::new([100, 0, 0, 0], [512, 0, 0, 0], 1, 0.1), "x");
        assert!(apply_flags(&cli, &mut config).is_err());
    }
}
