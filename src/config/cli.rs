//! CLI argument parsing using clap
//!
//! The positional arguments follow the classic invocation order:
//!
//! ```text
//! poissonio RREAD_PROB RWRITE_PROB SREAD_PROB SWRITE_PROB \
//!           RREAD_SIZE RWRITE_SIZE SREAD_SIZE SWRITE_SIZE \
//!           DURATION INTERVAL PATH
//! ```
//!
//! They are optional so that a run can come entirely from `--config`, but
//! when any is given all eleven must be.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// PoissonIO - storage benchmark with Poisson-distributed arrivals
#[derive(Parser, Debug)]
#[command(name = "poissonio")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Random read probability (percent)
    #[arg(value_name = "RREAD_PROB")]
    pub rread_prob: Option<u8>,

    /// Random write probability (percent)
    #[arg(value_name = "RWRITE_PROB")]
    pub rwrite_prob: Option<u8>,

    /// Sequential read probability (percent)
    #[arg(value_name = "SREAD_PROB")]
    pub sread_prob: Option<u8>,

    /// Sequential write probability (percent)
    #[arg(value_name = "SWRITE_PROB")]
    pub swrite_prob: Option<u8>,

    /// Random read size (e.g., 512, 4k)
    #[arg(value_name = "RREAD_SIZE")]
    pub rread_size: Option<String>,

    /// Random write size
    #[arg(value_name = "RWRITE_SIZE")]
    pub rwrite_size: Option<String>,

    /// Sequential read size
    #[arg(value_name = "SREAD_SIZE")]
    pub sread_size: Option<String>,

    /// Sequential write size
    #[arg(value_name = "SWRITE_SIZE")]
    pub swrite_size: Option<String>,

    /// Run duration (e.g., 60, 60s, 5m, 1h)
    #[arg(value_name = "DURATION")]
    pub duration: Option<String>,

    /// Mean inter-arrival interval (e.g., 0.01, 10ms, 500us)
    #[arg(value_name = "INTERVAL")]
    pub interval: Option<String>,

    /// Target file or block device
    #[arg(value_name = "PATH")]
    pub target: Option<PathBuf>,

    // === Configuration ===
    /// TOML profile file; positional arguments and flags override it
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Work queue capacity (one slot is always left free)
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Seed for reproducible workloads
    #[arg(long)]
    pub seed: Option<u64>,

    // === Target Options ===
    /// Limit the addressed extent (e.g., 10G); defaults to the target size
    #[arg(long)]
    pub extent: Option<String>,

    /// Use direct IO (O_DIRECT) - bypasses page cache
    #[arg(long)]
    pub direct: bool,

    /// Open without O_SYNC
    #[arg(long)]
    pub buffered: bool,

    /// Alignment of random offsets (defaults to 4k with --direct, else 1)
    #[arg(long)]
    pub alignment: Option<String>,

    /// Pattern for write buffer data: ones, zeros, random, sequential
    #[arg(long)]
    pub write_pattern: Option<String>,

    // === Output Options ===
    /// Binary statistics file (defaults to <target name>.bin)
    #[arg(long, value_name = "PATH")]
    pub stats_file: Option<PathBuf>,

    /// Write a JSON report
    #[arg(long, value_name = "PATH")]
    pub json_output: Option<PathBuf>,

    /// Print a previously written statistics file and exit
    #[arg(long, value_name = "FILE")]
    pub inspect: Option<PathBuf>,

    // === Runtime Options ===
    /// Longest consumer wait on an empty queue (e.g., 100ms)
    #[arg(long)]
    pub poll_interval: Option<String>,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    fn positionals(&self) -> [(&'static str, bool); 11] {
        [
            ("RREAD_PROB", self.rread_prob.is_some()),
            ("RWRITE_PROB", self.rwrite_prob.is_some()),
            ("SREAD_PROB", self.sread_prob.is_some()),
            ("SWRITE_PROB", self.swrite_prob.is_some()),
            ("RREAD_SIZE", self.rread_size.is_some()),
            ("RWRITE_SIZE", self.rwrite_size.is_some()),
            ("SREAD_SIZE", self.sread_size.is_some()),
            ("SWRITE_SIZE", self.swrite_size.is_some()),
            ("DURATION", self.duration.is_some()),
            ("INTERVAL", self.interval.is_some()),
            ("PATH", self.target.is_some()),
        ]
    }

    /// True when no positional argument was given
    pub fn has_no_positionals(&self) -> bool {
        self.positionals().iter().all(|(_, present)| !present)
    }

    /// Names of the positional arguments that are missing
    pub fn missing_positionals(&self) -> Vec<&'static str> {
        self.positionals()
            .iter()
            .filter(|(_, present)| !present)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.inspect.is_some() {
            return Ok(());
        }

        if self.config.is_none() && self.has_no_positionals() {
            anyhow::bail!("No workload given: pass the positional arguments or --config <FILE>");
        }

        let missing = self.missing_positionals();
        if !self.has_no_positionals() && !missing.is_empty() {
            anyhow::bail!("Missing positional arguments: {}", missing.join(" "));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: [&str; 12] = [
        "poissonio", "10", "25", "50", "15", "4k", "4k", "128k", "128k", "60", "0.01", "/dev/sdb",
    ];

    #[test]
    fn test_positionals_in_order() {
        let cli = Cli::try_parse_from(FULL).unwrap();
        assert_eq!(cli.rread_prob, Some(10));
        assert_eq!(cli.swrite_prob, Some(15));
        assert_eq!(cli.sread_size.as_deref(), Some("128k"));
        assert_eq!(cli.interval.as_deref(), Some("0.01"));
        assert_eq!(cli.target, Some(PathBuf::from("/dev/sdb")));
        assert!(cli.missing_positionals().is_empty());
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_partial_positionals_rejected() {
        let cli = Cli::try_parse_from(&FULL[..6]).unwrap();
        let err = cli.validate().unwrap_err().to_string();
        assert!(err.contains("SREAD_SIZE"));
        assert!(err.contains("PATH"));
    }

    #[test]
    fn test_config_only() {
        let cli = Cli::try_parse_from(["poissonio", "--config", "run.toml", "-vv"]).unwrap();
        assert!(cli.has_no_positionals());
        assert_eq!(cli.verbose, 2);
        assert!(cli.validate().is_ok());

        let cli = Cli::try_parse_from(["poissonio"]).unwrap();
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_inspect_needs_nothing_else() {
        let cli = Cli::try_parse_from(["poissonio", "--inspect", "sdb.bin"]).unwrap();
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_flags() {
        let mut args = FULL.to_vec();
        args.extend(["--direct", "--buffered", "--queue-capacity", "128", "--seed", "7"]);
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.direct);
        assert!(cli.buffered);
        assert_eq!(cli.queue_capacity, Some(128));
        assert_eq!(cli.seed, Some(7));
    }
}
