//! Configuration module
//!
//! Handles CLI argument parsing, TOML profile files, and validation.
//!
//! A [`Config`] is assembled once in `main` (from positional arguments, an
//! optional TOML file and flags), validated, and then only read. Nothing here
//! changes after the threads start.
//!
//! # TOML layout
//!
//! ```toml
//! [workload]
//! duration_secs = 60
//! interval_secs = 0.01
//! random_read = { percent = 10, size = 4096 }
//! random_write = { percent = 25, size = 4096 }
//! sequential_read = { percent = 50, size = 131072 }
//! sequential_write = { percent = 15, size = 131072 }
//!
//! [target]
//! path = "/dev/sdb"
//! ```

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;

use crate::distribution::exponential::rate_from_interval;
use crate::error::ProfileError;
use crate::output::binary::default_stats_path;
use crate::target::OpenFlags;
use crate::util::buffer::FillPattern;
use crate::workload::{TaskClass, WorkProfile};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Complete run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub workload: WorkloadConfig,
    pub target: TargetConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl Config {
    /// Configuration with default target, output and runtime settings
    pub fn new(workload: WorkloadConfig, path: impl Into<PathBuf>) -> Self {
        Self {
            workload,
            target: TargetConfig::new(path),
            output: OutputConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }

    /// Build the work profile from the class percentages and sizes
    pub fn profile(&self) -> Result<WorkProfile, ProfileError> {
        WorkProfile::from_percentages(self.workload.percentages(), self.workload.sizes())
    }

    /// Statistics file location: the explicit setting, else derived from the
    /// target path
    pub fn stats_path(&self) -> PathBuf {
        self.output
            .stats_file
            .clone()
            .unwrap_or_else(|| default_stats_path(&self.target.path))
    }
}

/// Probability and IO size of one task class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassConfig {
    /// Share of generated items, in percent
    #[serde(default)]
    pub percent: u8,
    /// IO size in bytes
    #[serde(default)]
    pub size: u64,
}

/// Workload mix and timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadConfig {
    #[serde(default)]
    pub random_read: ClassConfig,
    #[serde(default)]
    pub random_write: ClassConfig,
    #[serde(default)]
    pub sequential_read: ClassConfig,
    #[serde(default)]
    pub sequential_write: ClassConfig,
    /// Length of the measurement phase
    pub duration_secs: u64,
    /// Mean inter-arrival interval (reciprocal of the arrival rate)
    pub interval_secs: f64,
    /// Seed for the workload and arrival generators (random when unset)
    #[serde(default)]
    pub seed: Option<u64>,
    /// Contents of write buffers
    #[serde(default)]
    pub write_pattern: FillPattern,
}

impl WorkloadConfig {
    /// Build a workload from per-class arrays in [`TaskClass::ALL`] order
    pub fn new(percentages: [u8; 4], sizes: [u64; 4], duration_secs: u64, interval_secs: f64) -> Self {
        let class = |i: usize| ClassConfig {
            percent: percentages[i],
            size: sizes[i],
        };
        Self {
            random_read: class(0),
            random_write: class(1),
            sequential_read: class(2),
            sequential_write: class(3),
            duration_secs,
            interval_secs,
            seed: None,
            write_pattern: FillPattern::default(),
        }
    }

    pub fn class(&self, class: TaskClass) -> &ClassConfig {
        match class {
            TaskClass::RandomRead => &self.random_read,
            TaskClass::RandomWrite => &self.random_write,
            TaskClass::SequentialRead => &self.sequential_read,
            TaskClass::SequentialWrite => &self.sequential_write,
        }
    }

    pub fn class_mut(&mut self, class: TaskClass) -> &mut ClassConfig {
        match class {
            TaskClass::RandomRead => &mut self.random_read,
            TaskClass::RandomWrite => &mut self.random_write,
            TaskClass::SequentialRead => &mut self.sequential_read,
            TaskClass::SequentialWrite => &mut self.sequential_write,
        }
    }

    pub fn percentages(&self) -> [u8; 4] {
        TaskClass::ALL.map(|class| self.class(class).percent)
    }

    pub fn sizes(&self) -> [u64; 4] {
        TaskClass::ALL.map(|class| self.class(class).size)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    /// Mean arrivals per second
    pub fn rate(&self) -> f64 {
        rate_from_interval(self.interval_secs)
    }
}

/// Target device or file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Existing file or block device
    pub path: PathBuf,
    /// Use direct IO (O_DIRECT)
    #[serde(default)]
    pub direct: bool,
    /// Use synchronous IO (O_SYNC)
    #[serde(default = "default_sync")]
    pub sync: bool,
    /// Limit the addressed extent below the target size
    #[serde(default)]
    pub extent: Option<u64>,
    /// Alignment of random offsets
    #[serde(default)]
    pub alignment: Option<u64>,
}

fn default_sync() -> bool {
    true
}

impl TargetConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            direct: false,
            sync: default_sync(),
            extent: None,
            alignment: None,
        }
    }

    pub fn open_flags(&self) -> OpenFlags {
        OpenFlags {
            direct: self.direct,
            sync: self.sync,
        }
    }

    /// Random offset alignment: explicit, else 4096 for direct IO, else 1
    pub fn effective_alignment(&self) -> u64 {
        self.alignment
            .unwrap_or(if self.direct { 4096 } else { 1 })
    }
}

/// Result files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Binary statistics file (derived from the target path when unset)
    #[serde(default)]
    pub stats_file: Option<PathBuf>,
    /// JSON report
    #[serde(default)]
    pub json_output: Option<PathBuf>,
}

/// Runtime knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Slots in the work queue (one is always left free)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Longest consumer wait on an empty queue before re-checking for stop
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Validate and print the plan without running
    #[serde(default)]
    pub dry_run: bool,
}

fn default_queue_capacity() -> usize {
    64
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            poll_interval_ms: default_poll_interval_ms(),
            dry_run: false,
        }
    }
}

impl RuntimeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
