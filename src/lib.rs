//! PoissonIO - storage benchmark with Poisson-distributed arrivals
//!
//! Drives a configurable mix of random and sequential reads and writes against
//! a single file or block device. Requests arrive as a Poisson process: the
//! gaps between them are exponentially distributed around a mean interval.
//! Per-class latency statistics are written to a compact binary file when the
//! run ends.
//!
//! # Architecture
//!
//! - **Producer**: samples inter-arrival delays, generates work items
//! - **Bounded queue**: carries items to the consumer and applies backpressure
//! - **Consumer**: performs positioned IO, times it, owns the statistics
//! - **Timer**: bounds the run and sequences shutdown so the consumer always
//!   persists its statistics before the producer is cancelled
//!
//! # Example
//!
//! ```
//! use poissonio::config::{Config, WorkloadConfig};
//! use poissonio::coordinator::run_with_target;
//! use poissonio::target::memory::MemoryTarget;
//!
//! let dir = std::env::temp_dir();
//! let mut config = Config::new(
//!     WorkloadConfig::new([100, 0, 0, 0], [512, 0, 0, 0], 1, 0.01),
//!     "memory",
//! );
//! config.output.stats_file = Some(dir.join("poissonio-doc.bin"));
//!
//! let report = run_with_target(&config, Box::new(MemoryTarget::new(1 << 20))).unwrap();
//! assert_eq!(report.stats.total_ops(), report.stats.class(poissonio::TaskClass::RandomRead).ops());
//! ```

pub mod config;
pub mod coordinator;
pub mod distribution;
pub mod error;
pub mod output;
pub mod queue;
pub mod stats;
pub mod target;
pub mod util;
pub mod worker;
pub mod workload;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::RunReport;
pub use error::BenchError;
pub use queue::{BoundedQueue, QueueMode};
pub use workload::{TaskClass, WorkItem, WorkProfile};

/// Result type used throughout PoissonIO
pub type Result<T> = anyhow::Result<T>;
