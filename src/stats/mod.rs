//! Statistics collection
//!
//! Per-class IO statistics owned by the consumer thread. There is exactly one
//! writer, so counters are plain integers rather than atomics and nothing here
//! is shared until the consumer hands the finished [`RunStats`] back.
//!
//! For each [`TaskClass`] the consumer records:
//!
//! - **Operations**: completed IOs
//! - **Bytes**: bytes transferred (used for throughput and flush attribution)
//! - **Total latency**: sum of per-IO wall-clock time
//! - **Histogram**: latency distribution for percentile reporting
//!
//! # Flush attribution
//!
//! Writes on a buffered target are not durable until the final flush. The cost
//! of that flush is charged to the write classes after the main loop, split in
//! proportion to the bytes each class wrote. See [`RunStats::attribute_flush`].
//!
//! # Example
//!
//! ```
//! use poissonio::stats::RunStats;
//! use poissonio::workload::TaskClass;
//! use std::time::Duration;
//!
//! let mut stats = RunStats::new().unwrap();
//! stats.record(TaskClass::RandomRead, 4096, Duration::from_micros(100));
//! stats.record(TaskClass::RandomRead, 4096, Duration::from_micros(300));
//!
//! let rr = stats.class(TaskClass::RandomRead);
//! assert_eq!(rr.ops(), 2);
//! assert_eq!(rr.average(), Duration::from_micros(200));
//! ```

pub mod histogram;

use crate::workload::TaskClass;
use crate::Result;
use histogram::{LatencyHistogram, LatencySummary};
use std::time::Duration;

/// Statistics for one task class
#[derive(Debug, Clone)]
pub struct ClassStats {
    ops: u64,
    bytes: u64,
    total_latency: Duration,
    /// Share of the final flush charged to this class
    flush_share: Duration,
    histogram: LatencyHistogram,
}

impl ClassStats {
    /// Create empty statistics
    ///
    /// # Errors
    ///
    /// Fails if the latency histogram cannot be allocated.
    pub fn new() -> Result<Self> {
        Ok(Self {
            ops: 0,
            bytes: 0,
            total_latency: Duration::ZERO,
            flush_share: Duration::ZERO,
            histogram: LatencyHistogram::new()?,
        })
    }

    #[inline]
    pub fn record(&mut self, bytes: u64, latency: Duration) {
        self.ops += 1;
        self.bytes += bytes;
        self.total_latency += latency;
        self.histogram.record(latency);
    }

    #[inline]
    pub fn ops(&self) -> u64 {
        self.ops
    }

    #[inline]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Accumulated latency, including any attributed flush time
    #[inline]
    pub fn total_latency(&self) -> Duration {
        self.total_latency + self.flush_share
    }

    #[inline]
    pub fn flush_share(&self) -> Duration {
        self.flush_share
    }

    /// Mean latency per operation, or zero when nothing ran
    pub fn average(&self) -> Duration {
        if self.ops == 0 {
            return Duration::ZERO;
        }
        self.total_latency().div_f64(self.ops as f64)
    }

    pub fn histogram(&self) -> &LatencyHistogram {
        &self.histogram
    }

    pub fn latency_summary(&self) -> LatencySummary {
        self.histogram.summary()
    }
}

/// Statistics for a whole run, one [`ClassStats`] per task class
#[derive(Debug, Clone)]
pub struct RunStats {
    classes: [ClassStats; 4],
    flush_latency: Option<Duration>,
}

impl RunStats {
    /// Create empty statistics for all four classes
    pub fn new() -> Result<Self> {
        Ok(Self {
            classes: [
                ClassStats::new()?,
                ClassStats::new()?,
                ClassStats::new()?,
                ClassStats::new()?,
            ],
            flush_latency: None,
        })
    }

    /// Record one completed IO
    ///
    /// # Arguments
    ///
    /// * `class` - Task class of the IO
    /// * `bytes` - Bytes transferred
    /// * `latency` - Wall-clock time of the read or write call
    #[inline]
    pub fn record(&mut self, class: TaskClass, bytes: u64, latency: Duration) {
        self.classes[class.index()].record(bytes, latency);
    }

    pub fn class(&self, class: TaskClass) -> &ClassStats {
        &self.classes[class.index()]
    }

    /// Per-class statistics in [`TaskClass::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = (TaskClass, &ClassStats)> {
        TaskClass::ALL.into_iter().zip(self.classes.iter())
    }

    pub fn total_ops(&self) -> u64 {
        self.classes.iter().map(ClassStats::ops).sum()
    }

    pub fn total_bytes(&self) -> u64 {
        self.classes.iter().map(ClassStats::bytes).sum()
    }

    /// Bytes written by both write classes
    pub fn write_bytes(&self) -> u64 {
        self.iter()
            .filter(|(class, _)| class.is_write())
            .map(|(_, stats)| stats.bytes())
            .sum()
    }

    /// Time spent in the final flush, if one ran
    pub fn flush_latency(&self) -> Option<Duration> {
        self.flush_latency
    }

    /// Charge the final flush to the write classes
    ///
    /// Each write class receives `latency * class_bytes / write_bytes`. When
    /// nothing was written the flush is recorded but charged to no class.
    /// Histograms are left untouched; only totals and averages move.
    pub fn attribute_flush(&mut self, latency: Duration) {
        self.flush_latency = Some(self.flush_latency.unwrap_or_default() + latency);

        let write_bytes = self.write_bytes();
        if write_bytes == 0 {
            return;
        }

        for class in [TaskClass::RandomWrite, TaskClass::SequentialWrite] {
            let stats = &mut self.classes[class.index()];
            if stats.bytes == 0 {
                continue;
            }
            let nanos = latency.as_nanos() * stats.bytes as u128 / write_bytes as u128;
            stats.flush_share += Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX));
        }
    }
}
