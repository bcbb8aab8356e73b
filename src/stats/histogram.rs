//! Latency histogram using HdrHistogram
//!
//! Each task class keeps one of these next to its plain counters. The counters
//! feed the statistics file; the histogram feeds the percentile columns of the
//! text and JSON reports.
//!
//! # Range
//!
//! - **Minimum**: 1 nanosecond
//! - **Maximum**: 1 hour (larger values are clamped)
//! - **Precision**: 3 significant digits
//!
//! # Example
//!
//! ```
//! use poissonio::stats::histogram::LatencyHistogram;
//! use std::time::Duration;
//!
//! let mut hist = LatencyHistogram::new().unwrap();
//! hist.record(Duration::from_micros(100));
//! hist.record(Duration::from_micros(300));
//!
//! let summary = hist.summary();
//! assert_eq!(summary.samples, 2);
//! assert!(summary.p50_us >= 99.0);
//! ```

use crate::error::BenchError;
use crate::Result;
use hdrhistogram::Histogram;
use serde::Serialize;
use std::time::Duration;

const MAX_TRACKABLE_NS: u64 = 3_600_000_000_000;

/// Latency histogram wrapper
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    histogram: Histogram<u64>,
}

/// Percentile digest of a histogram, in microseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub samples: u64,
    pub min_us: f64,
    pub mean_us: f64,
    pub p50_us: f64,
    pub p90_us: f64,
    pub p99_us: f64,
    pub p999_us: f64,
    pub max_us: f64,
}

impl LatencyHistogram {
    /// Create a histogram tracking 1ns to 1 hour at 3 significant digits
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::Allocation`] if the bucket array cannot be built.
    pub fn new() -> Result<Self> {
        let histogram = Histogram::new_with_bounds(1, MAX_TRACKABLE_NS, 3)
            .map_err(|e| BenchError::Allocation(format!("latency histogram: {}", e)))?;
        Ok(Self { histogram })
    }

    /// Record a latency sample, clamped into the trackable range
    #[inline]
    pub fn record(&mut self, latency: Duration) {
        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        let value = nanos.clamp(1, MAX_TRACKABLE_NS);
        let _ = self.histogram.record(value);
    }

    /// Latency at `percentile` (0.0 - 100.0), or None if empty
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.value_at_percentile(percentile)))
    }

    pub fn min(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.min()))
    }

    pub fn max(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.max()))
    }

    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.len() == 0
    }

    /// Collapse the histogram into the percentiles the reports print
    ///
    /// All fields are 0 for an empty histogram.
    pub fn summary(&self) -> LatencySummary {
        if self.is_empty() {
            return LatencySummary::default();
        }
        let us = |ns: u64| ns as f64 / 1000.0;
        LatencySummary {
            samples: self.histogram.len(),
            min_us: us(self.histogram.min()),
            mean_us: self.histogram.mean() / 1000.0,
            p50_us: us(self.histogram.value_at_percentile(50.0)),
            p90_us: us(self.histogram.value_at_percentile(90.0)),
            p99_us: us(self.histogram.value_at_percentile(99.0)),
            p999_us: us(self.histogram.value_at_percentile(99.9)),
            max_us: us(self.histogram.max()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_histogram_empty() {
        let hist = LatencyHistogram::new().unwrap();
        assert!(hist.is_empty());
        assert!(hist.percentile(50.0).is_none());
        assert!(hist.min().is_none());
        assert_eq!(hist.summary(), LatencySummary::default());
    }

    #[test]
    fn test_percentiles() {
        let mut hist = LatencyHistogram::new().unwrap();
        for i in 1..=100 {
            hist.record(Duration::from_micros(i * 10));
        }

        let p50 = hist.percentile(50.0).unwrap();
        let p99 = hist.percentile(99.0).unwrap();
        assert!(p50.as_micros() >= 450 && p50.as_micros() <= 550);
        assert!(p99.as_micros() >= 940 && p99.as_micros() <= 1040);

        let summary = hist.summary();
        assert_eq!(summary.samples, 100);
        assert!(summary.min_us >= 9.9 && summary.min_us <= 10.1);
        assert!(summary.max_us >= 999.0 && summary.max_us <= 1001.0);
        assert!(summary.mean_us >= 500.0 && summary.mean_us <= 510.0);
        assert!(summary.p90_us <= summary.p99_us);
    }

    #[test]
    fn test_out_of_range_clamped() {
        let mut hist = LatencyHistogram::new().unwrap();
        hist.record(Duration::ZERO);
        hist.record(Duration::from_secs(10 * 3600));
        assert_eq!(hist.len(), 2);
        assert_eq!(hist.min().unwrap(), Duration::from_nanos(1));
        assert!(hist.max().unwrap() >= Duration::from_secs(3599));
    }
}
