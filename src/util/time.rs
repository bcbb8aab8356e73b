//! Timing and formatting helpers
//!
//! Latency is measured with the monotonic clock around each positioned read or
//! write. Rates and sizes are formatted for the text report.

use std::time::{Duration, Instant};

/// Monotonic start point of a measurement
#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    instant: Instant,
}

impl Timestamp {
    #[inline]
    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.instant.elapsed()
    }
}

/// Format a duration in human-readable form
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use poissonio::util::time::format_duration;
///
/// assert_eq!(format_duration(Duration::from_nanos(500)), "500ns");
/// assert_eq!(format_duration(Duration::from_nanos(1500)), "1.50us");
/// assert_eq!(format_duration(Duration::from_micros(2500)), "2.50ms");
/// assert_eq!(format_duration(Duration::from_secs(5)), "5.00s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    if nanos < 1_000 {
        format!("{}ns", nanos)
    } else if nanos < 1_000_000 {
        format!("{:.2}us", nanos as f64 / 1_000.0)
    } else if nanos < 1_000_000_000 {
        format!("{:.2}ms", nanos as f64 / 1_000_000.0)
    } else {
        format!("{:.2}s", nanos as f64 / 1_000_000_000.0)
    }
}

/// Format microseconds from a latency summary the way [`format_duration`] does
pub fn format_micros(us: f64) -> String {
    format_duration(Duration::from_nanos((us * 1000.0).round().max(0.0) as u64))
}

/// Operations per second, or 0 for an empty interval
pub fn calculate_iops(operations: u64, duration: Duration) -> f64 {
    let seconds = duration.as_secs_f64();
    if seconds > 0.0 {
        operations as f64 / seconds
    } else {
        0.0
    }
}

/// Bytes per second, or 0 for an empty interval
pub fn calculate_throughput(bytes: u64, duration: Duration) -> f64 {
    let seconds = duration.as_secs_f64();
    if seconds > 0.0 {
        bytes as f64 / seconds
    } else {
        0.0
    }
}

/// Format throughput in human-readable form (B/s, KB/s, MB/s, GB/s)
///
/// # Examples
///
/// ```
/// use poissonio::util::time::format_throughput;
///
/// assert_eq!(format_throughput(500.0), "500.00 B/s");
/// assert_eq!(format_throughput(1536.0), "1.50 KB/s");
/// assert_eq!(format_throughput(2_621_440.0), "2.50 MB/s");
/// ```
pub fn format_throughput(bytes_per_sec: f64) -> String {
    format!("{}/s", format_bytes_f64(bytes_per_sec))
}

/// Format a byte count with binary units
///
/// # Examples
///
/// ```
/// use poissonio::util::time::format_bytes;
///
/// assert_eq!(format_bytes(512), "512.00 B");
/// assert_eq!(format_bytes(4096), "4.00 KB");
/// assert_eq!(format_bytes(1 << 30), "1.00 GB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    format_bytes_f64(bytes as f64)
}

fn format_bytes_f64(bytes: f64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    const TB: f64 = GB * 1024.0;

    if bytes >= TB {
        format!("{:.2} TB", bytes / TB)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes / GB)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes / MB)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes / KB)
    } else {
        format!("{:.2} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_timestamp_elapsed() {
        let start = Timestamp::now();
        thread::sleep(Duration::from_millis(10));
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_format_micros() {
        assert_eq!(format_micros(0.5), "500ns");
        assert_eq!(format_micros(250.0), "250.00us");
        assert_eq!(format_micros(1500.0), "1.50ms");
    }

    #[test]
    fn test_rates_of_empty_interval() {
        assert_eq!(calculate_iops(100, Duration::ZERO), 0.0);
        assert_eq!(calculate_throughput(100, Duration::ZERO), 0.0);
        assert_eq!(calculate_iops(500, Duration::from_secs(2)), 250.0);
        assert_eq!(calculate_throughput(4096, Duration::from_millis(500)), 8192.0);
    }

    #[test]
    fn test_format_large_sizes() {
        assert_eq!(format_bytes(3 << 40), "3.00 TB");
        assert_eq!(format_throughput(2_684_354_560.0), "2.50 GB/s");
    }
}
