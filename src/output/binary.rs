//! Binary statistics file
//!
//! The consumer writes one fixed-size record per task class, in the order
//! random-read, random-write, sequential-read, sequential-write:
//!
//! | Field              | Type | Bytes |
//! |--------------------|------|-------|
//! | total operations   | u64  | 8     |
//! | average latency, s | f64  | 8     |
//! | total latency, s   | f64  | 8     |
//!
//! Records are encoded with bincode's default fixed-width little-endian
//! layout, so a file is always 96 bytes and can be read back with
//! [`read_stats_file`] or any tool that unpacks `<Qdd`.
//!
//! The default file name is the last path component of the target with `.bin`
//! appended. A target path without a `/` produces `default_output.bin`.

use crate::stats::RunStats;
use crate::workload::TaskClass;
use crate::Result;
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Size in bytes of one encoded [`StatsRecord`]
pub const RECORD_SIZE: usize = 24;

/// Name used when the target path has no separator
pub const DEFAULT_STATS_FILE: &str = "default_output.bin";

/// Persisted statistics of one task class
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsRecord {
    pub total_ops: u64,
    pub avg_latency_secs: f64,
    pub total_latency_secs: f64,
}

impl StatsRecord {
    /// Build the four records of a run in class order
    pub fn from_run(stats: &RunStats) -> [StatsRecord; 4] {
        TaskClass::ALL.map(|class| {
            let class_stats = stats.class(class);
            StatsRecord {
                total_ops: class_stats.ops(),
                avg_latency_secs: class_stats.average().as_secs_f64(),
                total_latency_secs: class_stats.total_latency().as_secs_f64(),
            }
        })
    }
}

/// Derive the statistics file name from the target path
///
/// # Examples
///
/// ```
/// use poissonio::output::binary::default_stats_path;
/// use std::path::PathBuf;
///
/// assert_eq!(default_stats_path("/dev/sdb"), PathBuf::from("sdb.bin"));
/// assert_eq!(default_stats_path("disk.img"), PathBuf::from("default_output.bin"));
/// ```
pub fn default_stats_path(target: impl AsRef<Path>) -> PathBuf {
    let target = target.as_ref().to_string_lossy();
    match target.rfind('/') {
        Some(idx) => PathBuf::from(format!("{}.bin", &target[idx + 1..])),
        None => PathBuf::from(DEFAULT_STATS_FILE),
    }
}

/// Write the four class records to `path`, replacing any existing file
pub fn write_stats_file(path: &Path, records: &[StatsRecord; 4]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create stats file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for record in records {
        bincode::serialize_into(&mut writer, record)
            .with_context(|| format!("Failed to encode stats record: {}", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write stats file: {}", path.display()))?;
    Ok(())
}

/// Read a statistics file written by [`write_stats_file`]
pub fn read_stats_file(path: &Path) -> Result<[StatsRecord; 4]> {
    let len = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat stats file: {}", path.display()))?
        .len();
    ensure!(
        len == (RECORD_SIZE * TaskClass::ALL.len()) as u64,
        "{} is {} bytes, expected {} (4 records of {} bytes)",
        path.display(),
        len,
        RECORD_SIZE * TaskClass::ALL.len(),
        RECORD_SIZE
    );

    let file = File::open(path)
        .with_context(|| format!("Failed to open stats file: {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let mut records = [StatsRecord::default(); 4];
    for (record, class) in records.iter_mut().zip(TaskClass::ALL) {
        *record = bincode::deserialize_from(&mut reader)
            .with_context(|| format!("Failed to decode {} record", class))?;
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_default_stats_path() {
        assert_eq!(default_stats_path("/dev/nvme0n1"), PathBuf::from("nvme0n1.bin"));
        assert_eq!(default_stats_path("./data/disk.img"), PathBuf::from("disk.img.bin"));
        assert_eq!(default_stats_path("disk.img"), PathBuf::from(DEFAULT_STATS_FILE));
        // Trailing separator leaves an empty component
        assert_eq!(default_stats_path("/mnt/"), PathBuf::from(".bin"));
    }

    #[test]
    fn test_record_layout_is_little_endian_fixed_width() {
        let record = StatsRecord {
            total_ops: 3,
            avg_latency_secs: 0.5,
            total_latency_secs: 1.5,
        };
        let bytes = bincode::serialize(&record).unwrap();
        assert_eq!(bytes.len(), RECORD_SIZE);
        assert_eq!(&bytes[0..8], &3u64.to_le_bytes());
        assert_eq!(&bytes[8..16], &0.5f64.to_le_bytes());
        assert_eq!(&bytes[16..24], &1.5f64.to_le_bytes());
    }

    #[test]
    fn test_write_then_read_run() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sdb.bin");

        let mut stats = RunStats::new().unwrap();
        stats.record(TaskClass::RandomRead, 512, Duration::from_millis(2));
        stats.record(TaskClass::RandomRead, 512, Duration::from_millis(4));
        stats.record(TaskClass::SequentialWrite, 4096, Duration::from_millis(10));

        let records = StatsRecord::from_run(&stats);
        write_stats_file(&path, &records).unwrap();

        assert_eq!(std::fs::metadata(&path).unwrap().len(), 96);

        let back = read_stats_file(&path).unwrap();
        assert_eq!(back[0].total_ops, 2);
        assert!((back[0].avg_latency_secs - 0.003).abs() < 1e-9);
        assert!((back[0].total_latency_secs - 0.006).abs() < 1e-9);
        assert_eq!(back[1], StatsRecord::default());
        assert_eq!(back[2], StatsRecord::default());
        assert_eq!(back[3].total_ops, 1);
        assert!((back[3].avg_latency_secs - 0.010).abs() < 1e-9);
    }

    #[test]
    fn test_read_rejects_wrong_size() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("short.bin");
        std::fs::write(&path, [0u8; 40]).unwrap();

        let err = read_stats_file(&path).unwrap_err();
        assert!(err.to_string().contains("expected 96"));
    }
}
