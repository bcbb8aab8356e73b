//! JSON output formatting
//!
//! A single document per run: when it ran, how it was configured, and the
//! per-class results including latency percentiles. The binary statistics
//! file stays the compact record; this is the self-describing one.

use crate::config::Config;
use crate::coordinator::RunReport;
use crate::stats::histogram::LatencySummary;
use crate::stats::ClassStats;
use crate::util::time::{calculate_iops, calculate_throughput};
use crate::workload::TaskClass;
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Complete JSON report
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    pub tool: JsonToolInfo,
    pub config: JsonRunConfig,
    pub results: JsonResults,
}

/// Tool and run identification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonToolInfo {
    pub name: String,
    pub version: String,
    /// RFC 3339 timestamp of report creation
    pub timestamp: String,
}

/// The parts of the configuration that shape the results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRunConfig {
    pub target: String,
    pub extent: u64,
    pub duration_secs: u64,
    pub interval_secs: f64,
    pub queue_capacity: usize,
    pub direct: bool,
    pub sync: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub classes: Vec<JsonClassConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonClassConfig {
    pub class: TaskClass,
    pub percent: u8,
    pub size: u64,
}

/// Run results
#[derive(Debug, Clone, Serialize)]
pub struct JsonResults {
    pub elapsed_secs: f64,
    pub total_ops: u64,
    pub total_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush_secs: Option<f64>,
    pub generated: u64,
    pub enqueued: u64,
    pub unprocessed: usize,
    pub classes: Vec<JsonClassResult>,
}

/// Results of one task class
#[derive(Debug, Clone, Serialize)]
pub struct JsonClassResult {
    pub class: TaskClass,
    pub ops: u64,
    pub bytes: u64,
    pub iops: f64,
    pub throughput_bytes_per_sec: f64,
    /// Mean latency including the attributed flush share
    pub avg_latency_secs: f64,
    pub total_latency_secs: f64,
    pub flush_share_secs: f64,
    /// Per-IO latency distribution (flush share excluded)
    pub latency: LatencySummary,
}

impl JsonClassResult {
    fn new(class: TaskClass, stats: &ClassStats, elapsed: std::time::Duration) -> Self {
        Self {
            class,
            ops: stats.ops(),
            bytes: stats.bytes(),
            iops: calculate_iops(stats.ops(), elapsed),
            throughput_bytes_per_sec: calculate_throughput(stats.bytes(), elapsed),
            avg_latency_secs: stats.average().as_secs_f64(),
            total_latency_secs: stats.total_latency().as_secs_f64(),
            flush_share_secs: stats.flush_share().as_secs_f64(),
            latency: stats.latency_summary(),
        }
    }
}

/// Build the JSON report for a finished run
pub fn build_report(report: &RunReport, config: &Config) -> JsonReport {
    let stats = &report.stats;

    JsonReport {
        tool: JsonToolInfo {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        },
        config: JsonRunConfig {
            target: config.target.path.display().to_string(),
            extent: report.extent,
            duration_secs: config.workload.duration_secs,
            interval_secs: config.workload.interval_secs,
            queue_capacity: config.runtime.queue_capacity,
            direct: config.target.direct,
            sync: config.target.sync,
            seed: config.workload.seed,
            classes: TaskClass::ALL
                .iter()
                .map(|&class| JsonClassConfig {
                    class,
                    percent: config.workload.class(class).percent,
                    size: config.workload.class(class).size,
                })
                .collect(),
        },
        results: JsonResults {
            elapsed_secs: report.elapsed.as_secs_f64(),
            total_ops: stats.total_ops(),
            total_bytes: stats.total_bytes(),
            flush_secs: stats.flush_latency().map(|d| d.as_secs_f64()),
            generated: report.producer.generated,
            enqueued: report.producer.enqueued,
            unprocessed: report.unprocessed,
            classes: stats
                .iter()
                .map(|(class, class_stats)| JsonClassResult::new(class, class_stats, report.elapsed))
                .collect(),
        },
    }
}

/// Write the JSON report to `path` (pretty-printed)
pub fn write_json(path: &Path, report: &RunReport, config: &Config) -> Result<()> {
    let document = build_report(report, config);

    let file = File::create(path)
        .with_context(|| format!("Failed to create JSON output: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &document)
        .with_context(|| format!("Failed to write JSON output: {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write JSON output: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkloadConfig;
    use crate::stats::RunStats;
    use crate::worker::ProducerSummary;
    use std::time::Duration;
    use tempfile::TempDir;

    fn report() -> RunReport {
        let mut stats = RunStats::new().unwrap();
        stats.record(TaskClass::RandomRead, 512, Duration::from_micros(100));
        stats.record(TaskClass::RandomRead, 512, Duration::from_micros(300));
        stats.record(TaskClass::SequentialWrite, 4096, Duration::from_micros(50));
        stats.attribute_flush(Duration::from_micros(50));

        RunReport {
            stats,
            elapsed: Duration::from_secs(2),
            producer: ProducerSummary {
                generated: 4,
                enqueued: 4,
                rejected: 0,
            },
            unprocessed: 1,
            extent: 1 << 20,
            stats_path: None,
        }
    }

    #[test]
    fn test_write_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.json");
        let config = Config::new(
            WorkloadConfig::new([50, 0, 0, 50], [512, 0, 0, 4096], 2, 0.01),
            "/dev/sdb",
        );

        write_json(&path, &report(), &config).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        println!("{}", serde_json::to_string_pretty(&value).unwrap());

        assert_eq!(value["tool"]["name"], "poissonio");
        assert_eq!(value["config"]["target"], "/dev/sdb");
        assert_eq!(value["config"]["classes"][3]["class"], "sequential-write");
        assert_eq!(value["results"]["total_ops"], 3);
        assert_eq!(value["results"]["unprocessed"], 1);

        let rr = &value["results"]["classes"][0];
        assert_eq!(rr["class"], "random-read");
        assert_eq!(rr["ops"], 2);
        assert_eq!(rr["latency"]["samples"], 2);
        assert!((rr["iops"].as_f64().unwrap() - 1.0).abs() < 1e-9);

        let sw = &value["results"]["classes"][3];
        assert!((sw["total_latency_secs"].as_f64().unwrap() - 0.0001).abs() < 1e-9);
        assert!(value["config"].get("seed").is_none());
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        let config = Config::new(
            WorkloadConfig::new([100, 0, 0, 0], [512, 0, 0, 0], 2, 0.01),
            "disk.img",
        );
        let document = build_report(&report(), &config);
        assert!(chrono::DateTime::parse_from_rfc3339(&document.tool.timestamp).is_ok());
    }
}
