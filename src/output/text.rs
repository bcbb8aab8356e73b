//! Human-readable text output

use super::binary::StatsRecord;
use crate::config::Config;
use crate::coordinator::RunReport;
use crate::stats::ClassStats;
use crate::util::time::{
    calculate_iops, calculate_throughput, format_bytes, format_duration, format_micros,
    format_throughput,
};
use crate::workload::TaskClass;
use std::path::Path;

const RULE: &str = "═══════════════════════════════════════════════════════════";

/// Print the run configuration
///
/// `extent` is shown when the target has already been opened.
pub fn print_configuration(config: &Config, extent: Option<u64>) {
    let workload = &config.workload;

    println!("Configuration:");
    println!("  Workload:");
    for class in TaskClass::ALL {
        let class_config = workload.class(class);
        if class_config.percent > 0 {
            println!(
                "    {:<17} {:>3}%  {}",
                class.as_str(),
                class_config.percent,
                format_bytes(class_config.size)
            );
        }
    }
    println!("    Duration: {}s", workload.duration_secs);
    println!(
        "    Mean interval: {}s ({:.1} arrivals/s)",
        workload.interval_secs,
        workload.rate()
    );
    if let Some(seed) = workload.seed {
        println!("    Seed: {}", seed);
    }
    println!("    Write pattern: {}", workload.write_pattern);

    println!("  Target:");
    println!("    Path: {}", config.target.path.display());
    println!(
        "    Flags: {}{}",
        if config.target.sync { "O_SYNC " } else { "" },
        if config.target.direct { "O_DIRECT" } else { "" }
    );
    match extent {
        Some(extent) => println!("    Extent: {}", format_bytes(extent)),
        None => {
            if let Some(limit) = config.target.extent {
                println!("    Extent limit: {}", format_bytes(limit));
            }
        }
    }
    println!("    Alignment: {}", config.target.effective_alignment());

    println!("  Output:");
    println!("    Statistics: {}", config.stats_path().display());
    if let Some(ref json) = config.output.json_output {
        println!("    JSON: {}", json.display());
    }
    println!("  Queue capacity: {}", config.runtime.queue_capacity);
}

/// Print test results to console
///
/// Displays per-class operations, IOPS, throughput and latency percentiles,
/// followed by the flush cost and producer counters.
pub fn print_results(report: &RunReport) {
    let duration = report.elapsed;
    let stats = &report.stats;

    println!("{}", RULE);
    println!("                    TEST RESULTS");
    println!("{}", RULE);
    println!();

    println!("Elapsed Time: {:.3}s", duration.as_secs_f64());
    println!();

    println!("Operations:");
    for (class, class_stats) in stats.iter() {
        print_class_line(class.as_str(), class_stats.ops(), class_stats.bytes(), duration);
    }
    print_class_line("total", stats.total_ops(), stats.total_bytes(), duration);
    println!();

    println!("Latency:");
    println!(
        "  {:<17} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "class", "avg", "min", "p50", "p99", "p99.9", "max"
    );
    for (class, class_stats) in stats.iter() {
        if class_stats.ops() == 0 {
            continue;
        }
        print_latency_line(class, class_stats);
    }
    if stats.total_ops() == 0 {
        println!("  No latency data collected");
    }
    println!();

    if let Some(flush) = stats.flush_latency() {
        println!("Flush:");
        println!("  Final flush: {}", format_duration(flush));
        for (class, class_stats) in stats.iter() {
            if !class_stats.flush_share().is_zero() {
                println!("  {:<17} +{}", class.as_str(), format_duration(class_stats.flush_share()));
            }
        }
        println!();
    }

    println!("Arrivals:");
    println!("  Generated:   {}", format_number(report.producer.generated));
    println!("  Enqueued:    {}", format_number(report.producer.enqueued));
    if report.producer.rejected > 0 {
        println!("  Rejected:    {}", format_number(report.producer.rejected));
    }
    println!("  Unprocessed: {}", format_number(report.unprocessed as u64));
    println!();

    if let Some(ref path) = report.stats_path {
        println!("Statistics written to {}", path.display());
    }
    println!("{}", RULE);
}

fn print_class_line(label: &str, ops: u64, bytes: u64, duration: std::time::Duration) {
    println!(
        "  {:<17} {:>12} ops ({}) - {:.1} IOPS, {}",
        label,
        format_number(ops),
        format_bytes(bytes),
        calculate_iops(ops, duration),
        format_throughput(calculate_throughput(bytes, duration))
    );
}

fn print_latency_line(class: TaskClass, stats: &ClassStats) {
    let summary = stats.latency_summary();
    println!(
        "  {:<17} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        class.as_str(),
        format_duration(stats.average()),
        format_micros(summary.min_us),
        format_micros(summary.p50_us),
        format_micros(summary.p99_us),
        format_micros(summary.p999_us),
        format_micros(summary.max_us)
    );
}

/// Print the records of a statistics file
pub fn print_stats_file(path: &Path, records: &[StatsRecord; 4]) {
    println!("Statistics file: {}", path.display());
    println!(
        "  {:<17} {:>12} {:>14} {:>14}",
        "class", "ops", "avg latency", "total latency"
    );
    for (class, record) in TaskClass::ALL.iter().zip(records) {
        println!(
            "  {:<17} {:>12} {:>14} {:>14}",
            class.as_str(),
            format_number(record.total_ops),
            format!("{:.6}s", record.avg_latency_secs),
            format!("{:.6}s", record.total_latency_secs)
        );
    }
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();

    for (count, c) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result.chars().rev().collect()
}
