//! Coordinator module
//!
//! Builds everything a run needs on the main thread, starts the consumer,
//! producer and timer threads, and joins them. Construction failures (invalid
//! profile, empty extent, allocation) surface here before any thread exists.
//!
//! # Example
//!
//! ```no_run
//! use poissonio::config::{Config, WorkloadConfig};
//! use poissonio::coordinator::run_benchmark;
//!
//! let workload = WorkloadConfig::new([100, 0, 0, 0], [4096, 0, 0, 0], 10, 0.01);
//! let config = Config::new(workload, "/dev/sdb");
//! let report = run_benchmark(&config).unwrap();
//! println!("{} ops", report.stats.total_ops());
//! ```

use crate::config::Config;
use crate::distribution::exponential::InterArrivalSampler;
use crate::error::BenchError;
use crate::queue::{BoundedQueue, QueueMode};
use crate::stats::RunStats;
use crate::target::file::FileTarget;
use crate::target::Target;
use crate::worker::{
    CancelToken, Consumer, ConsumerConfig, Producer, ProducerHandle, ProducerSummary, ShutdownCell,
    Timer,
};
use crate::workload::{WorkItem, WorkloadModel};
use crate::Result;
use anyhow::{anyhow, Context};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{info, warn};

/// Smallest alignment used for IO buffers
const MIN_BUFFER_ALIGNMENT: u64 = 4096;

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Per-class statistics, as persisted
    pub stats: RunStats,
    /// Time from the timer start until the producer was cancelled
    pub elapsed: Duration,
    /// What the producer generated and enqueued
    pub producer: ProducerSummary,
    /// Items still queued when the run ended
    pub unprocessed: usize,
    /// Extent the workload addressed
    pub extent: u64,
    /// Where statistics were written
    pub stats_path: Option<PathBuf>,
}

/// Open the configured target and run
pub fn run_benchmark(config: &Config) -> Result<RunReport> {
    let target = FileTarget::open(&config.target.path, config.target.open_flags())?;
    run_with_target(config, Box::new(target))
}

/// Addressed extent: the configured limit, capped at the target size
///
/// # Errors
///
/// Returns [`BenchError::EmptyExtent`] when nothing can be addressed.
pub fn resolve_extent(config: &Config, target_size: u64) -> Result<u64> {
    let extent = config
        .target
        .extent
        .map_or(target_size, |limit| limit.min(target_size));
    if extent == 0 {
        return Err(BenchError::EmptyExtent(config.target.path.display().to_string()).into());
    }
    if let Some(limit) = config.target.extent {
        if limit > target_size {
            warn!(limit, target_size, "extent exceeds target size, using target size");
        }
    }
    Ok(extent)
}

/// Run against an already open target
///
/// The consumer takes ownership of `target` and closes it on a clean stop.
pub fn run_with_target(config: &Config, target: Box<dyn Target>) -> Result<RunReport> {
    let profile = config.profile().map_err(BenchError::InvalidProfile)?;
    let extent = resolve_extent(config, target.size())?;

    let alignment = config.target.effective_alignment();
    let block_size = target.logical_block_size();
    if config.target.direct && alignment % block_size != 0 {
        warn!(
            alignment,
            block_size, "random offsets are not aligned to the logical block size"
        );
    }

    let queue = Arc::new(
        BoundedQueue::<WorkItem>::new(config.runtime.queue_capacity, QueueMode::Blocking)
            .map_err(BenchError::from)?,
    );

    let buffer_size = usize::try_from(profile.max_io_size())
        .map_err(|_| BenchError::Allocation(format!("IO size {}", profile.max_io_size())))?;
    let buffer_alignment = usize::try_from(block_size.max(MIN_BUFFER_ALIGNMENT))
        .map_err(|_| BenchError::Allocation(format!("buffer alignment {}", block_size)))?;

    let (model, sampler) = match config.workload.seed {
        Some(seed) => (
            WorkloadModel::with_seed(profile, extent, alignment, seed),
            InterArrivalSampler::with_seed(seed.wrapping_add(1)),
        ),
        None => (
            WorkloadModel::new(profile, extent, alignment),
            InterArrivalSampler::new(),
        ),
    };

    let stats_path = Some(config.stats_path());

    let shutdown = Arc::new(ShutdownCell::new());
    let abort = CancelToken::new();

    let producer = Producer::new(model, sampler, config.workload.rate(), Arc::clone(&queue));
    let producer_handle = producer.handle();
    let timer = Timer::new(
        config.workload.duration(),
        Arc::clone(&shutdown),
        abort.clone(),
        producer.handle(),
    );
    let consumer = Consumer::new(
        target,
        Arc::clone(&queue),
        Arc::clone(&shutdown),
        abort,
        ConsumerConfig {
            poll_interval: config.runtime.poll_interval(),
            stats_path: stats_path.clone(),
            write_pattern: config.workload.write_pattern,
            buffer_alignment,
            buffer_size,
        },
    )?;

    info!(
        extent,
        alignment,
        rate = config.workload.rate(),
        duration_secs = config.workload.duration_secs,
        queue_capacity = config.runtime.queue_capacity,
        "starting run"
    );

    let consumer_thread = spawn("consumer", move || consumer.run())?;

    let producer_thread = match spawn("producer", move || producer.run()) {
        Ok(handle) => handle,
        Err(e) => {
            stop_early(&shutdown, &producer_handle);
            let _ = consumer_thread.join();
            return Err(e);
        }
    };

    let timer_thread = match spawn("timer", move || timer.run()) {
        Ok(handle) => handle,
        Err(e) => {
            stop_early(&shutdown, &producer_handle);
            let _ = consumer_thread.join();
            let _ = producer_thread.join();
            return Err(e);
        }
    };

    // Join everything before looking at the consumer's result
    let timer_report = join(timer_thread, "timer");
    let producer_summary = join(producer_thread, "producer");
    let consumer_result = join(consumer_thread, "consumer");

    let unprocessed = queue.drain().len();
    let timer_report = timer_report?;
    let producer_summary = producer_summary?;
    let stats = consumer_result?.context("Run aborted by consumer")?;

    info!(
        total_ops = stats.total_ops(),
        elapsed_secs = timer_report.elapsed.as_secs_f64(),
        unprocessed,
        "run finished"
    );

    Ok(RunReport {
        stats,
        elapsed: timer_report.elapsed,
        producer: producer_summary,
        unprocessed,
        extent,
        stats_path,
    })
}

fn spawn<T, F>(name: &str, f: F) -> Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(f)
        .with_context(|| format!("Failed to spawn {} thread", name))
}

fn join<T>(handle: JoinHandle<T>, name: &str) -> Result<T> {
    handle
        .join()
        .map_err(|_| anyhow!("{} thread panicked", name))
}

/// Unwind a partially started run in lifecycle order
fn stop_early(shutdown: &ShutdownCell, producer: &ProducerHandle) {
    shutdown.request_stop();
    shutdown.wait_stopped();
    producer.cancel();
}
