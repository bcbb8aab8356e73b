//! Consumer thread
//!
//! Pops work items, performs the positioned read or write, and times it. The
//! loop runs until the shutdown cell reports a stop request. Then, in order:
//!
//! 1. Flush the target if anything was written, and charge the flush to the
//!    write classes by bytes written
//! 2. Persist the per-class records to the statistics file
//! 3. Close the target
//! 4. Publish `Stopped`
//!
//! `Stopped` is published from a drop guard, so it is reached on every exit
//! path, including errors and panics. Only after that does the timer cancel
//! the producer.
//!
//! # Failures
//!
//! A read or write that moves fewer bytes than requested ends the run with
//! [`BenchError::IoSizeMismatch`]. No statistics file is written on an error
//! path, and the timer's sleep is cut short so the run ends immediately.

use super::shutdown::{CancelToken, ShutdownCell};
use crate::error::BenchError;
use crate::output::binary::{write_stats_file, StatsRecord};
use crate::queue::BoundedQueue;
use crate::stats::RunStats;
use crate::target::Target;
use crate::util::buffer::{AlignedBuffer, FillPattern};
use crate::util::time::Timestamp;
use crate::workload::WorkItem;
use crate::Result;
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Consumer settings taken from the run configuration
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Longest wait on an empty queue before re-checking for a stop request
    pub poll_interval: Duration,
    /// Where to persist statistics; None skips the file
    pub stats_path: Option<PathBuf>,
    /// Contents of every write
    pub write_pattern: FillPattern,
    /// Alignment of the IO buffer
    pub buffer_alignment: usize,
    /// Size of the IO buffer, at least the largest item length
    pub buffer_size: usize,
}

/// Publishes `Stopped` when the consumer exits, however it exits
struct StopGuard {
    shutdown: Arc<ShutdownCell>,
    abort: CancelToken,
    clean: bool,
}

impl Drop for StopGuard {
    fn drop(&mut self) {
        self.shutdown.confirm_stopped();
        if !self.clean {
            // Wake the timer so it does not sleep out the full duration
            self.abort.cancel();
        }
        debug!(clean = self.clean, "consumer stopped");
    }
}

/// Executor of queued work items
pub struct Consumer {
    target: Box<dyn Target>,
    queue: Arc<BoundedQueue<WorkItem>>,
    shutdown: Arc<ShutdownCell>,
    abort: CancelToken,
    /// Destination of reads
    read_buffer: AlignedBuffer,
    /// Pattern-filled source of writes, never overwritten
    write_buffer: AlignedBuffer,
    stats: RunStats,
    config: ConsumerConfig,
}

impl Consumer {
    /// Create a consumer and allocate its buffers and statistics
    ///
    /// Called on the main thread so allocation failures surface before any
    /// thread starts.
    ///
    /// # Arguments
    ///
    /// * `target` - Open target, owned and closed by the consumer
    /// * `queue` - Queue shared with the producer
    /// * `shutdown` - State cell shared with the timer
    /// * `abort` - Token cancelled if the consumer fails
    /// * `config` - Buffer, pattern and output settings
    pub fn new(
        target: Box<dyn Target>,
        queue: Arc<BoundedQueue<WorkItem>>,
        shutdown: Arc<ShutdownCell>,
        abort: CancelToken,
        config: ConsumerConfig,
    ) -> Result<Self> {
        let read_buffer = AlignedBuffer::new(config.buffer_size, config.buffer_alignment)?;
        let mut write_buffer = AlignedBuffer::new(config.buffer_size, config.buffer_alignment)?;
        write_buffer.fill(config.write_pattern);
        let stats = RunStats::new()?;

        Ok(Self {
            target,
            queue,
            shutdown,
            abort,
            read_buffer,
            write_buffer,
            stats,
            config,
        })
    }

    /// Run until the timer requests a stop
    ///
    /// Returns the final statistics, already persisted when a stats path was
    /// configured.
    pub fn run(mut self) -> Result<RunStats> {
        let mut guard = StopGuard {
            shutdown: Arc::clone(&self.shutdown),
            abort: self.abort.clone(),
            clean: false,
        };

        if !self.shutdown.enter_running() {
            debug!("stop requested before consumer started");
        }
        debug!(target = %self.target.path().display(), "consumer started");

        while !self.shutdown.is_stop_requested() {
            let Some(item) = self.queue.get_timeout(self.config.poll_interval) else {
                continue;
            };
            self.execute(&item)?;
        }

        let stats = self.finish()?;
        guard.clean = true;
        Ok(stats)
    }

    /// Perform one item's IO and record its latency
    fn execute(&mut self, item: &WorkItem) -> Result<()> {
        let length = usize::try_from(item.length).unwrap_or(usize::MAX);
        if length > self.config.buffer_size {
            return Err(BenchError::Allocation(format!(
                "item {} needs {} bytes, IO buffer holds {}",
                item.sequence, item.length, self.config.buffer_size
            ))
            .into());
        }

        let start = Timestamp::now();
        let result = if item.class.is_read() {
            let buf = &mut self.read_buffer.as_mut_slice()[..length];
            self.target.read_at(buf, item.offset)
        } else {
            let buf = &self.write_buffer.as_slice()[..length];
            self.target.write_at(buf, item.offset)
        };
        let latency = start.elapsed();

        let transferred = result.with_context(|| {
            format!(
                "{} failed: sequence={}, offset={}, length={}",
                item.class, item.sequence, item.offset, item.length
            )
        })? as u64;

        if transferred != item.length {
            return Err(BenchError::IoSizeMismatch {
                class: item.class,
                offset: item.offset,
                expected: item.length,
                actual: transferred,
            }
            .into());
        }

        self.stats.record(item.class, transferred, latency);
        trace!(
            sequence = item.sequence,
            offset = item.offset,
            length = item.length,
            class = %item.class,
            latency_secs = latency.as_secs_f64(),
            "completed"
        );
        Ok(())
    }

    /// Flush, persist and close after the loop
    fn finish(&mut self) -> Result<RunStats> {
        if self.stats.write_bytes() > 0 {
            let start = Timestamp::now();
            self.target.sync().context("Failed to flush target")?;
            let flush = start.elapsed();
            self.stats.attribute_flush(flush);
            debug!(flush_secs = flush.as_secs_f64(), "flushed writes");
        }

        if let Some(path) = &self.config.stats_path {
            let records = StatsRecord::from_run(&self.stats);
            write_stats_file(path, &records)?;
            debug!(path = %path.display(), "statistics persisted");
        } else {
            warn!("no statistics file configured; results are not persisted");
        }

        self.target.close().context("Failed to close target")?;

        Ok(self.stats.clone())
    }
}
