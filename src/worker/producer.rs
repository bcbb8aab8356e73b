//! Producer thread
//!
//! Turns the workload model into a Poisson arrival stream: sleep for an
//! exponentially distributed delay, generate one item, enqueue it, repeat.
//! A full queue blocks `put`, which throttles generation to the consumer's
//! pace.
//!
//! The producer holds nothing that needs flushing, so it has no graceful stop
//! of its own. It runs until [`ProducerHandle::cancel`] sets its token and
//! closes the queue, which interrupts both the inter-arrival sleep and a
//! blocked `put`.

use super::shutdown::CancelToken;
use crate::distribution::exponential::InterArrivalSampler;
use crate::queue::{BoundedQueue, PutError};
use crate::workload::{WorkItem, WorkloadModel};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Counts reported by the producer when it exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerSummary {
    /// Items produced by the workload model
    pub generated: u64,
    /// Items accepted by the queue
    pub enqueued: u64,
    /// Items refused because the queue was full (non-blocking modes only)
    pub rejected: u64,
}

/// Means of stopping a running producer
#[derive(Debug, Clone)]
pub struct ProducerHandle {
    cancel: CancelToken,
    queue: Arc<BoundedQueue<WorkItem>>,
}

impl ProducerHandle {
    /// Cancel the producer
    ///
    /// Wakes its sleep and closes the queue so a blocked `put` returns.
    pub fn cancel(&self) {
        self.cancel.cancel();
        self.queue.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Poisson-arrival generator of work items
#[derive(Debug)]
pub struct Producer {
    model: WorkloadModel,
    sampler: InterArrivalSampler,
    /// Arrivals per second
    rate: f64,
    queue: Arc<BoundedQueue<WorkItem>>,
    cancel: CancelToken,
}

impl Producer {
    /// Create a producer
    ///
    /// # Arguments
    ///
    /// * `model` - Workload model, moved into the producer thread
    /// * `sampler` - Source of inter-arrival delays
    /// * `rate` - Mean arrivals per second (reciprocal of the mean interval)
    /// * `queue` - Queue shared with the consumer
    pub fn new(
        model: WorkloadModel,
        sampler: InterArrivalSampler,
        rate: f64,
        queue: Arc<BoundedQueue<WorkItem>>,
    ) -> Self {
        Self {
            model,
            sampler,
            rate,
            queue,
            cancel: CancelToken::new(),
        }
    }

    /// Handle the timer uses to cancel this producer
    pub fn handle(&self) -> ProducerHandle {
        ProducerHandle {
            cancel: self.cancel.clone(),
            queue: Arc::clone(&self.queue),
        }
    }

    /// Run until cancelled
    pub fn run(mut self) -> ProducerSummary {
        let mut summary = ProducerSummary::default();
        debug!(rate = self.rate, "producer started");

        while !self.cancel.is_cancelled() {
            let delay = self.sampler.sample(self.rate);
            let delay = Duration::try_from_secs_f64(delay).unwrap_or(Duration::MAX);
            if self.cancel.sleep(delay) {
                break;
            }

            let item = self.model.generate();
            summary.generated += 1;
            trace!(
                sequence = item.sequence,
                offset = item.offset,
                length = item.length,
                class = %item.class,
                "generated"
            );

            match self.queue.put(item) {
                Ok(()) => summary.enqueued += 1,
                Err(PutError::Full(_)) => summary.rejected += 1,
                Err(PutError::Closed(_)) => break,
            }
        }

        debug!(
            generated = summary.generated,
            enqueued = summary.enqueued,
            rejected = summary.rejected,
            "producer cancelled"
        );
        summary
    }
}
