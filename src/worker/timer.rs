//! Timer thread
//!
//! Bounds the run and drives the ordered shutdown:
//!
//! 1. Sleep for the run duration (cut short if the consumer fails)
//! 2. Request a stop from the consumer
//! 3. Wait until the consumer confirms it has stopped
//! 4. Only then cancel the producer
//!
//! Cancelling the producer first could leave the consumer waiting on an empty
//! queue that nothing will ever fill again; step 3 rules that out.

use super::producer::ProducerHandle;
use super::shutdown::{CancelToken, ShutdownCell, ShutdownState};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// What the timer observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerReport {
    /// Time from start until the producer was cancelled
    pub elapsed: Duration,
    /// True when the consumer ended the run before the duration expired
    pub aborted: bool,
}

/// Run-duration timer and shutdown sequencer
#[derive(Debug)]
pub struct Timer {
    duration: Duration,
    shutdown: Arc<ShutdownCell>,
    abort: CancelToken,
    producer: ProducerHandle,
}

impl Timer {
    /// Create a timer
    ///
    /// # Arguments
    ///
    /// * `duration` - Length of the measurement phase
    /// * `shutdown` - State cell shared with the consumer
    /// * `abort` - Token the consumer cancels when it fails
    /// * `producer` - Handle used to cancel the producer last
    pub fn new(
        duration: Duration,
        shutdown: Arc<ShutdownCell>,
        abort: CancelToken,
        producer: ProducerHandle,
    ) -> Self {
        Self {
            duration,
            shutdown,
            abort,
            producer,
        }
    }

    pub fn run(self) -> TimerReport {
        let start = Instant::now();
        debug!(duration_secs = self.duration.as_secs_f64(), "timer started");

        let aborted = self.abort.sleep(self.duration);
        if aborted {
            info!("consumer ended the run early");
        }

        let previous = self.shutdown.request_stop();
        debug!(?previous, "stop requested");

        if previous != ShutdownState::Stopped {
            self.shutdown.wait_stopped();
        }
        debug!("consumer confirmed stop");

        self.producer.cancel();
        debug!("producer cancelled");

        TimerReport {
            elapsed: start.elapsed(),
            aborted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::exponential::InterArrivalSampler;
    use crate::queue::{BoundedQueue, QueueMode};
    use crate::worker::producer::Producer;
    use crate::workload::{WorkProfile, WorkloadModel};
    use std::thread;

    fn producer_handle() -> ProducerHandle {
        let queue = Arc::new(BoundedQueue::new(4, QueueMode::Blocking).unwrap());
        let profile = WorkProfile::from_percentages([100, 0, 0, 0], [512, 0, 0, 0]).unwrap();
        let model = WorkloadModel::with_seed(profile, 4096, 1, 0);
        Producer::new(model, InterArrivalSampler::with_seed(0), 1.0, queue).handle()
    }

    #[test]
    fn test_producer_cancelled_only_after_confirmation() {
        let shutdown = Arc::new(ShutdownCell::new());
        let producer = producer_handle();
        let timer = Timer::new(
            Duration::from_millis(20),
            Arc::clone(&shutdown),
            CancelToken::new(),
            producer.clone(),
        );
        assert!(shutdown.enter_running());

        let thread = thread::spawn(move || timer.run());

        while !shutdown.is_stop_requested() {
            thread::sleep(Duration::from_millis(1));
        }
        // Consumer has not confirmed yet: producer must still be live
        thread::sleep(Duration::from_millis(50));
        assert!(!producer.is_cancelled());

        shutdown.confirm_stopped();
        let report = thread.join().unwrap();
        assert!(producer.is_cancelled());
        assert!(!report.aborted);
        assert!(report.elapsed >= Duration::from_millis(70));
    }

    #[test]
    fn test_abort_cuts_sleep_short() {
        let shutdown = Arc::new(ShutdownCell::new());
        let abort = CancelToken::new();
        let producer = producer_handle();
        let timer = Timer::new(
            Duration::from_secs(3600),
            Arc::clone(&shutdown),
            abort.clone(),
            producer.clone(),
        );

        let thread = thread::spawn(move || timer.run());
        thread::sleep(Duration::from_millis(20));

        // What the consumer's guard does on failure
        shutdown.confirm_stopped();
        abort.cancel();

        let report = thread.join().unwrap();
        assert!(report.aborted);
        assert!(report.elapsed < Duration::from_secs(60));
        assert!(producer.is_cancelled());
        assert!(shutdown.is_stopped());
    }
}
