//! Shutdown state and cancellation primitives
//!
//! [`ShutdownCell`] is the only state shared between the timer and the
//! consumer. Each transition has exactly one writer:
//!
//! ```text
//!   Idle --consumer--> Running --timer--> StopRequested --consumer--> Stopped
//! ```
//!
//! The cell is a single `AtomicU8`, so no lock is needed and every transition
//! is observed whole. The consumer may also jump straight to `Stopped` when it
//! fails; the timer then skips to producer cancellation.
//!
//! [`CancelToken`] is the cooperative replacement for killing a thread. It is
//! checked at the top of the producer loop and wakes any sleep taken through
//! [`CancelToken::sleep`].

use crossbeam::utils::Backoff;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Lifecycle of a run as seen by the timer and the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ShutdownState {
    /// Threads created, consumer loop not entered yet
    Idle = 0,
    /// Consumer is executing work items
    Running = 1,
    /// Timer asked the consumer to stop
    StopRequested = 2,
    /// Consumer has persisted its statistics and left the loop
    Stopped = 3,
}

impl ShutdownState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::StopRequested,
            _ => Self::Stopped,
        }
    }
}

/// Atomic holder of a [`ShutdownState`]
#[derive(Debug)]
pub struct ShutdownCell {
    state: AtomicU8,
}

impl ShutdownCell {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(ShutdownState::Idle as u8),
        }
    }

    #[inline]
    pub fn load(&self) -> ShutdownState {
        ShutdownState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Consumer: mark the loop as entered
    ///
    /// Returns false if a stop was already requested, in which case the state
    /// is left untouched.
    pub fn enter_running(&self) -> bool {
        self.state
            .compare_exchange(
                ShutdownState::Idle as u8,
                ShutdownState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Timer: ask the consumer to stop
    ///
    /// Never moves the state backwards out of `Stopped`. Returns the state
    /// observed before the request.
    pub fn request_stop(&self) -> ShutdownState {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current >= ShutdownState::StopRequested as u8 {
                return ShutdownState::from_u8(current);
            }
            match self.state.compare_exchange_weak(
                current,
                ShutdownState::StopRequested as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(previous) => return ShutdownState::from_u8(previous),
                Err(actual) => current = actual,
            }
        }
    }

    /// True once the timer has requested a stop (or the consumer already stopped)
    #[inline]
    pub fn is_stop_requested(&self) -> bool {
        self.state.load(Ordering::Acquire) >= ShutdownState::StopRequested as u8
    }

    /// Consumer: publish that it has finished
    #[inline]
    pub fn confirm_stopped(&self) {
        self.state.store(ShutdownState::Stopped as u8, Ordering::Release);
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.load() == ShutdownState::Stopped
    }

    /// Timer: spin, then back off, until the consumer confirms
    pub fn wait_stopped(&self) {
        let backoff = Backoff::new();
        while !self.is_stopped() {
            if backoff.is_completed() {
                thread::park_timeout(Duration::from_millis(1));
            } else {
                backoff.snooze();
            }
        }
    }
}

impl Default for ShutdownCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable cooperative cancellation flag with an interruptible sleep
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag and wake every sleeper
    pub fn cancel(&self) {
        let (flag, cvar) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for `duration` unless cancelled first
    ///
    /// Returns true if the sleep ended because of cancellation.
    pub fn sleep(&self, duration: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let mut cancelled = flag.lock().unwrap_or_else(PoisonError::into_inner);

        let deadline = Instant::now().checked_add(duration);
        while !*cancelled {
            let remaining = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    deadline - now
                }
                // Effectively forever; wake periodically to re-check
                None => Duration::from_secs(3600),
            };
            cancelled = match cvar.wait_timeout(cancelled, remaining) {
                Ok((guard, _)) => guard,
                Err(poison) => poison.into_inner().0,
            };
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_transitions() {
        let cell = ShutdownCell::new();
        assert_eq!(cell.load(), ShutdownState::Idle);
        assert!(!cell.is_stop_requested());

        assert!(cell.enter_running());
        assert!(!cell.enter_running());
        assert_eq!(cell.load(), ShutdownState::Running);

        assert_eq!(cell.request_stop(), ShutdownState::Running);
        assert!(cell.is_stop_requested());
        assert_eq!(cell.request_stop(), ShutdownState::StopRequested);

        cell.confirm_stopped();
        assert!(cell.is_stopped());
        // A late request never reopens a stopped run
        assert_eq!(cell.request_stop(), ShutdownState::Stopped);
        assert!(cell.is_stopped());
    }

    #[test]
    fn test_stop_before_running() {
        let cell = ShutdownCell::new();
        assert_eq!(cell.request_stop(), ShutdownState::Idle);
        assert!(!cell.enter_running());
        assert_eq!(cell.load(), ShutdownState::StopRequested);
    }

    #[test]
    fn test_wait_stopped_returns_after_confirm() {
        let cell = Arc::new(ShutdownCell::new());
        let waiter = {
            let cell = Arc::clone(&cell);
            thread::spawn(move || {
                cell.wait_stopped();
                Instant::now()
            })
        };

        thread::sleep(Duration::from_millis(30));
        let confirmed_at = Instant::now();
        cell.confirm_stopped();

        let woke_at = waiter.join().unwrap();
        assert!(woke_at >= confirmed_at);
    }

    #[test]
    fn test_cancel_token_sleep_completes() {
        let token = CancelToken::new();
        let start = Instant::now();
        assert!(!token.sleep(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_cancel_token_interrupts_sleep() {
        let token = CancelToken::new();
        let sleeper = {
            let token = token.clone();
            thread::spawn(move || {
                let start = Instant::now();
                let cancelled = token.sleep(Duration::from_secs(60));
                (cancelled, start.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(20));
        token.cancel();

        let (cancelled, slept) = sleeper.join().unwrap();
        assert!(cancelled);
        assert!(slept < Duration::from_secs(10));
        assert!(token.is_cancelled());
        // Already cancelled: returns immediately
        assert!(token.sleep(Duration::MAX));
    }
}
