//! Bounded FIFO queue between the producer and the consumer
//!
//! [`BoundedQueue`] wraps a [`RingBuffer`](ring::RingBuffer) and adds one of
//! three synchronization disciplines, selected at construction:
//!
//! - [`QueueMode::SingleThreaded`]: the caller guarantees exclusive access and
//!   uses [`BoundedQueue::put_mut`] / [`BoundedQueue::get_mut`], which take
//!   `&mut self` and never touch the lock.
//! - [`QueueMode::Locking`]: a mutex guards the ring; `put` fails with
//!   [`PutError::Full`] and `get` returns `None` instead of waiting.
//! - [`QueueMode::Blocking`]: `put` waits while full and `get` waits while
//!   empty. Waiters re-check the condition in a loop after every wakeup.
//!
//! The queue is the backpressure mechanism of the benchmark: once it fills, a
//! slow consumer throttles the producer and memory use stays bounded no matter
//! how long the run lasts.
//!
//! # Signalling
//!
//! A `put` that moves the ring from empty to non-empty wakes getters, and a
//! `get` that moves it from full to non-full wakes putters. Nothing is signalled
//! on other transitions; every waiter re-checks its predicate, so signal-on-change
//! is enough.
//!
//! # Closing
//!
//! [`BoundedQueue::close`] wakes every waiter. After closing, `put` hands the
//! item back as [`PutError::Closed`] and `get` drains what is left, then returns
//! `None`. This is how the producer's cancellation interrupts a blocked `put`.
//!
//! # Example
//!
//! ```
//! use poissonio::queue::{BoundedQueue, QueueMode};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let queue = Arc::new(BoundedQueue::new(4, QueueMode::Blocking).unwrap());
//!
//! let producer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || {
//!         for i in 0..100 {
//!             queue.put(i).unwrap();
//!         }
//!     })
//! };
//!
//! for expected in 0..100 {
//!     assert_eq!(queue.get(), Some(expected));
//! }
//! producer.join().unwrap();
//! ```

pub mod ring;

use ring::RingBuffer;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Queue construction failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// A ring needs at least two slots to hold one item
    #[error("queue capacity must be at least 2, got {capacity}")]
    InvalidCapacity { capacity: usize },

    /// Slot storage could not be reserved
    #[error("could not allocate {capacity} queue slots")]
    Allocation { capacity: usize },
}

/// Rejected `put`, returning ownership of the item
#[derive(PartialEq, Eq)]
pub enum PutError<T> {
    /// Ring is full and the mode does not block
    Full(T),
    /// Queue was closed
    Closed(T),
}

impl<T> PutError<T> {
    /// Recover the rejected item
    pub fn into_inner(self) -> T {
        match self {
            PutError::Full(item) | PutError::Closed(item) => item,
        }
    }
}

impl<T> fmt::Debug for PutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PutError::Full(_) => f.write_str("Full(..)"),
            PutError::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

impl<T> fmt::Display for PutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PutError::Full(_) => f.write_str("queue is full"),
            PutError::Closed(_) => f.write_str("queue is closed"),
        }
    }
}

impl<T> std::error::Error for PutError<T> {}

/// Synchronization discipline of a [`BoundedQueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueMode {
    /// No synchronization; exclusive `&mut` access only
    SingleThreaded,
    /// Mutex-guarded, never waits
    Locking,
    /// Mutex-guarded, waits while empty (get) or full (put)
    Blocking,
}

#[derive(Debug)]
struct Inner<T> {
    ring: RingBuffer<T>,
    closed: bool,
}

/// Fixed-capacity FIFO queue of owned items
///
/// Share between threads with `Arc<BoundedQueue<T>>`. A queue of capacity N
/// holds at most N-1 items.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    mode: QueueMode,
    inner: Mutex<Inner<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Create a queue with `capacity` slots
    ///
    /// # Errors
    ///
    /// Fails when `capacity < 2` or the slots cannot be allocated.
    pub fn new(capacity: usize, mode: QueueMode) -> Result<Self, QueueError> {
        Ok(Self {
            mode,
            inner: Mutex::new(Inner {
                ring: RingBuffer::new(capacity)?,
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        })
    }

    /// Lock the ring, recovering from poisoning
    ///
    /// The ring's indices are only changed after the slot write succeeds, so a
    /// panic elsewhere cannot leave it half-updated.
    #[inline]
    fn lock_or_recover(&self) -> MutexGuard<'_, Inner<T>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poison) => poison.into_inner(),
        }
    }

    #[inline]
    pub fn mode(&self) -> QueueMode {
        self.mode
    }

    /// Total slots, one more than the number of items the queue can hold
    pub fn capacity(&self) -> usize {
        self.lock_or_recover().ring.capacity()
    }

    /// Snapshot of the number of queued items
    pub fn len(&self) -> usize {
        self.lock_or_recover().ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_or_recover().ring.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.lock_or_recover().closed
    }

    /// Enqueue an item
    ///
    /// In [`QueueMode::Blocking`] this waits while the queue is full. In the
    /// other modes a full queue is reported immediately as [`PutError::Full`].
    /// A closed queue always rejects with [`PutError::Closed`].
    pub fn put(&self, item: T) -> Result<(), PutError<T>> {
        let mut inner = self.lock_or_recover();

        if self.mode == QueueMode::Blocking {
            while inner.ring.is_full() && !inner.closed {
                inner = match self.not_full.wait(inner) {
                    Ok(guard) => guard,
                    Err(poison) => poison.into_inner(),
                };
            }
        }

        if inner.closed {
            return Err(PutError::Closed(item));
        }

        let was_empty = inner.ring.is_empty();
        inner.ring.push(item).map_err(PutError::Full)?;
        drop(inner);

        if was_empty {
            self.not_empty.notify_all();
        }
        Ok(())
    }

    /// Dequeue the oldest item
    ///
    /// In [`QueueMode::Blocking`] this waits while the queue is empty and
    /// returns `None` only once the queue is closed and drained. In the other
    /// modes an empty queue returns `None` immediately.
    pub fn get(&self) -> Option<T> {
        let mut inner = self.lock_or_recover();

        if self.mode == QueueMode::Blocking {
            while inner.ring.is_empty() && !inner.closed {
                inner = match self.not_empty.wait(inner) {
                    Ok(guard) => guard,
                    Err(poison) => poison.into_inner(),
                };
            }
        }

        self.take_locked(inner)
    }

    /// Dequeue the oldest item, waiting at most `timeout`
    ///
    /// Returns `None` if nothing arrived in time. Non-blocking modes ignore the
    /// timeout.
    pub fn get_timeout(&self, timeout: Duration) -> Option<T> {
        let mut inner = self.lock_or_recover();

        if self.mode == QueueMode::Blocking {
            let deadline = Instant::now() + timeout;
            while inner.ring.is_empty() && !inner.closed {
                let now = Instant::now();
                if now >= deadline {
                    return None;
                }
                inner = match self.not_empty.wait_timeout(inner, deadline - now) {
                    Ok((guard, _)) => guard,
                    Err(poison) => poison.into_inner().0,
                };
            }
        }

        self.take_locked(inner)
    }

    fn take_locked(&self, mut inner: MutexGuard<'_, Inner<T>>) -> Option<T> {
        let was_full = inner.ring.is_full();
        let item = inner.ring.pop()?;
        drop(inner);

        if was_full {
            self.not_full.notify_all();
        }
        Some(item)
    }

    /// Close the queue and wake every waiter
    ///
    /// Idempotent. Items already queued stay available to `get`.
    pub fn close(&self) {
        self.lock_or_recover().closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Remove and return everything still queued
    pub fn drain(&self) -> Vec<T> {
        let mut inner = self.lock_or_recover();
        let mut items = Vec::with_capacity(inner.ring.len());
        while let Some(item) = inner.ring.pop() {
            items.push(item);
        }
        drop(inner);

        self.not_full.notify_all();
        items
    }

    /// Enqueue through exclusive access, without locking
    ///
    /// Intended for [`QueueMode::SingleThreaded`]; never waits.
    pub fn put_mut(&mut self, item: T) -> Result<(), PutError<T>> {
        let inner = match self.inner.get_mut() {
            Ok(inner) => inner,
            Err(poison) => poison.into_inner(),
        };
        if inner.closed {
            return Err(PutError::Closed(item));
        }
        inner.ring.push(item).map_err(PutError::Full)
    }

    /// Dequeue through exclusive access, without locking
    pub fn get_mut(&mut self) -> Option<T> {
        let inner = match self.inner.get_mut() {
            Ok(inner) => inner,
            Err(poison) => poison.into_inner(),
        };
        inner.ring.pop()
    }
}
