//! Fixed-capacity ring buffer
//!
//! The unsynchronized core of [`BoundedQueue`](super::BoundedQueue). A ring of
//! capacity N holds at most N-1 items: one slot is always left vacant so that
//! "empty" (`head == tail`) and "full" (`(tail + 1) % N == head`) can be told
//! apart without a separate counter.
//!
//! # Example
//!
//! ```
//! use poissonio::queue::ring::RingBuffer;
//!
//! let mut ring = RingBuffer::new(3).unwrap();
//! assert!(ring.push(1).is_ok());
//! assert!(ring.push(2).is_ok());
//! assert_eq!(ring.push(3), Err(3)); // full at N-1 items
//!
//! assert_eq!(ring.pop(), Some(1));
//! assert_eq!(ring.pop(), Some(2));
//! assert_eq!(ring.pop(), None);
//! ```

use super::QueueError;

/// Circular array of owned item slots
#[derive(Debug)]
pub struct RingBuffer<T> {
    slots: Box<[Option<T>]>,
    /// Next slot to dequeue
    head: usize,
    /// Next slot to enqueue
    tail: usize,
}

impl<T> RingBuffer<T> {
    /// Allocate a ring with `capacity` slots
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidCapacity`] when `capacity < 2` (no usable
    /// slot) and [`QueueError::Allocation`] when slot storage cannot be reserved.
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity < 2 {
            return Err(QueueError::InvalidCapacity { capacity });
        }

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| QueueError::Allocation { capacity })?;
        slots.resize_with(capacity, || None);

        Ok(Self {
            slots: slots.into_boxed_slice(),
            head: 0,
            tail: 0,
        })
    }

    /// Number of slots, including the vacant one
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        (self.tail + 1) % self.slots.len() == self.head
    }

    /// Number of items currently held
    #[inline]
    pub fn len(&self) -> usize {
        let cap = self.slots.len();
        (self.tail + cap - self.head) % cap
    }

    /// Append an item at the tail
    ///
    /// Hands the item back when the ring is full.
    pub fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        self.slots[self.tail] = Some(item);
        self.tail = (self.tail + 1) % self.slots.len();
        Ok(())
    }

    /// Remove the oldest item
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        item
    }
}
