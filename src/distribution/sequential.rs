//! Sequential offset cursor
//!
//! Each sequential class walks the extent in steps of its IO size, starting at
//! byte 0. When the next position would reach or pass the end of the extent the
//! cursor wraps back to 0, so offsets are contiguous and never overlap until a
//! full pass completes.
//!
//! # Example
//!
//! ```
//! use poissonio::distribution::sequential::SequentialCursor;
//!
//! let mut cursor = SequentialCursor::new();
//! let offsets: Vec<u64> = (0..4).map(|_| cursor.advance(400, 1000)).collect();
//! assert_eq!(offsets, vec![0, 400, 800, 0]);
//! ```

/// Running byte offset of one sequential class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequentialCursor {
    position: u64,
}

impl SequentialCursor {
    /// Create a cursor at offset 0
    pub fn new() -> Self {
        Self { position: 0 }
    }

    /// Offset the next call to [`advance`](Self::advance) will return
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Return the current offset and move forward by `stride`
    ///
    /// # Arguments
    ///
    /// * `stride` - IO size of the class in bytes
    /// * `extent` - Addressable size of the target in bytes
    ///
    /// # Returns
    ///
    /// The offset to use for this IO. The cursor is reset to 0 when advancing
    /// would meet or exceed `extent`.
    pub fn advance(&mut self, stride: u64, extent: u64) -> u64 {
        if extent == 0 {
            return 0;
        }
        // A shrunken extent can leave the cursor stranded past the end
        if self.position >= extent {
            self.position = 0;
        }

        let offset = self.position;
        self.position = match offset.checked_add(stride) {
            Some(next) if next < extent => next,
            _ => 0,
        };
        offset
    }
}
