//! Aligned IO buffer
//!
//! The consumer owns one buffer sized for the largest enabled IO. Reads land in
//! it and writes are issued from it. The allocation is aligned so the same
//! buffer works with O_DIRECT, where the kernel rejects unaligned user memory.

use crate::error::BenchError;
use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::fmt;
use std::str::FromStr;

/// Contents written by the write classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillPattern {
    /// All zeros
    Zeros,
    /// ASCII '1' (0x31) in every byte
    Ones,
    /// Pseudo-random bytes from a fixed seed
    Random,
    /// Sequential bytes (0x00, 0x01, 0x02, ..., 0xFF, 0x00, ...)
    Sequential,
}

impl Default for FillPattern {
    fn default() -> Self {
        Self::Ones
    }
}

impl FromStr for FillPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zeros" | "zero" => Ok(Self::Zeros),
            "ones" | "one" => Ok(Self::Ones),
            "random" => Ok(Self::Random),
            "sequential" | "seq" => Ok(Self::Sequential),
            other => Err(format!(
                "Unknown write pattern '{}' (expected zeros, ones, random or sequential)",
                other
            )),
        }
    }
}

impl fmt::Display for FillPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Zeros => "zeros",
            Self::Ones => "ones",
            Self::Random => "random",
            Self::Sequential => "sequential",
        };
        f.write_str(name)
    }
}

/// Memory-aligned buffer suitable for O_DIRECT operations
pub struct AlignedBuffer {
    ptr: *mut u8,
    size: usize,
    layout: Layout,
}

// AlignedBuffer is Send because it owns its memory
unsafe impl Send for AlignedBuffer {}

impl AlignedBuffer {
    /// Allocate a zeroed buffer
    ///
    /// # Arguments
    /// * `size` - Size of the buffer in bytes, at least 1
    /// * `alignment` - Power-of-two alignment (typically 512 or 4096)
    ///
    /// # Errors
    /// Returns [`BenchError::Allocation`] for a zero size, a bad alignment or an
    /// allocator failure.
    pub fn new(size: usize, alignment: usize) -> Result<Self, BenchError> {
        if size == 0 {
            return Err(BenchError::Allocation("IO buffer size must be greater than 0".into()));
        }
        let layout = Layout::from_size_align(size, alignment.max(1)).map_err(|e| {
            BenchError::Allocation(format!("IO buffer of {} bytes aligned to {}: {}", size, alignment, e))
        })?;

        let ptr = unsafe { alloc_zeroed(layout) };
        if ptr.is_null() {
            return Err(BenchError::Allocation(format!(
                "IO buffer of {} bytes aligned to {}",
                size, alignment
            )));
        }

        Ok(Self { ptr, size, layout })
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.size) }
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.size) }
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline(always)]
    pub fn alignment(&self) -> usize {
        self.layout.align()
    }

    #[inline(always)]
    pub fn is_aligned(&self) -> bool {
        (self.ptr as usize) % self.layout.align() == 0
    }

    /// Fill the buffer with a pattern
    pub fn fill(&mut self, pattern: FillPattern) {
        let slice = self.as_mut_slice();
        match pattern {
            FillPattern::Zeros => slice.fill(0),
            FillPattern::Ones => slice.fill(b'1'),
            FillPattern::Random => Xoshiro256PlusPlus::seed_from_u64(0x5EED).fill_bytes(slice),
            FillPattern::Sequential => {
                for (i, byte) in slice.iter_mut().enumerate() {
                    *byte = (i % 256) as u8;
                }
            }
        }
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        unsafe {
            dealloc(self.ptr, self.layout);
        }
    }
}

impl fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("size", &self.size)
            .field("alignment", &self.layout.align())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_buffer_alignment() {
        for alignment in [1usize, 512, 4096] {
            let buf = AlignedBuffer::new(8192, alignment).unwrap();
            assert!(buf.is_aligned());
            assert_eq!(buf.alignment(), alignment);
            assert_eq!(buf.size(), 8192);
            assert!(buf.as_slice().iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_aligned_buffer_rejects_bad_layout() {
        assert!(matches!(AlignedBuffer::new(0, 512), Err(BenchError::Allocation(_))));
        assert!(matches!(AlignedBuffer::new(4096, 3), Err(BenchError::Allocation(_))));
    }

    #[test]
    fn test_fill_patterns() {
        let mut buf = AlignedBuffer::new(1024, 512).unwrap();

        buf.fill(FillPattern::Ones);
        assert!(buf.as_slice().iter().all(|&b| b == 49));

        buf.fill(FillPattern::Sequential);
        assert_eq!(buf.as_slice()[255], 255);
        assert_eq!(buf.as_slice()[256], 0);

        buf.fill(FillPattern::Random);
        let first = buf.as_slice().to_vec();
        assert!(first.iter().any(|&b| b != first[0]));
        buf.fill(FillPattern::Random);
        assert_eq!(buf.as_slice(), first.as_slice());

        buf.fill(FillPattern::Zeros);
        assert!(buf.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_fill_pattern_parse() {
        assert_eq!("ones".parse::<FillPattern>().unwrap(), FillPattern::Ones);
        assert_eq!("ZEROS".parse::<FillPattern>().unwrap(), FillPattern::Zeros);
        assert_eq!("seq".parse::<FillPattern>().unwrap(), FillPattern::Sequential);
        assert!("stripes".parse::<FillPattern>().is_err());
        assert_eq!(FillPattern::default().to_string(), "ones");
    }
}
