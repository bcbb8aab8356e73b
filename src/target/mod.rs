//! Target abstraction
//!
//! A target is the single file or block device a run addresses. The consumer
//! only needs positioned reads and writes (no shared file position), a way to
//! flush pending writes, the addressable size and an explicit close.
//!
//! # Target Types
//!
//! - **File** ([`file::FileTarget`]): regular files and block devices, opened
//!   read-write with optional O_SYNC / O_DIRECT
//! - **Memory** ([`memory::MemoryTarget`]): a byte vector, used for tests and
//!   for exercising the lifecycle without touching a device
//!
//! # Example
//!
//! ```
//! use poissonio::target::Target;
//! use poissonio::target::memory::MemoryTarget;
//!
//! let mut target = MemoryTarget::new(4096);
//! assert_eq!(target.write_at(&[1u8; 512], 1024).unwrap(), 512);
//!
//! let mut buf = [0u8; 512];
//! assert_eq!(target.read_at(&mut buf, 1024).unwrap(), 512);
//! assert_eq!(buf, [1u8; 512]);
//! ```

use crate::Result;
use std::io;
use std::path::Path;

/// Positioned IO against one target
///
/// # Short transfers
///
/// `read_at` and `write_at` issue a single call and report how many bytes
/// moved. They never retry to fill the buffer, so callers can detect a device
/// that could not service the full request.
///
/// # Thread Safety
///
/// Targets must be `Send` so the consumer thread can own one.
pub trait Target: Send {
    /// Read into `buf` starting at byte `offset`
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Write `buf` starting at byte `offset`
    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize>;

    /// Make previously written data durable
    fn sync(&mut self) -> Result<()>;

    /// Addressable size in bytes
    fn size(&self) -> u64;

    /// Release the underlying handle
    ///
    /// Calling `close` twice is a no-op. IO after `close` fails.
    fn close(&mut self) -> Result<()>;

    /// Location of the target, used to name the statistics file
    fn path(&self) -> &Path;

    /// Minimum alignment for direct IO
    ///
    /// Default implementation returns 512.
    fn logical_block_size(&self) -> u64 {
        512
    }
}

/// How a file target is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFlags {
    /// Use direct IO (O_DIRECT) - bypass page cache
    pub direct: bool,

    /// Use synchronous IO (O_SYNC) - each write reaches the device before returning
    pub sync: bool,
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self {
            direct: false,
            sync: true,
        }
    }
}

pub mod file;
pub mod memory;
