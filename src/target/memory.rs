//! In-memory target
//!
//! Backs a run with a byte vector instead of a device. Clones share the same
//! storage and counters, so a test can hand one clone to the consumer and keep
//! another to inspect the bytes and operation counts afterwards.
//!
//! Faults can be injected to exercise the consumer's error paths: a fixed
//! per-operation delay, and a short transfer after a given number of IOs.
//!
//! # Example
//!
//! ```
//! use poissonio::target::Target;
//! use poissonio::target::memory::MemoryTarget;
//!
//! let target = MemoryTarget::new(1024).with_short_io_after(1);
//! let mut handle = target.clone();
//!
//! assert_eq!(handle.write_at(&[7u8; 100], 0).unwrap(), 100);
//! // Second IO only moves half the bytes
//! assert_eq!(handle.write_at(&[7u8; 100], 100).unwrap(), 50);
//! assert_eq!(target.ops(), 2);
//! ```

use super::Target;
use crate::Result;
use anyhow::bail;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

#[derive(Debug, Default)]
struct Counters {
    ops: AtomicU64,
    syncs: AtomicU64,
    closed: AtomicBool,
}

/// Byte-vector target shared between clones
#[derive(Debug, Clone)]
pub struct MemoryTarget {
    path: PathBuf,
    data: Arc<Mutex<Vec<u8>>>,
    counters: Arc<Counters>,
    /// Simulated device time per IO
    latency: Option<Duration>,
    /// Number of full IOs before transfers start coming back short
    short_io_after: Option<u64>,
}

impl MemoryTarget {
    /// Create a zero-filled target of `size` bytes
    pub fn new(size: usize) -> Self {
        Self {
            path: PathBuf::from("memory"),
            data: Arc::new(Mutex::new(vec![0u8; size])),
            counters: Arc::new(Counters::default()),
            latency: None,
            short_io_after: None,
        }
    }

    /// Report `path` as the target location
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Sleep for `latency` inside every read and write
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Transfer only half the requested bytes once `ops` IOs have completed
    pub fn with_short_io_after(mut self, ops: u64) -> Self {
        self.short_io_after = Some(ops);
        self
    }

    /// Reads and writes performed across all clones
    pub fn ops(&self) -> u64 {
        self.counters.ops.load(Ordering::Relaxed)
    }

    /// Calls to `sync` across all clones
    pub fn syncs(&self) -> u64 {
        self.counters.syncs.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        self.counters.closed.load(Ordering::Acquire)
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> Vec<u8> {
        self.data().clone()
    }

    fn data(&self) -> MutexGuard<'_, Vec<u8>> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Work out the byte range an IO touches, applying injected faults
    fn span(&self, len: usize, offset: u64) -> io::Result<(usize, usize)> {
        if self.is_closed() {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "target is closed"));
        }
        if let Some(latency) = self.latency {
            thread::sleep(latency);
        }

        let done = self.counters.ops.fetch_add(1, Ordering::Relaxed);
        let mut len = len;
        if matches!(self.short_io_after, Some(limit) if done >= limit) {
            len /= 2;
        }

        let size = self.data().len();
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(size);
        let end = start.saturating_add(len).min(size);
        Ok((start, end))
    }
}

impl Target for MemoryTarget {
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let (start, end) = self.span(buf.len(), offset)?;
        let n = end - start;
        buf[..n].copy_from_slice(&self.data()[start..end]);
        Ok(n)
    }

    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize> {
        let (start, end) = self.span(buf.len(), offset)?;
        let n = end - start;
        self.data()[start..end].copy_from_slice(&buf[..n]);
        Ok(n)
    }

    fn sync(&mut self) -> Result<()> {
        if self.is_closed() {
            bail!("sync on closed target: {}", self.path.display());
        }
        self.counters.syncs.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn size(&self) -> u64 {
        self.data().len() as u64
    }

    fn close(&mut self) -> Result<()> {
        self.counters.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_target_roundtrip_bytes() {
        let target = MemoryTarget::new(1 << 20);
        let mut handle = target.clone();

        assert_eq!(handle.write_at(&[0x31; 4096], 8192).unwrap(), 4096);
        let mut buf = vec![0u8; 4096];
        assert_eq!(handle.read_at(&mut buf, 8192).unwrap(), 4096);
        assert!(buf.iter().all(|&b| b == 0x31));

        let contents = target.snapshot();
        assert_eq!(contents[8191], 0);
        assert_eq!(contents[8192], 0x31);
        assert_eq!(target.ops(), 2);
    }

    #[test]
    fn test_memory_target_short_past_end() {
        let mut target = MemoryTarget::new(1000);
        let mut buf = [0u8; 400];
        assert_eq!(target.read_at(&mut buf, 900).unwrap(), 100);
        assert_eq!(target.read_at(&mut buf, 1000).unwrap(), 0);
        assert_eq!(target.write_at(&buf, u64::MAX).unwrap(), 0);
    }

    #[test]
    fn test_memory_target_injected_short_io() {
        let mut target = MemoryTarget::new(4096).with_short_io_after(2);
        let mut buf = [0u8; 512];
        assert_eq!(target.read_at(&mut buf, 0).unwrap(), 512);
        assert_eq!(target.read_at(&mut buf, 0).unwrap(), 512);
        assert_eq!(target.read_at(&mut buf, 0).unwrap(), 256);
    }

    #[test]
    fn test_memory_target_close_shared() {
        let target = MemoryTarget::new(64).with_path("/dev/fake0");
        let mut handle = target.clone();

        handle.sync().unwrap();
        handle.close().unwrap();

        assert!(target.is_closed());
        assert_eq!(target.syncs(), 1);
        assert_eq!(handle.path(), Path::new("/dev/fake0"));

        let mut buf = [0u8; 8];
        assert!(handle.read_at(&mut buf, 0).is_err());
        assert!(handle.sync().is_err());
    }
}
