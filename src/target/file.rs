//! File and block device target
//!
//! Opens an existing path read-write. The size is taken by seeking to the end,
//! which reports the capacity of block devices as well as the length of
//! regular files (where `metadata().len()` would be 0 for a device node).
//!
//! # Example
//!
//! ```no_run
//! use poissonio::target::{OpenFlags, Target};
//! use poissonio::target::file::FileTarget;
//!
//! let flags = OpenFlags { direct: true, sync: true };
//! let mut target = FileTarget::open("/dev/nvme0n1", flags).unwrap();
//! println!("{} bytes, {} byte sectors", target.size(), target.logical_block_size());
//! target.close().unwrap();
//! ```

use super::{OpenFlags, Target};
use crate::Result;
use anyhow::{bail, Context};
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom};
use std::os::unix::fs::{FileExt, OpenOptionsExt};
use std::os::unix::io::{AsRawFd, IntoRawFd, RawFd};
use std::path::{Path, PathBuf};

/// Read-write handle on a file or block device
#[derive(Debug)]
pub struct FileTarget {
    path: PathBuf,

    /// Open handle (None after close)
    file: Option<File>,

    flags: OpenFlags,

    /// Size in bytes, determined at open
    size: u64,

    /// Logical block size for O_DIRECT alignment (detected at open)
    logical_block_size: u64,
}

impl FileTarget {
    /// Open an existing target
    ///
    /// # Arguments
    ///
    /// * `path` - File or block device; it is never created
    /// * `flags` - O_SYNC / O_DIRECT selection
    ///
    /// # Errors
    ///
    /// Fails if the path cannot be opened read-write or its size cannot be
    /// determined.
    pub fn open(path: impl AsRef<Path>, flags: OpenFlags) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut options = OpenOptions::new();
        options.read(true).write(true);

        let mut custom_flags = 0;
        if flags.direct {
            custom_flags |= libc::O_DIRECT;
        }
        if flags.sync {
            custom_flags |= libc::O_SYNC;
        }
        if custom_flags != 0 {
            options.custom_flags(custom_flags);
        }

        let mut file = options
            .open(&path)
            .with_context(|| format!("Failed to open target: {}", path.display()))?;

        let size = file
            .seek(SeekFrom::End(0))
            .with_context(|| format!("Failed to determine size of target: {}", path.display()))?;

        let logical_block_size = detect_logical_block_size(file.as_raw_fd());

        tracing::debug!(
            path = %path.display(),
            size,
            logical_block_size,
            direct = flags.direct,
            sync = flags.sync,
            "opened target"
        );

        Ok(Self {
            path,
            file: Some(file),
            flags,
            size,
            logical_block_size,
        })
    }

    #[inline]
    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    fn file(&self) -> io::Result<&File> {
        self.file
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "target is closed"))
    }
}

/// Query the device sector size, falling back to the filesystem block size
///
/// Returns 512 when neither can be determined.
fn detect_logical_block_size(fd: RawFd) -> u64 {
    // BLKSSZGET only succeeds on block devices
    let mut block_size: libc::c_int = 0;
    let result = unsafe { libc::ioctl(fd, libc::BLKSSZGET, &mut block_size) };
    if result == 0 && block_size > 0 {
        return block_size as u64;
    }

    let mut stat: libc::stat = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::fstat(fd, &mut stat) };
    if result == 0 {
        let blksize = stat.st_blksize as u64;
        if blksize >= 512 && blksize.is_power_of_two() {
            return blksize;
        }
    }

    512
}

impl Target for FileTarget {
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.file()?.read_at(buf, offset)
    }

    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize> {
        self.file()?.write_at(buf, offset)
    }

    fn sync(&mut self) -> Result<()> {
        let file = self.file()?;
        file.sync_data()
            .with_context(|| format!("fdatasync failed: path={}", self.path.display()))
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn close(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            // Close explicitly so errors are reported instead of swallowed by Drop
            let fd = file.into_raw_fd();
            let result = unsafe { libc::close(fd) };
            if result < 0 {
                let err = io::Error::last_os_error();
                bail!("close failed: path={}: {}", self.path.display(), err);
            }
        }
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn logical_block_size(&self) -> u64 {
        self.logical_block_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn buffered() -> OpenFlags {
        OpenFlags {
            direct: false,
            sync: false,
        }
    }

    #[test]
    fn test_file_target_size_from_seek() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("target.dat");
        std::fs::write(&file_path, vec![0u8; 64 * 1024]).unwrap();

        let mut target = FileTarget::open(&file_path, buffered()).unwrap();
        assert_eq!(target.size(), 64 * 1024);
        assert_eq!(target.path(), file_path.as_path());
        assert!(target.logical_block_size() >= 512);
        assert!(target.close().is_ok());
    }

    #[test]
    fn test_file_target_missing_path() {
        let temp_dir = TempDir::new().unwrap();
        let err = FileTarget::open(temp_dir.path().join("absent"), buffered()).unwrap_err();
        assert!(err.to_string().contains("Failed to open target"));
    }

    #[test]
    fn test_file_target_positioned_io() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("target.dat");
        std::fs::write(&file_path, vec![0u8; 8192]).unwrap();

        let mut target = FileTarget::open(&file_path, OpenFlags::default()).unwrap();
        assert_eq!(target.write_at(&[0xAB; 100], 4000).unwrap(), 100);
        target.sync().unwrap();

        let mut buf = [0u8; 100];
        assert_eq!(target.read_at(&mut buf, 4000).unwrap(), 100);
        assert!(buf.iter().all(|&b| b == 0xAB));

        // Reads past the end come back short
        let mut tail = [0u8; 512];
        assert_eq!(target.read_at(&mut tail, 8000).unwrap(), 192);
        target.close().unwrap();

        let on_disk = std::fs::read(&file_path).unwrap();
        assert_eq!(on_disk.len(), 8192);
        assert!(on_disk[4000..4100].iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn test_file_target_io_after_close_fails() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("target.dat");
        std::fs::write(&file_path, vec![0u8; 4096]).unwrap();

        let mut target = FileTarget::open(&file_path, buffered()).unwrap();
        target.close().unwrap();
        target.close().unwrap();

        let mut buf = [0u8; 16];
        let err = target.read_at(&mut buf, 0).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
        assert!(target.sync().is_err());
    }

    #[test]
    fn test_file_target_o_direct() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("direct.dat");
        std::fs::write(&file_path, vec![0u8; 4096]).unwrap();

        let flags = OpenFlags {
            direct: true,
            sync: false,
        };

        // O_DIRECT may not work on tmpfs, so we allow this to fail
        if let Ok(mut target) = FileTarget::open(&file_path, flags) {
            assert_eq!(target.size(), 4096);
            assert!(target.flags().direct);
            assert!(target.close().is_ok());
        }
    }
}
