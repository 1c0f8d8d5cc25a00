//! Host passthrough
//!
//! Paths without a device prefix belong to the host, e.g. the proxy kernel's
//! front-end. The storage stack only forwards calls and keeps the host's
//! descriptor in the open-file slot.

use crate::error::{FsError, FsResult};

/// File I/O offered by the host environment
pub trait HostFs: Send + Sync {
    /// Open `path`; returns the host's own descriptor
    fn open(&self, path: &str, flags: u32) -> FsResult<usize>;
    fn read(&self, fd: usize, buf: &mut [u8]) -> FsResult<usize>;
    fn write(&self, fd: usize, buf: &[u8]) -> FsResult<usize>;
    fn close(&self, fd: usize) -> FsResult<()>;
}

/// A host that offers nothing
pub struct NoHost;

impl HostFs for NoHost {
    fn open(&self, path: &str, _flags: u32) -> FsResult<usize> {
        warn!("no host file system, cannot open {}", path);
        Err(FsError::HostIo)
    }

    fn read(&self, _fd: usize, _buf: &mut [u8]) -> FsResult<usize> {
        Err(FsError::HostIo)
    }

    fn write(&self, _fd: usize, _buf: &[u8]) -> FsResult<usize> {
        Err(FsError::HostIo)
    }

    fn close(&self, _fd: usize) -> FsResult<()> {
        Err(FsError::HostIo)
    }
}
