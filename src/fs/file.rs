//! Per-process open-file table
//!
//! A descriptor is the index of its slot. Slots of device-backed files hold
//! the inode and the current offset; host slots only remember the host's own
//! descriptor and forward every call.

use alloc::{sync::Arc, vec::Vec};

use super::{
    fs::VfsNode,
    inode::{Inode, InodeType, Stat},
    path::Path,
    OpenFlags, Storage,
};
use crate::{
    config::MAX_FILES,
    error::{FsError, FsResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// never used
    None,
    /// passthrough to the host
    Host,
    Opened,
    Closed,
}

pub struct OpenFile {
    status:   FileStatus,
    readable: bool,
    writable: bool,
    /// slot index, or the host descriptor for host files
    fd:       usize,
    offset:   usize,
    inode:    Option<Arc<Inode>>,
}

impl OpenFile {
    const fn empty() -> Self {
        Self {
            status:   FileStatus::None,
            readable: false,
            writable: false,
            fd:       0,
            offset:   0,
            inode:    None,
        }
    }

    pub fn status(&self) -> FileStatus {
        self.status
    }

    pub fn readable(&self) -> bool {
        self.readable
    }

    pub fn writable(&self) -> bool {
        self.writable
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    fn is_free(&self) -> bool {
        matches!(self.status, FileStatus::None | FileStatus::Closed)
    }

    fn inode(&self) -> FsResult<&Arc<Inode>> {
        self.inode.as_ref().ok_or(FsError::BadFd)
    }
}

pub struct FdTable {
    storage:     Arc<Storage>,
    files:       Vec<OpenFile>,
    files_count: usize,
}

impl FdTable {
    pub fn new(storage: Arc<Storage>) -> Self {
        let mut files = Vec::with_capacity(MAX_FILES);
        files.resize_with(MAX_FILES, OpenFile::empty);
        Self {
            storage,
            files,
            files_count: 0,
        }
    }

    /// number of descriptors currently open
    pub fn files_count(&self) -> usize {
        self.files_count
    }

    /// First slot that is unused or closed
    pub fn alloc_fd(&self) -> FsResult<usize> {
        self.files.iter().position(OpenFile::is_free).ok_or_else(|| {
            warn!("no file entry for current process");
            FsError::TooManyFiles
        })
    }

    pub fn get(&self, fd: usize) -> FsResult<&OpenFile> {
        match self.files.get(fd) {
            Some(file) if !file.is_free() => Ok(file),
            _ => Err(FsError::BadFd),
        }
    }

    fn get_mut(&mut self, fd: usize) -> FsResult<&mut OpenFile> {
        match self.files.get_mut(fd) {
            Some(file) if !file.is_free() => Ok(file),
            _ => Err(FsError::BadFd),
        }
    }

    /// Open `path`, returning its descriptor
    pub fn open(&mut self, path: &str, flags: OpenFlags) -> FsResult<usize> {
        let (readable, writable) = flags.read_write()?;
        let fd = self.alloc_fd()?;
        let path = Path::new(path);
        let file = match self.storage.mounts.open(&path, flags)? {
            VfsNode::Host => {
                let host_fd = self.storage.host.open(path.as_str(), flags.bits())?;
                OpenFile {
                    status: FileStatus::Host,
                    readable,
                    writable,
                    fd: host_fd,
                    offset: 0,
                    inode: None,
                }
            }
            VfsNode::Inode(inode) => {
                // writers append to regular files
                let offset = if writable && inode.inode_type() == InodeType::Regular {
                    match inode.fstat() {
                        Ok(stat) => stat.st_size,
                        Err(err) => {
                            self.storage.mounts.close(&inode);
                            return Err(err);
                        }
                    }
                } else {
                    0
                };
                OpenFile {
                    status: FileStatus::Opened,
                    readable,
                    writable,
                    fd,
                    offset,
                    inode: Some(inode),
                }
            }
        };
        debug!("open {} as fd {} ({:?})", path.as_str(), fd, file.status);
        self.files[fd] = file;
        self.files_count += 1;
        Ok(fd)
    }

    /// Read from the current offset, advancing it by the bytes read
    pub fn read(&mut self, fd: usize, buf: &mut [u8]) -> FsResult<usize> {
        let storage = Arc::clone(&self.storage);
        let file = self.get_mut(fd)?;
        if !file.readable {
            return Err(FsError::PermissionDenied);
        }
        if file.status == FileStatus::Host {
            return storage.host.read(file.fd, buf);
        }
        let size = file.inode()?.read_at(file.offset, buf)?;
        file.offset += size;
        Ok(size)
    }

    /// Write at the current offset, advancing it by the bytes written
    pub fn write(&mut self, fd: usize, buf: &[u8]) -> FsResult<usize> {
        let storage = Arc::clone(&self.storage);
        let file = self.get_mut(fd)?;
        if !file.writable {
            return Err(FsError::PermissionDenied);
        }
        if file.status == FileStatus::Host {
            return storage.host.write(file.fd, buf);
        }
        let size = file.inode()?.write_at(file.offset, buf)?;
        file.offset += size;
        Ok(size)
    }

    /// Move the offset to `pos`; positions past the end are refused
    pub fn seek(&mut self, fd: usize, pos: usize) -> FsResult<usize> {
        let file = self.get_mut(fd)?;
        if file.status == FileStatus::Host {
            return Err(FsError::NotSupported);
        }
        if pos > file.inode()?.fstat()?.st_size {
            return Err(FsError::InvalidArgument);
        }
        file.offset = pos;
        Ok(pos)
    }

    pub fn fstat(&self, fd: usize) -> FsResult<Stat> {
        let file = self.get(fd)?;
        if file.status == FileStatus::Host {
            return Err(FsError::NotSupported);
        }
        file.inode()?.fstat()
    }

    pub fn close(&mut self, fd: usize) -> FsResult<()> {
        let storage = Arc::clone(&self.storage);
        let file = self.get_mut(fd)?;
        let host_fd = (file.status == FileStatus::Host).then_some(file.fd);
        let inode = file.inode.take();
        *file = OpenFile {
            status: FileStatus::Closed,
            ..OpenFile::empty()
        };
        self.files_count -= 1;
        debug!("close fd {}", fd);
        if let Some(inode) = inode {
            storage.mounts.close(&inode);
        }
        match host_fd {
            Some(host_fd) => storage.host.close(host_fd),
            None => Ok(()),
        }
    }

    /// Close every descriptor still open
    pub fn close_all(&mut self) {
        for fd in 0..self.files.len() {
            if !self.files[fd].is_free() {
                if let Err(err) = self.close(fd) {
                    warn!("close fd {} failed: {}", fd, err);
                }
            }
        }
    }
}

impl Drop for FdTable {
    fn drop(&mut self) {
        self.close_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fs::host::NoHost, mm::FramePool};

    fn fd_table() -> FdTable {
        let pool = FramePool::new(1024);
        FdTable::new(Arc::new(crate::fs::init(&pool, Arc::new(NoHost)).unwrap()))
    }

    #[test]
    fn test_alloc_reuses_closed_slot() {
        let mut table = fd_table();
        let a = table.open("ramdisk0:/a", OpenFlags::CREATE | OpenFlags::RDWR).unwrap();
        let b = table.open("ramdisk0:/b", OpenFlags::CREATE | OpenFlags::RDWR).unwrap();
        assert_eq!((a, b), (0, 1));
        assert_eq!(table.files_count(), 2);
        table.close(a).unwrap();
        assert!(table.get(a).is_err());
        assert_eq!(table.alloc_fd().unwrap(), a);
        assert_eq!(table.files_count(), 1);
    }

    #[test]
    fn test_bad_fd() {
        let mut table = fd_table();
        let mut buf = [0u8; 4];
        assert_eq!(table.read(0, &mut buf), Err(FsError::BadFd));
        assert_eq!(table.write(MAX_FILES, &buf), Err(FsError::BadFd));
        assert_eq!(table.close(3), Err(FsError::BadFd));
        let fd = table.open("ramdisk0:/f", OpenFlags::CREATE).unwrap();
        table.close(fd).unwrap();
        assert_eq!(table.close(fd), Err(FsError::BadFd));
    }

    #[test]
    fn test_table_full() {
        let mut table = fd_table();
        for _ in 0..MAX_FILES {
            table.open("ramdisk0:/", OpenFlags::RDONLY).unwrap();
        }
        assert_eq!(table.open("ramdisk0:/", OpenFlags::RDONLY), Err(FsError::TooManyFiles));
    }

    #[test]
    fn test_no_host() {
        let mut table = fd_table();
        assert_eq!(table.open("hostfile", OpenFlags::RDONLY), Err(FsError::HostIo));
        assert_eq!(table.files_count(), 0);
    }

    #[test]
    fn test_seek() {
        let mut table = fd_table();
        let fd = table.open("ramdisk0:/s", OpenFlags::CREATE | OpenFlags::RDWR).unwrap();
        table.write(fd, b"abcdef").unwrap();
        assert_eq!(table.get(fd).unwrap().offset(), 6);
        assert_eq!(table.seek(fd, 7), Err(FsError::InvalidArgument));
        assert_eq!(table.seek(fd, 2).unwrap(), 2);
        let mut buf = [0u8; 3];
        assert_eq!(table.read(fd, &mut buf).unwrap(), 3);
        assert_eq!(&buf, b"cde");
        table.seek(fd, 6).unwrap();
        table.write(fd, b"g").unwrap();
        assert_eq!(table.fstat(fd).unwrap().st_size, 7);
    }
}
