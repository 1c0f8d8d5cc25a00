//! Virtual file system: mount table, inodes, open-file table & PFS

pub mod dev;
pub mod file;
#[allow(clippy::module_inception)]
pub mod fs;
pub mod host;
pub mod inode;
pub mod path;
pub mod pfs;

use alloc::sync::Arc;

pub use file::{FdTable, FileStatus, OpenFile};
pub use fs::{FileSystem, FileSystemType, Lookup, MountTable, VfsNode};
pub use host::{HostFs, NoHost};
pub use inode::{Inode, InodeType, Stat};
pub use path::Path;

use crate::{
    config::{RAMDISK_BLOCKS, RAMDISK_NAMES},
    drivers::block::RamDisk,
    error::{FsError, FsResult},
    mm::FramePool,
};

bitflags! {
    ///  The flags argument to the open() system call
    pub struct OpenFlags: u32 {
        /// readyonly
        const RDONLY = 0;
        /// writeonly
        const WRONLY = 1 << 0;
        /// read and write
        const RDWR = 1 << 1;
        /// create new file
        const CREATE = 1 << 6;
    }
}

impl OpenFlags {
    /// Mask of the access mode bits
    const ACCMODE: u32 = 0b11;

    /// Return (readable, writable)
    pub fn read_write(&self) -> FsResult<(bool, bool)> {
        match self.bits() & Self::ACCMODE {
            0 => Ok((true, false)),
            1 => Ok((false, true)),
            2 => Ok((true, true)),
            _ => Err(FsError::InvalidArgument),
        }
    }
}

/// Everything the file syscalls reach: the mounted devices and the host
pub struct Storage {
    pub mounts: MountTable,
    pub host:   Arc<dyn HostFs>,
}

/// Register one RAM disk per configured name and mount PFS on each
pub fn init(pool: &FramePool, host: Arc<dyn HostFs>) -> FsResult<Storage> {
    let mounts = MountTable::new();
    for (id, name) in RAMDISK_NAMES.iter().enumerate() {
        let disk = Arc::new(RamDisk::new(id, RAMDISK_BLOCKS, pool)?);
        mounts.register_device(name, disk)?;
        mounts.mount(name, pfs::pfs_do_mount)?;
    }
    Ok(Storage { mounts, host })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_flags() {
        assert_eq!(OpenFlags::RDONLY.read_write(), Ok((true, false)));
        assert_eq!(OpenFlags::WRONLY.read_write(), Ok((false, true)));
        assert_eq!(OpenFlags::RDWR.read_write(), Ok((true, true)));
        assert_eq!(
            (OpenFlags::RDWR | OpenFlags::CREATE).read_write(),
            Ok((true, true))
        );
        assert_eq!(
            (OpenFlags::RDWR | OpenFlags::WRONLY).read_write(),
            Err(FsError::InvalidArgument)
        );
    }

    #[test]
    fn test_init_mounts_ramdisks() {
        let pool = FramePool::new(1024);
        let storage = init(&pool, Arc::new(NoHost)).unwrap();
        for name in RAMDISK_NAMES {
            let root = storage.mounts.get_root(name).unwrap();
            assert!(root.fstat().unwrap().is_dir());
        }
    }
}
