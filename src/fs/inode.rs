use alloc::{collections::BTreeMap, string::String, sync::Arc, vec::Vec};
use core::sync::atomic::{AtomicUsize, Ordering};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use spin::Mutex;

use super::pfs::DiskInode;
use crate::{
    block::BlockDevice,
    error::{FsError, FsResult},
};

/// In-memory inode shared by every open of the same node
pub struct Inode {
    ino:       usize,
    type_:     InodeType,
    ref_count: AtomicUsize,
    info:      Mutex<InodeInfo>,
    ops:       Arc<dyn InodeOps>,
}

/// What an inode stands for: a raw device, or a node of a mounted filesystem
pub enum InodeInfo {
    Device(DeviceInfo),
    Disk(DiskInode),
}

#[derive(Clone)]
pub struct DeviceInfo {
    pub name:   String,
    pub device: Arc<dyn BlockDevice>,
}

impl Inode {
    /// new
    pub fn new(ino: usize, type_: InodeType, info: InodeInfo, ops: Arc<dyn InodeOps>) -> Self {
        Self {
            ino,
            type_,
            ref_count: AtomicUsize::new(0),
            info: Mutex::new(info),
            ops,
        }
    }

    pub fn ino(&self) -> usize {
        self.ino
    }

    pub fn inode_type(&self) -> InodeType {
        self.type_
    }

    pub fn is_dir(&self) -> bool {
        self.type_ == InodeType::Directory
    }

    /// number of open file entries referring to this inode
    pub fn ref_count(&self) -> usize {
        self.ref_count.load(Ordering::Acquire)
    }

    /// take a reference on behalf of an open file
    pub fn acquire(&self) -> usize {
        self.ref_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// drop a reference taken by [`Inode::acquire`]
    pub fn release(&self) -> usize {
        let mut current = self.ref_count.load(Ordering::Acquire);
        while current > 0 {
            match self.ref_count.compare_exchange(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return current - 1,
                Err(actual) => current = actual,
            }
        }
        0
    }

    /// copy of the on-disk record held in memory
    pub fn disk_inode(&self) -> FsResult<DiskInode> {
        match &*self.info.lock() {
            InodeInfo::Disk(din) => Ok(*din),
            InodeInfo::Device(_) => Err(FsError::NotSupported),
        }
    }

    /// replace the in-memory copy after the record was written back
    pub fn update_disk_inode(&self, din: DiskInode) -> FsResult<()> {
        match &mut *self.info.lock() {
            InodeInfo::Disk(old) => {
                *old = din;
                Ok(())
            }
            InodeInfo::Device(_) => Err(FsError::NotSupported),
        }
    }

    pub fn device_info(&self) -> FsResult<DeviceInfo> {
        match &*self.info.lock() {
            InodeInfo::Device(dev) => Ok(dev.clone()),
            InodeInfo::Disk(_) => Err(FsError::NotSupported),
        }
    }

    /// lookup an inode in the directory
    pub fn lookup(&self, name: &str) -> FsResult<Option<Arc<Inode>>> {
        self.ops.lookup(self, name)
    }
    /// create a regular file in the directory
    pub fn create(&self, name: &str) -> FsResult<Arc<Inode>> {
        self.ops.create(self, name)
    }
    /// make a directory in the directory
    pub fn mkdir(&self, name: &str) -> FsResult<Arc<Inode>> {
        self.ops.mkdir(self, name)
    }
    /// list all names in the directory
    pub fn ls(&self) -> FsResult<Vec<String>> {
        self.ops.ls(self)
    }
    /// read at the offset of the inode
    pub fn read_at(&self, offset: usize, buf: &mut [u8]) -> FsResult<usize> {
        self.ops.read_at(self, offset, buf)
    }
    /// write at the offset of the inode
    pub fn write_at(&self, offset: usize, buf: &[u8]) -> FsResult<usize> {
        self.ops.write_at(self, offset, buf)
    }
    pub fn fstat(&self) -> FsResult<Stat> {
        self.ops.fstat(self)
    }
    /// read all data
    pub fn read_all(&self) -> FsResult<Vec<u8>> {
        let mut buffer = [0u8; 512];
        let mut read_size = 0;
        let mut v: Vec<u8> = Vec::new();
        loop {
            let len = self.ops.read_at(self, read_size, &mut buffer)?;
            if len == 0 {
                break;
            }
            read_size += len;
            v.extend_from_slice(&buffer[..len]);
        }
        Ok(v)
    }
}

/* Inode Operators */

/// Operations table of an inode.
///
/// Each kind of node only implements what it supports; everything else
/// falls back to an error naming why the call does not apply.
pub trait InodeOps: Send + Sync {
    /// lookup an inode in the directory with the name (just name not path)
    fn lookup(&self, _inode: &Inode, _name: &str) -> FsResult<Option<Arc<Inode>>> {
        Err(FsError::NotDir)
    }
    /// create a regular file in the directory with the name
    fn create(&self, _inode: &Inode, _name: &str) -> FsResult<Arc<Inode>> {
        Err(FsError::NotDir)
    }
    /// make a directory in the directory with the name
    fn mkdir(&self, _inode: &Inode, _name: &str) -> FsResult<Arc<Inode>> {
        Err(FsError::NotDir)
    }
    /// list all names in the directory
    fn ls(&self, _inode: &Inode) -> FsResult<Vec<String>> {
        Err(FsError::NotDir)
    }
    /// read at the offset of the inode
    fn read_at(&self, _inode: &Inode, _offset: usize, _buf: &mut [u8]) -> FsResult<usize> {
        Err(FsError::IsDir)
    }
    /// write at the offset of the inode
    fn write_at(&self, _inode: &Inode, _offset: usize, _buf: &[u8]) -> FsResult<usize> {
        Err(FsError::IsDir)
    }
    fn fstat(&self, inode: &Inode) -> FsResult<Stat>;
}

/* Inode Types */

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum InodeType {
    Free      = 0,
    Device    = 1,
    Directory = 2,
    Regular   = 3,
}

/* Inode Manager */

/// Keeps one in-memory inode per inode number
pub struct InodeManager {
    inodes: BTreeMap<usize, Arc<Inode>>,
}

impl InodeManager {
    pub fn new() -> Self {
        Self {
            inodes: BTreeMap::new(),
        }
    }

    pub fn get(&self, ino: usize) -> Option<Arc<Inode>> {
        self.inodes.get(&ino).map(Arc::clone)
    }

    pub fn insert(&mut self, inode: Arc<Inode>) {
        self.inodes.insert(inode.ino, inode);
    }

    /// Drop cached inodes nobody has open or holds; returns how many went
    pub fn reclaim(&mut self) -> usize {
        let before = self.inodes.len();
        self.inodes
            .retain(|_, inode| inode.ref_count() > 0 || Arc::strong_count(inode) > 1);
        before - self.inodes.len()
    }

    pub fn len(&self) -> usize {
        self.inodes.len()
    }
}

/* Inode Stat */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    /// file type
    pub st_mode:   InodeType,
    /// Number of hard links
    pub st_nlinks: u32,
    /// Number of blocks the node is using
    pub st_blocks: usize,
    /// Size of file, in bytes.
    pub st_size:   usize,
}

impl Stat {
    pub fn is_dir(&self) -> bool {
        self.st_mode == InodeType::Directory
    }

    pub fn is_file(&self) -> bool {
        self.st_mode == InodeType::Regular
    }
}
