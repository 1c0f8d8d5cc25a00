//! Disk layout & data structure layer
//!
//! ```text
//! block 0          super block
//! blocks 1..=10    inode table, one disk inode per block (ino == block number)
//! block 11         free-block bitmap of the data region
//! blocks 12..      data blocks, bit `i` of the bitmap is block `12 + i`
//! ```
//!
//! None of the offsets are stored on disk: they are the constants in
//! [`super`], and formatting code and readers must agree on them.

use core::mem::size_of;

use super::{PFS_BLKN_FREE, PFS_BLKN_INODE, PFS_MAGIC, PFS_MAX_FNAME_LEN, PFS_MAX_INODE_NUM, PFS_NDIRECT};
use crate::{
    block::BLOCK_SZ,
    error::{FsError, FsResult},
    fs::inode::InodeType,
};

/// Size of a directory entry on disk
pub const DIRENT_SZ: usize = size_of::<DirEntry>();
/// Largest file a disk inode can describe
pub const PFS_MAX_FILE_SIZE: usize = PFS_NDIRECT * BLOCK_SZ;

/// Super block of a PFS
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    magic: u32,
    /// Size of file system image (blocks)
    pub size: u32,
    /// Number of data blocks
    pub nblocks: u32,
    /// Number of inodes
    pub ninodes: u32,
}

impl SuperBlock {
    /// Build the super block for a device of `device_blocks` blocks
    pub fn for_device(device_blocks: usize) -> FsResult<Self> {
        if device_blocks <= PFS_BLKN_FREE {
            return Err(FsError::DeviceTooSmall);
        }
        let nblocks = (PFS_MAX_INODE_NUM * PFS_NDIRECT).min(device_blocks - PFS_BLKN_FREE);
        Ok(Self {
            magic: PFS_MAGIC,
            size: (PFS_BLKN_FREE + nblocks) as u32,
            nblocks: nblocks as u32,
            ninodes: PFS_MAX_INODE_NUM as u32,
        })
    }

    pub fn is_valid(&self) -> bool {
        self.magic == PFS_MAGIC
    }

    /// inode numbers handed out by this filesystem
    pub fn inode_range(&self) -> core::ops::Range<usize> {
        PFS_BLKN_INODE..PFS_BLKN_INODE + self.ninodes as usize
    }
}

/// Inode on disk, one per inode-table block
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskInode {
    /// size of the file (in bytes)
    pub size: u32,
    type_: u32,
    /// number of hard links
    pub nlinks: u32,
    /// number of blocks in use
    pub blocks: u32,
    /// direct blocks
    pub direct: [u32; PFS_NDIRECT],
}

impl DiskInode {
    /// A FREE placeholder
    pub fn free() -> Self {
        Self::new(InodeType::Free)
    }

    pub fn new(type_: InodeType) -> Self {
        Self {
            size: 0,
            type_: type_.into(),
            nlinks: 0,
            blocks: 0,
            direct: [0; PFS_NDIRECT],
        }
    }

    pub fn inode_type(&self) -> FsResult<InodeType> {
        InodeType::try_from(self.type_).map_err(|_| FsError::Corrupted)
    }

    pub fn is_free(&self) -> bool {
        self.type_ == u32::from(InodeType::Free)
    }

    pub fn is_dir(&self) -> bool {
        self.type_ == u32::from(InodeType::Directory)
    }

    /// Number of data blocks needed to hold `size` bytes
    pub fn data_blocks(size: usize) -> usize {
        (size + BLOCK_SZ - 1) / BLOCK_SZ
    }

    /// Block number backing the `inner_id`-th block of the node
    pub fn block_id(&self, inner_id: usize) -> FsResult<usize> {
        if inner_id >= self.blocks as usize || inner_id >= PFS_NDIRECT {
            return Err(FsError::Corrupted);
        }
        Ok(self.direct[inner_id] as usize)
    }
}

/// Directory entry
#[repr(C)]
#[derive(Clone, Copy)]
pub struct DirEntry {
    inum: u32,
    name: [u8; PFS_MAX_FNAME_LEN],
}

impl DirEntry {
    /// Create an empty directory entry
    pub fn empty() -> Self {
        Self {
            inum: 0,
            name: [0u8; PFS_MAX_FNAME_LEN],
        }
    }

    /// Create a directory entry from name and inode number
    pub fn new(name: &str, inum: usize) -> FsResult<Self> {
        let bytes = name.as_bytes();
        // one byte is kept for the terminating NUL
        if bytes.is_empty() || bytes.len() >= PFS_MAX_FNAME_LEN || bytes.contains(&0) {
            return Err(FsError::InvalidName);
        }
        let mut entry = Self::empty();
        entry.name[..bytes.len()].copy_from_slice(bytes);
        entry.inum = inum as u32;
        Ok(entry)
    }

    /// Serialize into bytes
    pub fn as_bytes(&self) -> &[u8] {
        unsafe { core::slice::from_raw_parts(self as *const _ as usize as *const u8, DIRENT_SZ) }
    }

    /// Serialize into mutable bytes
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { core::slice::from_raw_parts_mut(self as *mut _ as usize as *mut u8, DIRENT_SZ) }
    }

    /// Get name of the entry
    pub fn name(&self) -> &str {
        let len = self.name.iter().position(|b| *b == 0).unwrap_or(PFS_MAX_FNAME_LEN);
        core::str::from_utf8(&self.name[..len]).unwrap_or("")
    }

    /// Get inode number of the entry
    pub fn inode_number(&self) -> usize {
        self.inum as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes() {
        assert_eq!(DIRENT_SZ, 32);
        assert_eq!(size_of::<DiskInode>(), 16 + 4 * PFS_NDIRECT);
        assert!(size_of::<SuperBlock>() <= BLOCK_SZ);
        assert_eq!(BLOCK_SZ % DIRENT_SZ, 0);
    }

    #[test]
    fn test_geometry() {
        let sb = SuperBlock::for_device(128).unwrap();
        assert!(sb.is_valid());
        assert_eq!(sb.nblocks as usize, PFS_MAX_INODE_NUM * PFS_NDIRECT);
        assert_eq!(sb.size as usize, PFS_BLKN_FREE + PFS_MAX_INODE_NUM * PFS_NDIRECT);

        let sb = SuperBlock::for_device(64).unwrap();
        assert_eq!(sb.nblocks, 64 - PFS_BLKN_FREE as u32);
        assert_eq!(sb.size, 64);

        assert_eq!(SuperBlock::for_device(PFS_BLKN_FREE), Err(FsError::DeviceTooSmall));
    }

    #[test]
    fn test_dir_entry_names() {
        let entry = DirEntry::new("hello.txt", 3).unwrap();
        assert_eq!(entry.name(), "hello.txt");
        assert_eq!(entry.inode_number(), 3);

        let longest = "a".repeat(PFS_MAX_FNAME_LEN - 1);
        assert_eq!(DirEntry::new(&longest, 1).unwrap().name(), longest);
        let too_long = "a".repeat(PFS_MAX_FNAME_LEN);
        assert_eq!(DirEntry::new(&too_long, 1).err(), Some(FsError::InvalidName));
        assert_eq!(DirEntry::new("", 1).err(), Some(FsError::InvalidName));
    }

    #[test]
    fn test_disk_inode_type() {
        let din = DiskInode::new(InodeType::Directory);
        assert!(din.is_dir());
        assert!(!din.is_free());
        assert_eq!(din.inode_type(), Ok(InodeType::Directory));
        assert!(DiskInode::free().is_free());
        assert_eq!(DiskInode::data_blocks(0), 0);
        assert_eq!(DiskInode::data_blocks(1), 1);
        assert_eq!(DiskInode::data_blocks(BLOCK_SZ), 1);
        assert_eq!(DiskInode::data_blocks(BLOCK_SZ + 1), 2);
        assert_eq!(din.block_id(0), Err(FsError::Corrupted));
    }
}
