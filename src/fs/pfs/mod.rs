//! PFS, the simple disk filesystem
//!
//! Fixed layout, ten inodes, ten direct blocks per node, flat name lookup.
//! Every mount starts from a freshly formatted disk.

mod bitmap;
mod file_system;
mod inode;
mod layout;

use alloc::sync::Arc;

pub use file_system::PfsFileSystem;
pub use layout::{DirEntry, DiskInode, SuperBlock, DIRENT_SZ, PFS_MAX_FILE_SIZE};

use super::fs::FileSystem;
use crate::{block::BlockDevice, config::BLOCK_SZ, error::FsResult};

pub const PFS_TYPE: u32 = 0;
/// magic number
pub const PFS_MAGIC: u32 = 0x2f8dbe2a;
pub const PFS_BLKSIZE: usize = BLOCK_SZ;
/// max number of inodes
pub const PFS_MAX_INODE_NUM: usize = 10;
/// max length of filename, NUL included
pub const PFS_MAX_FNAME_LEN: usize = 28;
/// number of direct blocks of an inode
pub const PFS_NDIRECT: usize = 10;

pub const PFS_BLKN_SUPER: usize = 0;
pub const PFS_BLKN_INODE: usize = 1;
pub const PFS_BLKN_BITMAP: usize = PFS_BLKN_INODE + PFS_MAX_INODE_NUM;
pub const PFS_BLKN_FREE: usize = PFS_BLKN_BITMAP + 1;

/// Format `dev` with PFS and mount it
pub fn pfs_do_mount(dev: Arc<dyn BlockDevice>) -> FsResult<Arc<dyn FileSystem>> {
    let fs: Arc<dyn FileSystem> = PfsFileSystem::format(dev)?;
    Ok(fs)
}
