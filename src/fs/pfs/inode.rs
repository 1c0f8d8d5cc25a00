use alloc::{
    string::String,
    sync::{Arc, Weak},
    vec::Vec,
};

use super::PfsFileSystem;
use crate::{
    error::{FsError, FsResult},
    fs::inode::{Inode, InodeOps, InodeType, Stat},
};

fn upgrade(fs: &Weak<PfsFileSystem>) -> FsResult<Arc<PfsFileSystem>> {
    fs.upgrade().ok_or(FsError::NotMounted)
}

fn disk_stat(inode: &Inode) -> FsResult<Stat> {
    let din = inode.disk_inode()?;
    Ok(Stat {
        st_mode:   din.inode_type()?,
        st_nlinks: din.nlinks,
        st_blocks: din.blocks as usize,
        st_size:   din.size as usize,
    })
}

/// Directory operations of PFS
pub struct PfsDirOps {
    fs: Weak<PfsFileSystem>,
}

impl PfsDirOps {
    pub fn new(fs: Weak<PfsFileSystem>) -> Self {
        Self { fs }
    }
}

impl InodeOps for PfsDirOps {
    fn lookup(&self, inode: &Inode, name: &str) -> FsResult<Option<Arc<Inode>>> {
        let fs = upgrade(&self.fs)?;
        let din = inode.disk_inode()?;
        match fs.find_inode_id(&din, name)? {
            Some(ino) => Ok(Some(fs.get_inode(ino)?)),
            None => Ok(None),
        }
    }

    fn create(&self, inode: &Inode, name: &str) -> FsResult<Arc<Inode>> {
        upgrade(&self.fs)?.create_node(inode, name, InodeType::Regular)
    }

    fn mkdir(&self, inode: &Inode, name: &str) -> FsResult<Arc<Inode>> {
        upgrade(&self.fs)?.create_node(inode, name, InodeType::Directory)
    }

    fn ls(&self, inode: &Inode) -> FsResult<Vec<String>> {
        upgrade(&self.fs)?.list_names(&inode.disk_inode()?)
    }

    fn fstat(&self, inode: &Inode) -> FsResult<Stat> {
        disk_stat(inode)
    }
}

/// Regular file operations of PFS
pub struct PfsFileOps {
    fs: Weak<PfsFileSystem>,
}

impl PfsFileOps {
    pub fn new(fs: Weak<PfsFileSystem>) -> Self {
        Self { fs }
    }
}

impl InodeOps for PfsFileOps {
    fn read_at(&self, inode: &Inode, offset: usize, buf: &mut [u8]) -> FsResult<usize> {
        upgrade(&self.fs)?.read_data(&inode.disk_inode()?, offset, buf)
    }

    fn write_at(&self, inode: &Inode, offset: usize, buf: &[u8]) -> FsResult<usize> {
        let fs = upgrade(&self.fs)?;
        let mut din = inode.disk_inode()?;
        let size = fs.write_data(&mut din, offset, buf)?;
        fs.store_dinode(inode.ino(), &din)?;
        inode.update_disk_inode(din)?;
        fs.sync_meta()?;
        Ok(size)
    }

    fn fstat(&self, inode: &Inode) -> FsResult<Stat> {
        disk_stat(inode)
    }
}
