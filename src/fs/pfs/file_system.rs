//! PFS on one mounted device
//!
//! Mounting always formats: a fresh super block, a bitmap with only the root
//! directory's block in use, FREE placeholders in every inode-table block, a
//! root DIR inode and its single directory block holding `"/" -> root`.
//! Nothing survives a remount.

use alloc::{
    string::String,
    sync::{Arc, Weak},
    vec::Vec,
};
use core::cmp::min;

use spin::Mutex;

use super::{
    bitmap::Bitmap,
    inode::{PfsDirOps, PfsFileOps},
    layout::{DirEntry, DiskInode, SuperBlock, DIRENT_SZ, PFS_MAX_FILE_SIZE},
    PFS_BLKN_BITMAP, PFS_BLKN_FREE, PFS_BLKN_INODE, PFS_BLKN_SUPER,
};
use crate::{
    block::{BlockBuf, BlockDevice, BLOCK_SZ},
    error::{FsError, FsResult},
    fs::{
        fs::{FileSystem, FileSystemType},
        inode::{Inode, InodeInfo, InodeManager, InodeOps, InodeType},
    },
};

/// super block and free map, written back together
struct PfsMeta {
    sb:      SuperBlock,
    freemap: Bitmap,
    /// true if super/freemap modified
    dirty:   bool,
}

pub struct PfsFileSystem {
    dev:      Arc<dyn BlockDevice>,
    meta:     Mutex<PfsMeta>,
    inodes:   Mutex<InodeManager>,
    dir_ops:  Arc<dyn InodeOps>,
    file_ops: Arc<dyn InodeOps>,
}

impl PfsFileSystem {
    /// Format `dev` and return the mounted filesystem
    pub fn format(dev: Arc<dyn BlockDevice>) -> FsResult<Arc<Self>> {
        if dev.block_size() != BLOCK_SZ {
            return Err(FsError::InvalidArgument);
        }
        let sb = SuperBlock::for_device(dev.num_blocks())?;
        let mut freemap = Bitmap::new(sb.nblocks as usize);
        // the first data block is used for root directory
        freemap.set(0);
        let fs = Arc::new_cyclic(|me: &Weak<PfsFileSystem>| Self {
            dev,
            meta: Mutex::new(PfsMeta {
                sb,
                freemap,
                dirty: true,
            }),
            inodes: Mutex::new(InodeManager::new()),
            dir_ops: Arc::new(PfsDirOps::new(me.clone())),
            file_ops: Arc::new(PfsFileOps::new(me.clone())),
        });
        fs.sync_meta()?;

        let mut block = BlockBuf::new();
        // root directory disk inode
        let mut root = DiskInode::new(InodeType::Directory);
        root.size = DIRENT_SZ as u32;
        root.nlinks = 1;
        root.blocks = 1;
        root.direct[0] = PFS_BLKN_FREE as u32;
        fs.store_dinode(PFS_BLKN_INODE, &root)?;
        // other disk inodes
        for ino in sb.inode_range().skip(1) {
            fs.store_dinode(ino, &DiskInode::free())?;
        }
        // root directory block
        block.fill(0);
        block.as_bytes_mut()[..DIRENT_SZ]
            .copy_from_slice(DirEntry::new("/", PFS_BLKN_INODE)?.as_bytes());
        fs.write_block(PFS_BLKN_FREE, &block)?;
        info!(
            "PFS: formatted device {}: {} blocks, {} data blocks, {} inodes",
            fs.dev.device_id(),
            sb.size,
            sb.nblocks,
            sb.ninodes
        );
        Ok(fs)
    }

    pub fn device(&self) -> Arc<dyn BlockDevice> {
        Arc::clone(&self.dev)
    }

    pub fn super_block(&self) -> SuperBlock {
        self.meta.lock().sb
    }

    fn read_block(&self, blkno: usize, block: &mut BlockBuf) -> FsResult<()> {
        self.dev.read_block(blkno, block.as_bytes_mut())
    }

    fn write_block(&self, blkno: usize, block: &BlockBuf) -> FsResult<()> {
        self.dev.write_block(blkno, block.as_bytes())
    }

    /// Write super block and bitmap back if either changed
    pub fn sync_meta(&self) -> FsResult<()> {
        let mut meta = self.meta.lock();
        if !meta.dirty {
            return Ok(());
        }
        let mut block = BlockBuf::new();
        block.modify(0, |sb: &mut SuperBlock| *sb = meta.sb);
        self.write_block(PFS_BLKN_SUPER, &block)?;
        meta.freemap.store(&mut block);
        self.write_block(PFS_BLKN_BITMAP, &block)?;
        meta.dirty = false;
        Ok(())
    }

    /// Read the disk inode stored in inode-table block `ino`
    pub fn load_dinode(&self, ino: usize) -> FsResult<DiskInode> {
        if !self.super_block().inode_range().contains(&ino) {
            return Err(FsError::BadBlock);
        }
        let mut block = BlockBuf::new();
        self.read_block(ino, &mut block)?;
        Ok(block.read(0, |din: &DiskInode| *din))
    }

    pub fn store_dinode(&self, ino: usize, din: &DiskInode) -> FsResult<()> {
        if !self.super_block().inode_range().contains(&ino) {
            return Err(FsError::BadBlock);
        }
        let mut block = BlockBuf::new();
        block.modify(0, |slot: &mut DiskInode| *slot = *din);
        self.write_block(ino, &block)
    }

    /// The in-memory inode for `ino`, loaded from disk on first use
    pub fn get_inode(&self, ino: usize) -> FsResult<Arc<Inode>> {
        if let Some(inode) = self.inodes.lock().get(ino) {
            return Ok(inode);
        }
        let din = self.load_dinode(ino)?;
        let type_ = din.inode_type()?;
        let ops = match type_ {
            InodeType::Directory => Arc::clone(&self.dir_ops),
            InodeType::Regular => Arc::clone(&self.file_ops),
            _ => {
                error!("invalid pfs inode type {:?} at ino {}", type_, ino);
                return Err(FsError::Corrupted);
            }
        };
        let inode = Arc::new(Inode::new(ino, type_, InodeInfo::Disk(din), ops));
        self.inodes.lock().insert(Arc::clone(&inode));
        trace!("pfs: loaded inode {}", ino);
        Ok(inode)
    }

    /// Drop cached inodes that are no longer open
    pub fn reclaim_inodes(&self) -> usize {
        self.inodes.lock().reclaim()
    }

    /// Take the first free data block; returns its absolute block number
    pub fn alloc_block(&self) -> FsResult<usize> {
        let blkno = {
            let mut meta = self.meta.lock();
            let bit = meta.freemap.alloc().ok_or_else(|| {
                warn!("pfs: no free block now");
                FsError::NoSpace
            })?;
            meta.dirty = true;
            PFS_BLKN_FREE + bit
        };
        // new blocks read back as zeroes
        self.write_block(blkno, &BlockBuf::new())?;
        trace!("pfs: alloc block {}", blkno);
        Ok(blkno)
    }

    pub fn free_blocks(&self) -> usize {
        self.meta.lock().freemap.free_count()
    }

    /// First inode-table slot whose on-disk type is FREE
    fn alloc_dinode(&self) -> FsResult<usize> {
        for ino in self.super_block().inode_range() {
            if self.load_dinode(ino)?.is_free() {
                return Ok(ino);
            }
        }
        warn!("pfs: no free inode");
        Err(FsError::NoFreeInode)
    }

    /// Copy bytes of the node described by `din` starting at `offset`
    pub fn read_data(&self, din: &DiskInode, offset: usize, buf: &mut [u8]) -> FsResult<usize> {
        let size = din.size as usize;
        if offset >= size {
            return Ok(0);
        }
        let end = min(size, offset + buf.len());
        let mut block = BlockBuf::new();
        let mut pos = offset;
        while pos < end {
            let block_off = pos % BLOCK_SZ;
            let len = min(BLOCK_SZ - block_off, end - pos);
            self.read_block(din.block_id(pos / BLOCK_SZ)?, &mut block)?;
            buf[pos - offset..pos - offset + len]
                .copy_from_slice(&block.as_bytes()[block_off..block_off + len]);
            pos += len;
        }
        Ok(end - offset)
    }

    /// Write `buf` at `offset`, growing the node when needed.
    ///
    /// Only `din` is updated; persisting it is up to the caller. All checks
    /// happen before the first block is allocated.
    pub fn write_data(&self, din: &mut DiskInode, offset: usize, buf: &[u8]) -> FsResult<usize> {
        let size = din.size as usize;
        if offset > size {
            return Err(FsError::InvalidArgument);
        }
        let end = offset + buf.len();
        if end > PFS_MAX_FILE_SIZE {
            return Err(FsError::FileTooLarge);
        }
        let have = din.blocks as usize;
        let need = DiskInode::data_blocks(end).max(have);
        if need - have > self.free_blocks() {
            return Err(FsError::NoSpace);
        }
        for inner_id in have..need {
            din.direct[inner_id] = self.alloc_block()? as u32;
            din.blocks += 1;
        }
        let mut block = BlockBuf::new();
        let mut pos = offset;
        while pos < end {
            let blkno = din.block_id(pos / BLOCK_SZ)?;
            let block_off = pos % BLOCK_SZ;
            let len = min(BLOCK_SZ - block_off, end - pos);
            if len < BLOCK_SZ {
                self.read_block(blkno, &mut block)?;
            }
            block.as_bytes_mut()[block_off..block_off + len]
                .copy_from_slice(&buf[pos - offset..pos - offset + len]);
            self.write_block(blkno, &block)?;
            pos += len;
        }
        din.size = size.max(end) as u32;
        Ok(buf.len())
    }

    /// All entries of the directory described by `din`, in insertion order
    pub fn dir_entries(&self, din: &DiskInode) -> FsResult<Vec<DirEntry>> {
        if !din.is_dir() {
            return Err(FsError::NotDir);
        }
        let file_count = din.size as usize / DIRENT_SZ;
        let mut entries = Vec::with_capacity(file_count);
        for i in 0..file_count {
            let mut dirent = DirEntry::empty();
            if self.read_data(din, i * DIRENT_SZ, dirent.as_bytes_mut())? != DIRENT_SZ {
                return Err(FsError::Corrupted);
            }
            entries.push(dirent);
        }
        Ok(entries)
    }

    /// find the inode number of `name` in the directory described by `din`
    pub fn find_inode_id(&self, din: &DiskInode, name: &str) -> FsResult<Option<usize>> {
        Ok(self
            .dir_entries(din)?
            .iter()
            .find(|dirent| dirent.name() == name)
            .map(DirEntry::inode_number))
    }

    pub fn list_names(&self, din: &DiskInode) -> FsResult<Vec<String>> {
        Ok(self
            .dir_entries(din)?
            .iter()
            .map(|dirent| String::from(dirent.name()))
            .collect())
    }

    /// Create a node of `type_` called `name` inside directory `dir`
    pub fn create_node(&self, dir: &Inode, name: &str, type_: InodeType) -> FsResult<Arc<Inode>> {
        let mut dir_din = dir.disk_inode()?;
        if !dir_din.is_dir() {
            return Err(FsError::NotDir);
        }
        if name.contains('/') || name == "." {
            return Err(FsError::InvalidName);
        }
        // validates the name before anything is touched
        DirEntry::new(name, 0)?;
        if self.find_inode_id(&dir_din, name)?.is_some() {
            return Err(FsError::AlreadyExists);
        }
        let dir_end = dir_din.size as usize + DIRENT_SZ;
        if dir_end > PFS_MAX_FILE_SIZE {
            return Err(FsError::DirectoryFull);
        }
        let dir_grows = DiskInode::data_blocks(dir_end) > dir_din.blocks as usize;
        if self.free_blocks() < 1 + dir_grows as usize {
            return Err(FsError::NoSpace);
        }
        let ino = self.alloc_dinode()?;

        let mut din = DiskInode::new(type_);
        din.nlinks = 1;
        din.blocks = 1;
        din.direct[0] = self.alloc_block()? as u32;
        if type_ == InodeType::Directory {
            self.write_data(&mut din, 0, DirEntry::new(".", ino)?.as_bytes())?;
        }
        self.store_dinode(ino, &din)?;

        // append the entry to the parent
        let entry = DirEntry::new(name, ino)?;
        let offset = dir_din.size as usize;
        self.write_data(&mut dir_din, offset, entry.as_bytes())?;
        self.store_dinode(dir.ino(), &dir_din)?;
        dir.update_disk_inode(dir_din)?;
        self.sync_meta()?;
        debug!("pfs: created {:?} {} as inode {} in dir {}", type_, name, ino, dir.ino());
        self.get_inode(ino)
    }
}

impl FileSystem for PfsFileSystem {
    fn fs_type(&self) -> FileSystemType {
        FileSystemType::Pfs
    }

    fn root_inode(&self) -> FsResult<Arc<Inode>> {
        self.get_inode(PFS_BLKN_INODE)
    }

    fn sync(&self) -> FsResult<()> {
        self.meta.lock().dirty = true;
        self.sync_meta()
    }

    fn reclaim(&self) -> usize {
        self.reclaim_inodes()
    }
}
