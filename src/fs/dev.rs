//! Raw device nodes
//!
//! `"<dev>:"` opens the block device itself. Byte ranges map straight onto
//! blocks; a partial block is read, patched and written back.

use alloc::sync::Arc;
use core::cmp::min;

use super::inode::{DeviceInfo, Inode, InodeInfo, InodeOps, InodeType, Stat};
use crate::{
    block::{BlockBuf, BlockDevice, BLOCK_SZ},
    error::{FsError, FsResult},
};

/// inode number of every device node
pub const DEV_INO: usize = 0;

pub struct DevOps;

/// Build the device node of a registered device
pub fn device_inode(name: &str, device: Arc<dyn BlockDevice>) -> Arc<Inode> {
    let info = DeviceInfo {
        name: name.into(),
        device,
    };
    Arc::new(Inode::new(
        DEV_INO,
        InodeType::Device,
        InodeInfo::Device(info),
        Arc::new(DevOps),
    ))
}

fn device_size(dev: &dyn BlockDevice) -> usize {
    dev.num_blocks() * BLOCK_SZ
}

impl InodeOps for DevOps {
    fn read_at(&self, inode: &Inode, offset: usize, buf: &mut [u8]) -> FsResult<usize> {
        let dev = inode.device_info()?.device;
        let end = min(device_size(dev.as_ref()), offset + buf.len());
        if offset >= end {
            return Ok(0);
        }
        let mut block = BlockBuf::new();
        let mut pos = offset;
        while pos < end {
            let block_off = pos % BLOCK_SZ;
            let len = min(BLOCK_SZ - block_off, end - pos);
            dev.read_block(pos / BLOCK_SZ, block.as_bytes_mut())?;
            buf[pos - offset..pos - offset + len]
                .copy_from_slice(&block.as_bytes()[block_off..block_off + len]);
            pos += len;
        }
        Ok(end - offset)
    }

    fn write_at(&self, inode: &Inode, offset: usize, buf: &[u8]) -> FsResult<usize> {
        let dev = inode.device_info()?.device;
        let end = offset + buf.len();
        if end > device_size(dev.as_ref()) {
            return Err(FsError::NoSpace);
        }
        let mut block = BlockBuf::new();
        let mut pos = offset;
        while pos < end {
            let blkno = pos / BLOCK_SZ;
            let block_off = pos % BLOCK_SZ;
            let len = min(BLOCK_SZ - block_off, end - pos);
            if len < BLOCK_SZ {
                dev.read_block(blkno, block.as_bytes_mut())?;
            }
            block.as_bytes_mut()[block_off..block_off + len]
                .copy_from_slice(&buf[pos - offset..pos - offset + len]);
            dev.write_block(blkno, block.as_bytes())?;
            pos += len;
        }
        Ok(buf.len())
    }

    fn fstat(&self, inode: &Inode) -> FsResult<Stat> {
        let dev = inode.device_info()?.device;
        Ok(Stat {
            st_mode:   InodeType::Device,
            st_nlinks: 1,
            st_blocks: dev.num_blocks(),
            st_size:   device_size(dev.as_ref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{drivers::block::RamDisk, mm::FramePool};

    fn dev_node(blocks: usize) -> Arc<Inode> {
        let pool = FramePool::new(64);
        device_inode("disk", Arc::new(RamDisk::new(0, blocks, &pool).unwrap()))
    }

    #[test]
    fn test_stat() {
        let node = dev_node(4);
        let stat = node.fstat().unwrap();
        assert_eq!(stat.st_mode, InodeType::Device);
        assert_eq!(stat.st_blocks, 4);
        assert_eq!(stat.st_size, 4 * BLOCK_SZ);
        assert_eq!(node.device_info().unwrap().name, "disk");
    }

    #[test]
    fn test_unaligned_across_blocks() {
        let node = dev_node(4);
        let payload = [0x5au8; 100];
        let offset = BLOCK_SZ - 40;
        assert_eq!(node.write_at(offset, &payload).unwrap(), 100);
        let mut buf = [0u8; 120];
        assert_eq!(node.read_at(offset - 10, &mut buf).unwrap(), 120);
        assert!(buf[..10].iter().all(|b| *b == 0));
        assert!(buf[10..110].iter().all(|b| *b == 0x5a));
        assert!(buf[110..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_bounds() {
        let node = dev_node(2);
        let mut buf = [0u8; 16];
        assert_eq!(node.read_at(2 * BLOCK_SZ, &mut buf).unwrap(), 0);
        assert_eq!(node.read_at(2 * BLOCK_SZ - 4, &mut buf).unwrap(), 4);
        assert_eq!(node.write_at(2 * BLOCK_SZ - 4, &buf), Err(FsError::NoSpace));
        assert_eq!(node.lookup("x").err(), Some(FsError::NotDir));
    }
}
