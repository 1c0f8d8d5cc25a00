//! RAM-backed block device
//!
//! The whole disk is one contiguous run of page frames taken from the frame
//! pool when the device is created; block `n` lives at `n * BLOCK_SZ` inside
//! it. Every transfer is exactly one block.

use spin::Mutex;

use crate::{
    block::{BlockDevice, BLOCK_SZ},
    config::PAGE_SIZE,
    error::{FsError, FsResult},
    mm::{FramePool, FrameTracker},
};

pub struct RamDisk {
    id: usize,
    blocks: usize,
    frames: Mutex<FrameTracker>,
}

impl RamDisk {
    /// Create a RAM disk of `blocks` blocks backed by frames from `pool`
    pub fn new(id: usize, blocks: usize, pool: &FramePool) -> FsResult<Self> {
        if blocks == 0 {
            return Err(FsError::InvalidArgument);
        }
        let pages = (blocks * BLOCK_SZ + PAGE_SIZE - 1) / PAGE_SIZE;
        let frames = pool.alloc_contiguous(pages)?;
        debug!(
            "base address of RAM disk {} is: ppn {:#x}, {} blocks",
            id, frames.ppn.0, blocks
        );
        Ok(Self {
            id,
            blocks,
            frames: Mutex::new(frames),
        })
    }

    fn check(&self, block_id: usize, len: usize) -> FsResult<usize> {
        if block_id >= self.blocks {
            warn!("block number {} out of range on ramdisk {}", block_id, self.id);
            return Err(FsError::BadBlock);
        }
        if len != BLOCK_SZ {
            return Err(FsError::InvalidArgument);
        }
        Ok(block_id * BLOCK_SZ)
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> FsResult<()> {
        let start = self.check(block_id, buf.len())?;
        trace!("ramdisk {} read block {}", self.id, block_id);
        buf.copy_from_slice(&self.frames.lock().as_slice()[start..start + BLOCK_SZ]);
        Ok(())
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> FsResult<()> {
        let start = self.check(block_id, buf.len())?;
        trace!("ramdisk {} write block {}", self.id, block_id);
        self.frames.lock().as_mut_slice()[start..start + BLOCK_SZ].copy_from_slice(buf);
        Ok(())
    }

    fn num_blocks(&self) -> usize {
        self.blocks
    }

    fn device_id(&self) -> usize {
        self.id
    }
}
