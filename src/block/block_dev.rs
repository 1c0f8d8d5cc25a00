//! Block device interface.
//!
//! Define the block read-write interface [BlockDevice] that the device driver needs to implement

use alloc::boxed::Box;
use core::any::Any;

use super::BLOCK_SZ;
use crate::error::FsResult;

pub trait BlockDevice: Send + Sync + Any {
    /// Read a block from the block device.
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> FsResult<()>;
    /// Write a block to the block device.
    fn write_block(&self, block_id: usize, buf: &[u8]) -> FsResult<()>;
    /// Number of blocks on the device.
    fn num_blocks(&self) -> usize;
    /// Size of one block in bytes.
    fn block_size(&self) -> usize {
        BLOCK_SZ
    }
    /// Index of the device in the mount table.
    fn device_id(&self) -> usize;
}

/// One block worth of bytes, aligned so on-disk records can be viewed in place
#[repr(C, align(8))]
pub struct BlockBuf([u8; BLOCK_SZ]);

impl BlockBuf {
    pub fn new() -> Box<Self> {
        Box::new(Self([0; BLOCK_SZ]))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }

    pub fn fill(&mut self, byte: u8) {
        self.0.fill(byte);
    }

    #[inline]
    fn addr_of_offset(&self, offset: usize) -> usize {
        &self.0[offset] as *const _ as usize
    }

    /// View the record of type `T` stored at `offset`.
    ///
    /// `T` must be a `repr(C)` record made of plain integers.
    pub fn get_ref<T>(&self, offset: usize) -> &T
    where
        T: Sized,
    {
        let type_size = core::mem::size_of::<T>();
        assert!(offset + type_size <= BLOCK_SZ);
        assert_eq!(offset % core::mem::align_of::<T>(), 0);
        let addr = self.addr_of_offset(offset);
        unsafe { &*(addr as *const T) }
    }

    pub fn get_mut<T>(&mut self, offset: usize) -> &mut T
    where
        T: Sized,
    {
        let type_size = core::mem::size_of::<T>();
        assert!(offset + type_size <= BLOCK_SZ);
        assert_eq!(offset % core::mem::align_of::<T>(), 0);
        let addr = self.addr_of_offset(offset);
        unsafe { &mut *(addr as *mut T) }
    }

    pub fn read<T, V>(&self, offset: usize, f: impl FnOnce(&T) -> V) -> V {
        f(self.get_ref(offset))
    }

    pub fn modify<T, V>(&mut self, offset: usize, f: impl FnOnce(&mut T) -> V) -> V {
        f(self.get_mut(offset))
    }
}
