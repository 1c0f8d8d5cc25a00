//! Page frame allocator
//!
//! The storage stack only needs "give me N zeroed pages" and "take them
//! back". Frame numbers are managed by a buddy allocator; the bytes behind a
//! run of frames live in its [`FrameTracker`], which hands the frames back to
//! the pool when dropped.

use alloc::{sync::Arc, vec, vec::Vec};
use core::fmt::{self, Debug, Formatter};

use buddy_system_allocator::FrameAllocator;
use spin::Mutex;

use crate::{
    config::PAGE_SIZE,
    error::{FsError, FsResult},
};

/// physical page number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PhysPageNum(pub usize);

/// A pool of page frames
#[derive(Clone)]
pub struct FramePool {
    inner: Arc<Mutex<FrameAllocator>>,
}

impl FramePool {
    /// Create a pool owning frames `[0, pages)`
    pub fn new(pages: usize) -> Self {
        let mut allocator = FrameAllocator::new();
        allocator.add_frame(0, pages);
        debug!("frame pool initialized with {} pages", pages);
        Self {
            inner: Arc::new(Mutex::new(allocator)),
        }
    }

    /// Allocate one zeroed page
    pub fn alloc_zeroed_page(&self) -> FsResult<FrameTracker> {
        self.alloc_contiguous(1)
    }

    /// Allocate `num` contiguous zeroed pages
    pub fn alloc_contiguous(&self, num: usize) -> FsResult<FrameTracker> {
        if num == 0 {
            return Err(FsError::InvalidArgument);
        }
        let start = self.inner.lock().alloc(num).ok_or_else(|| {
            error!("FrameAllocator out of memory! want {} pages", num);
            FsError::NoMemory
        })?;
        trace!("alloc {} pages at ppn={:#x}", num, start);
        Ok(FrameTracker {
            ppn: PhysPageNum(start),
            num,
            bytes: vec![0u8; num * PAGE_SIZE],
            pool: Arc::clone(&self.inner),
        })
    }
}

/// tracker for a run of contiguous page frames
pub struct FrameTracker {
    /// first physical page number of the run
    pub ppn: PhysPageNum,
    num: usize,
    bytes: Vec<u8>,
    pool: Arc<Mutex<FrameAllocator>>,
}

impl FrameTracker {
    /// number of pages in the run
    pub fn pages(&self) -> usize {
        self.num
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl Debug for FrameTracker {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!(
            "FrameTracker:PPN={:#x} pages={}",
            self.ppn.0, self.num
        ))
    }
}

impl Drop for FrameTracker {
    fn drop(&mut self) {
        trace!("dealloc {} pages at ppn={:#x}", self.num, self.ppn.0);
        self.pool.lock().dealloc(self.ppn.0, self.num);
    }
}
