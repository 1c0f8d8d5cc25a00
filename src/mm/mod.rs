//! Memory management collaborator
//!
//! Only the page frame allocator is needed by the storage stack: RAM disks
//! take their backing store from it at registration time.

mod frame_allocator;

pub use frame_allocator::{FramePool, FrameTracker, PhysPageNum};
