//! Constants in the storage stack

#[allow(unused)]

/// page size : 4KB
pub const PAGE_SIZE: usize = 0x1000;
/// page size bits: 12
pub const PAGE_SIZE_BITS: usize = 0xc;
/// block size, one page per block
pub const BLOCK_SZ: usize = PAGE_SIZE;
/// number of blocks on every RAM disk registered at boot
pub const RAMDISK_BLOCKS: usize = 128;
/// names of the RAM disks registered at boot
pub const RAMDISK_NAMES: &[&str] = &["ramdisk0"];
/// the maximum number of devices in the mount table
pub const MAX_DEV: usize = 8;
/// the maximum length of a device name
pub const MAX_DEVNAME: usize = 64;
/// the maximum number of open files per process
pub const MAX_FILES: usize = 32;
/// pages handed to the frame pool at boot
pub const FRAME_POOL_PAGES: usize = 1024;
