//! block device drivers

mod ram_disk;

pub use ram_disk::RamDisk;
