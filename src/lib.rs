//! Storage stack of a small teaching kernel
//!
//! Three layers, bottom up:
//!
//! - [`block`] and [`drivers`]: fixed-size block devices, RAM-backed at boot
//! - [`fs`]: the mount table, path resolution, inodes and the open-file table
//! - [`fs::pfs`]: the on-disk filesystem formatted onto each device
//!
//! [`fs::init`] registers the configured RAM disks and mounts PFS on each;
//! [`syscall`] exposes the file calls the way a kernel's syscall layer
//! returns them.

#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate log;

extern crate alloc;

#[macro_use]
extern crate bitflags;

pub mod block;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fs;
pub mod logging;
pub mod mm;
pub mod syscall;

pub use error::{ErrorCategory, FsError, FsResult};
