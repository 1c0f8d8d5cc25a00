//! File syscalls
//!
//! Each call is its own function named `sys_` then the name of the syscall.
//! They work on the calling process's [`FdTable`](crate::fs::FdTable) and
//! report failure as a negative errno, success as a value `>= 0`.

pub mod errno;
mod fs;

pub use fs::*;
