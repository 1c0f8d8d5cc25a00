//! Block device interface
pub mod block_dev;

pub use block_dev::{BlockBuf, BlockDevice};

/// Block size in bytes
pub use crate::config::BLOCK_SZ;
