//! Device drivers
pub mod block;
