//! Error type shared by every layer of the storage stack
//!
//! Every condition that used to halt the whole kernel is reported as an
//! [`FsError`] instead, so a misbehaving process only sees a failed call.
//! A name that is missing during lookup is not an error at all: see
//! [`Lookup::NotFound`](crate::fs::Lookup::NotFound).

use core::fmt;

use crate::syscall::errno::*;

/// Result alias used across the crate
pub type FsResult<T> = Result<T, FsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// block number outside `[0, block_count)`
    BadBlock,
    /// descriptor is not open in this table
    BadFd,
    /// buffer length or position the operation cannot honour
    InvalidArgument,
    /// no free data block left in the bitmap
    NoSpace,
    /// no FREE slot left in the inode table
    NoFreeInode,
    /// the per-process open-file table is full
    TooManyFiles,
    /// the mount table is full
    TooManyDevices,
    /// the frame pool cannot satisfy the request
    NoMemory,
    /// a file would grow past its direct blocks
    FileTooLarge,
    /// a directory would grow past its direct blocks
    DirectoryFull,
    /// the path names nothing and creation was not requested
    NotFound,
    /// the name already exists in the directory
    AlreadyExists,
    /// no device is registered under that name
    NoDevice,
    /// a device with that name is already registered
    DeviceExists,
    /// the device carries no filesystem
    NotMounted,
    /// the device cannot hold the filesystem layout
    DeviceTooSmall,
    /// directory operation on a non-directory
    NotDir,
    /// file operation on a directory
    IsDir,
    /// the descriptor lacks the requested permission
    PermissionDenied,
    /// name is empty, contains `/`, or is too long
    InvalidName,
    /// the node does not provide this operation
    NotSupported,
    /// on-disk data does not match the layout
    Corrupted,
    /// the host collaborator reported a failure
    HostIo,
}

/// The four failure families of the storage stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// bad block number or bad descriptor
    Range,
    /// no free block, inode, descriptor, device slot or memory
    Exhaustion,
    /// the caller asked for something the rules forbid
    Policy,
    /// the disk or host does not look like it should
    Corruption,
}

impl FsError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::BadBlock | Self::BadFd => ErrorCategory::Range,
            Self::NoSpace
            | Self::NoFreeInode
            | Self::TooManyFiles
            | Self::TooManyDevices
            | Self::NoMemory
            | Self::FileTooLarge
            | Self::DirectoryFull => ErrorCategory::Exhaustion,
            Self::Corrupted | Self::HostIo => ErrorCategory::Corruption,
            _ => ErrorCategory::Policy,
        }
    }

    /// negative errno handed back to user space
    pub fn errno(&self) -> isize {
        match self {
            Self::BadBlock | Self::InvalidArgument | Self::InvalidName => EINVAL,
            Self::BadFd => EBADF,
            Self::NoSpace | Self::NoFreeInode | Self::DirectoryFull => ENOSPC,
            Self::TooManyFiles => EMFILE,
            Self::TooManyDevices | Self::NoMemory => ENOMEM,
            Self::FileTooLarge => EFBIG,
            Self::NotFound => ENOENT,
            Self::AlreadyExists | Self::DeviceExists => EEXIST,
            Self::NoDevice | Self::NotMounted | Self::DeviceTooSmall => ENODEV,
            Self::NotDir => ENOTDIR,
            Self::IsDir => EISDIR,
            Self::PermissionDenied => EACCES,
            Self::NotSupported => ENOSYS,
            Self::Corrupted | Self::HostIo => EIO,
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::BadBlock => "block number out of range",
            Self::BadFd => "bad file descriptor",
            Self::InvalidArgument => "invalid argument",
            Self::NoSpace => "no free block",
            Self::NoFreeInode => "no free inode",
            Self::TooManyFiles => "no free file entry for current process",
            Self::TooManyDevices => "device list is full",
            Self::NoMemory => "out of page frames",
            Self::FileTooLarge => "file too large",
            Self::DirectoryFull => "directory is full",
            Self::NotFound => "open a non-existent-uncreatable file",
            Self::AlreadyExists => "file exists",
            Self::NoDevice => "cannot find the device entry",
            Self::DeviceExists => "device already registered",
            Self::NotMounted => "no file system mounted on device",
            Self::DeviceTooSmall => "device too small for the file system",
            Self::NotDir => "not a directory",
            Self::IsDir => "is a directory",
            Self::PermissionDenied => "permission denied",
            Self::InvalidName => "invalid file name",
            Self::NotSupported => "operation not supported",
            Self::Corrupted => "corrupted file system",
            Self::HostIo => "host file I/O failed",
        };
        f.write_str(msg)
    }
}
