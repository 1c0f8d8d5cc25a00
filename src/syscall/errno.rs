//! errno values returned by the file syscalls, already negated

/// Operation not permitted
pub const EPERM: isize = -1;
/// No such file or directory
pub const ENOENT: isize = -2;
/// I/O error
pub const EIO: isize = -5;
/// Bad file number
pub const EBADF: isize = -9;
/// Out of memory
pub const ENOMEM: isize = -12;
/// Permission denied
pub const EACCES: isize = -13;
/// File exists
pub const EEXIST: isize = -17;
/// No such device
pub const ENODEV: isize = -19;
/// Not a directory
pub const ENOTDIR: isize = -20;
/// Is a directory
pub const EISDIR: isize = -21;
/// Invalid argument
pub const EINVAL: isize = -22;
/// Too many open files
pub const EMFILE: isize = -24;
/// File too large
pub const EFBIG: isize = -27;
/// No space left on device
pub const ENOSPC: isize = -28;
/// Function not implemented
pub const ENOSYS: isize = -38;
