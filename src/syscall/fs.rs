use crate::{
    error::FsResult,
    fs::{FdTable, OpenFlags, Stat},
    syscall::errno::{EINVAL, ENOSYS},
};

/// whence for [`sys_lseek`]: from the start of the file
pub const SEEK_SET: usize = 0;
/// whence for [`sys_lseek`]: from the current offset
pub const SEEK_CUR: usize = 1;
/// whence for [`sys_lseek`]: from the end of the file
pub const SEEK_END: usize = 2;

fn ret(result: FsResult<usize>) -> isize {
    match result {
        Ok(value) => value as isize,
        Err(err) => {
            debug!("syscall failed: {}", err);
            err.errno()
        }
    }
}

/// open syscall
pub fn sys_open(table: &mut FdTable, path: &str, flags: u32) -> isize {
    trace!("kernel: sys_open path: {} flags: {:#x}", path, flags);
    let flags = match OpenFlags::from_bits(flags) {
        Some(flags) => flags,
        None => return EINVAL,
    };
    ret(table.open(path, flags))
}

/// read syscall
pub fn sys_read(table: &mut FdTable, fd: usize, buf: &mut [u8]) -> isize {
    trace!("kernel: sys_read fd:{} len:{}", fd, buf.len());
    ret(table.read(fd, buf))
}

/// write syscall
pub fn sys_write(table: &mut FdTable, fd: usize, buf: &[u8]) -> isize {
    trace!("kernel: sys_write fd:{} len:{}", fd, buf.len());
    ret(table.write(fd, buf))
}

/// close syscall
pub fn sys_close(table: &mut FdTable, fd: usize) -> isize {
    trace!("kernel: sys_close fd:{}", fd);
    ret(table.close(fd).map(|_| 0))
}

/// fstat syscall
pub fn sys_fstat(table: &FdTable, fd: usize, st: &mut Stat) -> isize {
    trace!("kernel: sys_fstat fd:{}", fd);
    ret(table.fstat(fd).map(|stat| {
        *st = stat;
        0
    }))
}

/// lseek syscall
pub fn sys_lseek(table: &mut FdTable, fd: usize, offset: isize, whence: usize) -> isize {
    trace!("kernel: sys_lseek fd:{} offset:{} whence:{}", fd, offset, whence);
    let base = match whence {
        SEEK_SET => 0,
        SEEK_CUR => match table.get(fd) {
            Ok(file) => file.offset(),
            Err(err) => return err.errno(),
        },
        SEEK_END => match table.fstat(fd) {
            Ok(stat) => stat.st_size,
            Err(err) => return err.errno(),
        },
        _ => return ENOSYS,
    };
    match base.checked_add_signed(offset) {
        Some(pos) => ret(table.seek(fd, pos)),
        None => EINVAL,
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use super::*;
    use crate::{
        fs::{self, InodeType, NoHost},
        mm::FramePool,
        syscall::errno::{EACCES, EBADF, ENOENT},
    };

    fn fd_table() -> FdTable {
        let pool = FramePool::new(1024);
        FdTable::new(Arc::new(fs::init(&pool, Arc::new(NoHost)).unwrap()))
    }

    const CREATE_RDWR: u32 = (1 << 6) | (1 << 1);

    #[test]
    fn test_errno_results() {
        let mut table = fd_table();
        assert_eq!(sys_open(&mut table, "ramdisk0:/none", 0), ENOENT);
        assert_eq!(sys_open(&mut table, "ramdisk0:/x", 1 << 30), EINVAL);
        assert_eq!(sys_close(&mut table, 5), EBADF);

        let fd = sys_open(&mut table, "ramdisk0:/ro", CREATE_RDWR);
        assert_eq!(fd, 0);
        assert_eq!(sys_close(&mut table, 0), 0);
        let fd = sys_open(&mut table, "ramdisk0:/ro", 0) as usize;
        assert_eq!(sys_write(&mut table, fd, b"x"), EACCES);
    }

    #[test]
    fn test_fstat_and_lseek() {
        let mut table = fd_table();
        let fd = sys_open(&mut table, "ramdisk0:/f", CREATE_RDWR) as usize;
        assert_eq!(sys_write(&mut table, fd, b"0123456789"), 10);

        let mut st = Stat {
            st_mode:   InodeType::Free,
            st_nlinks: 0,
            st_blocks: 0,
            st_size:   0,
        };
        assert_eq!(sys_fstat(&table, fd, &mut st), 0);
        assert_eq!(st.st_mode, InodeType::Regular);
        assert_eq!(st.st_size, 10);

        assert_eq!(sys_lseek(&mut table, fd, -4, SEEK_END), 6);
        assert_eq!(sys_lseek(&mut table, fd, -2, SEEK_CUR), 4);
        let mut buf = [0u8; 3];
        assert_eq!(sys_read(&mut table, fd, &mut buf), 3);
        assert_eq!(&buf, b"456");
        assert_eq!(sys_lseek(&mut table, fd, -1, SEEK_SET), EINVAL);
        assert_eq!(sys_lseek(&mut table, fd, 0, 7), ENOSYS);
    }
}
