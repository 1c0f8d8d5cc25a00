use alloc::{
    string::{String, ToString},
    sync::Arc,
    vec::Vec,
};

use spin::Mutex;

use super::{dev::device_inode, inode::Inode, path::Path, pfs::PFS_TYPE, OpenFlags};
use crate::{
    block::BlockDevice,
    config::{MAX_DEV, MAX_DEVNAME},
    error::{FsError, FsResult},
};

/// A filesystem mounted on one device
pub trait FileSystem: Send + Sync {
    fn fs_type(&self) -> FileSystemType;
    fn root_inode(&self) -> FsResult<Arc<Inode>>;
    /// write cached metadata back to the device
    fn sync(&self) -> FsResult<()>;
    /// drop cached inodes nobody has open; returns how many went
    fn reclaim(&self) -> usize {
        0
    }
}

/* File System Type */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum FileSystemType {
    Pfs = PFS_TYPE,
}

impl FileSystemType {
    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Pfs => "pfs",
        }
    }
}

/// Result of resolving a path
pub enum Lookup {
    /// the path names an existing node
    Found(Arc<Inode>),
    /// the last component is missing from an existing directory
    NotFound { dir: Arc<Inode>, name: String },
    /// no device prefix: the host handles the path
    Host,
}

/// What an `open` ended up with
pub enum VfsNode {
    Host,
    Inode(Arc<Inode>),
}

/* Mount Table */

pub struct MountEntry {
    name:      String,
    device:    Arc<dyn BlockDevice>,
    fs:        Option<Arc<dyn FileSystem>>,
    dev_inode: Arc<Inode>,
}

/// Registered devices and the filesystem mounted on each
pub struct MountTable {
    entries: Mutex<Vec<MountEntry>>,
}

impl MountTable {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Add a device under `name`, with no filesystem yet
    pub fn register_device(&self, name: &str, device: Arc<dyn BlockDevice>) -> FsResult<()> {
        if name.is_empty() || name.len() >= MAX_DEVNAME || name.contains(':') {
            return Err(FsError::InvalidName);
        }
        let mut entries = self.entries.lock();
        if entries.iter().any(|entry| entry.name == name) {
            return Err(FsError::DeviceExists);
        }
        if entries.len() >= MAX_DEV {
            error!("device list is full, cannot register {}", name);
            return Err(FsError::TooManyDevices);
        }
        info!(
            "register device {}: {} blocks of {} bytes",
            name,
            device.num_blocks(),
            device.block_size()
        );
        entries.push(MountEntry {
            name: name.to_string(),
            dev_inode: device_inode(name, Arc::clone(&device)),
            device,
            fs: None,
        });
        Ok(())
    }

    /// Build a filesystem on device `name` with `format` and attach it
    pub fn mount<F>(&self, name: &str, format: F) -> FsResult<()>
    where
        F: FnOnce(Arc<dyn BlockDevice>) -> FsResult<Arc<dyn FileSystem>>,
    {
        let device = self.device(name)?;
        let fs = format(device)?;
        let mut entries = self.entries.lock();
        let entry = entries
            .iter_mut()
            .find(|entry| entry.name == name)
            .ok_or(FsError::NoDevice)?;
        info!("mounted {} on device {}", fs.fs_type().to_str(), name);
        entry.fs = Some(fs);
        Ok(())
    }

    pub fn device(&self, name: &str) -> FsResult<Arc<dyn BlockDevice>> {
        self.entries
            .lock()
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| Arc::clone(&entry.device))
            .ok_or(FsError::NoDevice)
    }

    /// Filesystem mounted on device `name`
    pub fn get_fs(&self, name: &str) -> FsResult<Arc<dyn FileSystem>> {
        let entries = self.entries.lock();
        let entry = entries
            .iter()
            .find(|entry| entry.name == name)
            .ok_or(FsError::NoDevice)?;
        entry.fs.clone().ok_or(FsError::NotMounted)
    }

    pub fn get_root(&self, name: &str) -> FsResult<Arc<Inode>> {
        self.get_fs(name)?.root_inode()
    }

    fn device_node(&self, name: &str) -> FsResult<Arc<Inode>> {
        self.entries
            .lock()
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| Arc::clone(&entry.dev_inode))
            .ok_or(FsError::NoDevice)
    }

    /// names of all registered devices, in registration order
    pub fn device_names(&self) -> Vec<String> {
        self.entries.lock().iter().map(|entry| entry.name.clone()).collect()
    }

    /// Resolve `path` down to a node, walking one directory per component
    pub fn resolve(&self, path: &Path) -> FsResult<Lookup> {
        let device = match path.device() {
            Some(device) => device,
            None => return Ok(Lookup::Host),
        };
        if path.subpath().is_none() {
            return Ok(Lookup::Found(self.device_node(device)?));
        }
        let mut current = self.get_root(device)?;
        let mut components = path.components().peekable();
        while let Some(name) = components.next() {
            match current.lookup(name)? {
                Some(inode) => current = inode,
                None if components.peek().is_none() => {
                    return Ok(Lookup::NotFound {
                        dir:  current,
                        name: name.to_string(),
                    });
                }
                None => return Err(FsError::NotFound),
            }
        }
        Ok(Lookup::Found(current))
    }

    /// Resolve `path` and take a reference on the node, creating a regular
    /// file when it is missing and `flags` ask for it
    pub fn open(&self, path: &Path, flags: OpenFlags) -> FsResult<VfsNode> {
        let inode = match self.resolve(path)? {
            Lookup::Host => return Ok(VfsNode::Host),
            Lookup::Found(inode) => inode,
            Lookup::NotFound { dir, name } => {
                if !flags.contains(OpenFlags::CREATE) {
                    debug!("open {}: not found", path.as_str());
                    return Err(FsError::NotFound);
                }
                debug!("open {}: create {} in dir {}", path.as_str(), name, dir.ino());
                dir.create(&name)?
            }
        };
        let (_, writable) = flags.read_write()?;
        if writable && inode.is_dir() {
            return Err(FsError::IsDir);
        }
        inode.acquire();
        debug!("open {}: inode {} ref {}", path.as_str(), inode.ino(), inode.ref_count());
        Ok(VfsNode::Inode(inode))
    }

    /// Drop the reference taken by [`MountTable::open`]
    pub fn close(&self, inode: &Inode) -> usize {
        inode.release()
    }

    /// Sync every mounted filesystem
    pub fn sync(&self) -> FsResult<()> {
        for fs in self.mounted() {
            fs.sync()?;
        }
        Ok(())
    }

    /// Reclaim unused inodes on every mounted filesystem
    pub fn reclaim(&self) -> usize {
        self.mounted().iter().map(|fs| fs.reclaim()).sum()
    }

    fn mounted(&self) -> Vec<Arc<dyn FileSystem>> {
        self.entries
            .lock()
            .iter()
            .filter_map(|entry| entry.fs.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        block::BLOCK_SZ,
        drivers::block::RamDisk,
        fs::{inode::InodeType, pfs::pfs_do_mount},
        mm::FramePool,
    };

    fn table_with(names: &[&str]) -> MountTable {
        let pool = FramePool::new(1024);
        let table = MountTable::new();
        for (id, name) in names.iter().enumerate() {
            let disk = Arc::new(RamDisk::new(id, 64, &pool).unwrap());
            table.register_device(name, disk).unwrap();
        }
        table
    }

    #[test]
    fn test_register() {
        let table = table_with(&["d0", "d1"]);
        assert_eq!(table.device_names(), ["d0", "d1"]);
        let pool = FramePool::new(64);
        let disk = Arc::new(RamDisk::new(9, 4, &pool).unwrap());
        assert_eq!(table.register_device("d0", disk.clone()), Err(FsError::DeviceExists));
        assert_eq!(table.register_device("", disk.clone()), Err(FsError::InvalidName));
        assert_eq!(table.register_device("D0", disk), Ok(()));
        assert_eq!(table.device("nope").err(), Some(FsError::NoDevice));
    }

    #[test]
    fn test_device_list_full() {
        let pool = FramePool::new(64);
        let table = MountTable::new();
        for i in 0..MAX_DEV {
            let disk = Arc::new(RamDisk::new(i, 1, &pool).unwrap());
            table.register_device(&alloc::format!("d{}", i), disk).unwrap();
        }
        let disk = Arc::new(RamDisk::new(MAX_DEV, 1, &pool).unwrap());
        assert_eq!(table.register_device("extra", disk), Err(FsError::TooManyDevices));
    }

    #[test]
    fn test_mount_and_resolve() {
        let table = table_with(&["d0"]);
        assert_eq!(table.get_root("d0").err(), Some(FsError::NotMounted));
        assert_eq!(table.mount("d9", pfs_do_mount).err(), Some(FsError::NoDevice));
        table.mount("d0", pfs_do_mount).unwrap();
        assert_eq!(table.get_fs("d0").unwrap().fs_type(), FileSystemType::Pfs);

        let root = match table.resolve(&Path::new("d0:/")).unwrap() {
            Lookup::Found(inode) => inode,
            _ => panic!("root not found"),
        };
        assert!(root.is_dir());
        match table.resolve(&Path::new("d0:/missing")).unwrap() {
            Lookup::NotFound { dir, name } => {
                assert_eq!(dir.ino(), root.ino());
                assert_eq!(name, "missing");
            }
            _ => panic!("expected a creatable miss"),
        }
        assert!(matches!(table.resolve(&Path::new("hostfile")).unwrap(), Lookup::Host));
        assert_eq!(
            table.resolve(&Path::new("d0:/no/such")).err(),
            Some(FsError::NotFound)
        );
        assert_eq!(table.resolve(&Path::new("d1:/")).err(), Some(FsError::NoDevice));
    }

    #[test]
    fn test_resolve_device_node() {
        let table = table_with(&["d0"]);
        match table.resolve(&Path::new("d0:")).unwrap() {
            Lookup::Found(inode) => {
                assert_eq!(inode.inode_type(), InodeType::Device);
                assert_eq!(inode.fstat().unwrap().st_size, 64 * BLOCK_SZ);
            }
            _ => panic!("device node not found"),
        }
    }

    #[test]
    fn test_open_creates() {
        let table = table_with(&["d0"]);
        table.mount("d0", pfs_do_mount).unwrap();
        let path = Path::new("d0:/sub/file");
        table.get_root("d0").unwrap().mkdir("sub").unwrap();

        assert_eq!(table.open(&path, OpenFlags::RDONLY).err(), Some(FsError::NotFound));
        let inode = match table.open(&path, OpenFlags::RDWR | OpenFlags::CREATE).unwrap() {
            VfsNode::Inode(inode) => inode,
            VfsNode::Host => panic!("not a host path"),
        };
        assert_eq!(inode.ref_count(), 1);
        assert!(inode.fstat().unwrap().is_file());
        // reopen shares the cached inode
        match table.open(&path, OpenFlags::RDONLY).unwrap() {
            VfsNode::Inode(again) => assert!(Arc::ptr_eq(&inode, &again)),
            VfsNode::Host => panic!("not a host path"),
        }
        assert_eq!(inode.ref_count(), 2);
        assert_eq!(table.close(&inode), 1);
        assert_eq!(table.close(&inode), 0);

        assert_eq!(
            table.open(&Path::new("d0:/sub"), OpenFlags::WRONLY).err(),
            Some(FsError::IsDir)
        );
    }

    #[test]
    fn test_reclaim_after_close() {
        let table = table_with(&["d0"]);
        table.mount("d0", pfs_do_mount).unwrap();
        let path = Path::new("d0:/f");
        if let VfsNode::Inode(inode) = table.open(&path, OpenFlags::CREATE).unwrap() {
            table.reclaim();
            // an open inode survives reclaim
            match table.resolve(&path).unwrap() {
                Lookup::Found(again) => assert!(Arc::ptr_eq(&inode, &again)),
                _ => panic!("open file vanished"),
            }
            table.close(&inode);
        }
        assert!(table.reclaim() >= 1);
    }
}
