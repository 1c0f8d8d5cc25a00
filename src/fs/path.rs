use alloc::{borrow::ToOwned, string::String};

/// A path as handed to `open`: `"<device>:<subpath>"`, or a host path when
/// there is no colon.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Path {
    path: String,
}

impl Path {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_owned(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// No device prefix: the host collaborator handles it
    pub fn is_host(&self) -> bool {
        !self.path.contains(':')
    }

    /// Name of the device before the first colon
    pub fn device(&self) -> Option<&str> {
        self.path.split_once(':').map(|(device, _)| device)
    }

    /// Everything after the delimiter that follows the colon.
    ///
    /// `None` for `"dev:"`, which names the raw device rather than a node of
    /// its filesystem.
    pub fn subpath(&self) -> Option<&str> {
        let (_, rest) = self.path.split_once(':')?;
        if rest.is_empty() {
            return None;
        }
        Some(rest.strip_prefix('/').unwrap_or(rest))
    }

    /// Components of the subpath, empty ones skipped
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.subpath()
            .unwrap_or("")
            .split('/')
            .filter(|name| !name.is_empty())
    }
}

impl From<&str> for Path {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Path {
    fn from(path: String) -> Self {
        Self { path }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn test_device_path() {
        let path = Path::new("ramdisk0:/dir/file");
        assert!(!path.is_host());
        assert_eq!(path.device(), Some("ramdisk0"));
        assert_eq!(path.subpath(), Some("dir/file"));
        assert_eq!(path.components().collect::<Vec<_>>(), ["dir", "file"]);
    }

    #[test]
    fn test_root_and_device_node() {
        let root = Path::new("ramdisk0:/");
        assert_eq!(root.subpath(), Some(""));
        assert_eq!(root.components().count(), 0);

        let dev = Path::new("ramdisk0:");
        assert_eq!(dev.device(), Some("ramdisk0"));
        assert_eq!(dev.subpath(), None);
    }

    #[test]
    fn test_host_path() {
        let path = Path::from("/home/user/hostfile");
        assert!(path.is_host());
        assert_eq!(path.device(), None);
        assert_eq!(path.subpath(), None);
    }

    #[test]
    fn test_redundant_slashes() {
        let path = Path::new("d://a//b/");
        assert_eq!(path.components().collect::<Vec<_>>(), ["a", "b"]);
    }
}
