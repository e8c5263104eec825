//! Interface discovery.
//!
//! Lists the network devices the kernel exposes under `/sys/devices/virtual/net` (veths,
//! bridges, loopback...), filtered by substring. The controller never enumerates interfaces on
//! its own: callers discover names here and hand them over one at a time.

use std::{
    io,
    path::{Path, PathBuf},
};

/// Where the kernel lists virtual network devices.
pub const VIRTUAL_NET_PATH: &str = "/sys/devices/virtual/net";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to list {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// A source of interface names.
pub trait Discovery {
    /// The interface names containing `filter`, in discovery order. An empty filter matches
    /// every interface.
    fn interfaces(&self, filter: &str) -> Result<Vec<String>>;
}

/// [`Discovery`] over a sysfs-style directory, one entry per device.
#[derive(Debug, Clone)]
pub struct SysfsDiscovery {
    root: PathBuf,
}

impl Default for SysfsDiscovery {
    fn default() -> Self {
        Self { root: PathBuf::from(VIRTUAL_NET_PATH) }
    }
}

impl SysfsDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discover devices listed under `root` instead of [`VIRTUAL_NET_PATH`].
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Discovery for SysfsDiscovery {
    /// Names are returned sorted, so that repeated calls yield a stable order.
    fn interfaces(&self, filter: &str) -> Result<Vec<String>> {
        let read_dir_err = |source| Error::ReadDir { path: self.root.clone(), source };

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root).map_err(read_dir_err)? {
            let entry = entry.map_err(read_dir_err)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.contains(filter) {
                names.push(name);
            }
        }
        names.sort();

        tracing::debug!(root = %self.root.display(), filter, ?names, "discovered interfaces");

        Ok(names)
    }
}
