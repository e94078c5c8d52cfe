//! # Transport Module
//!
//! Access to the remote file store (the phone).
//!
//! ## Contract
//! - `list_remote_entries` returns names in whatever order the device reports
//! - `pull` is best-effort; callers check the destination file exists
//!   afterwards instead of trusting the result
//! - `delete_remote` is fire-and-forget; nothing verifies the remote side
//!
//! ## Backends
//! - `AdbTransport` - Android Debug Bridge over USB
//! - `DirectoryTransport` - A mounted folder (MTP, card reader, tests)

mod adb;
mod directory;

pub use adb::{AdbTransport, DEFAULT_REMOTE_DIR};
pub use directory::DirectoryTransport;

use crate::error::TransportError;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::Path;

/// An entry enumerated from the remote store. Re-listed every run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteFile {
    pub name: String,
}

impl RemoteFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Basename to use locally. `None` for names such as `..` that do not
    /// end in a normal path component.
    pub fn local_name(&self) -> Option<&OsStr> {
        Path::new(&self.name).file_name()
    }
}

impl std::fmt::Display for RemoteFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Trait for remote stores
///
/// Implement this trait to support other devices (or to script failures in
/// tests).
pub trait RemoteTransport: Send + Sync {
    /// Whether a device is reachable
    fn is_connected(&self) -> Result<bool, TransportError>;

    /// Enumerate the remote folder. Failure aborts the run.
    fn list_remote_entries(&self) -> Result<Vec<RemoteFile>, TransportError>;

    /// Copy a remote file to `local_dest`.
    fn pull(&self, file: &RemoteFile, local_dest: &Path) -> Result<(), TransportError>;

    /// Remove a file from the remote store.
    fn delete_remote(&self, file: &RemoteFile) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_name_strips_directories() {
        let file = RemoteFile::new("sub/IMG_0001.jpg");
        assert_eq!(file.local_name(), Some(OsStr::new("IMG_0001.jpg")));
    }

    #[test]
    fn local_name_rejects_parent_reference() {
        assert_eq!(RemoteFile::new("..").local_name(), None);
        assert_eq!(RemoteFile::new("").local_name(), None);
    }
}
