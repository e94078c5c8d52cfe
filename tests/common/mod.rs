//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use dcim_archiver::core::transport::{DirectoryTransport, RemoteFile, RemoteTransport};
use dcim_archiver::error::TransportError;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A folder-backed device that can be told to misbehave
pub struct ScriptedDevice {
    inner: DirectoryTransport,
    failing_pulls: HashSet<String>,
    refused_deletes: HashSet<String>,
    pub pulls: Mutex<Vec<String>>,
    pub deletes: Mutex<Vec<String>>,
}

impl ScriptedDevice {
    pub fn new(root: &Path) -> Self {
        Self {
            inner: DirectoryTransport::new(root),
            failing_pulls: HashSet::new(),
            refused_deletes: HashSet::new(),
            pulls: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
        }
    }

    /// Pulls of `name` report success but leave no file behind
    pub fn fail_pull(mut self, name: &str) -> Self {
        self.failing_pulls.insert(name.to_string());
        self
    }

    pub fn refuse_delete(mut self, name: &str) -> Self {
        self.refused_deletes.insert(name.to_string());
        self
    }

    pub fn pull_count(&self) -> usize {
        self.pulls.lock().unwrap().len()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

impl RemoteTransport for ScriptedDevice {
    fn is_connected(&self) -> Result<bool, TransportError> {
        self.inner.is_connected()
    }

    fn list_remote_entries(&self) -> Result<Vec<RemoteFile>, TransportError> {
        self.inner.list_remote_entries()
    }

    fn pull(&self, file: &RemoteFile, local_dest: &Path) -> Result<(), TransportError> {
        self.pulls.lock().unwrap().push(file.name.clone());
        if self.failing_pulls.contains(&file.name) {
            return Ok(());
        }
        self.inner.pull(file, local_dest)
    }

    fn delete_remote(&self, file: &RemoteFile) -> Result<(), TransportError> {
        if self.refused_deletes.contains(&file.name) {
            return Err(TransportError::CommandFailed {
                command: format!("rm {}", file.name),
                reason: "Read-only file system".to_string(),
            });
        }
        self.deletes.lock().unwrap().push(file.name.clone());
        self.inner.delete_remote(file)
    }
}

/// Write `files` into a fresh device folder under `base`
pub fn device_with(base: &Path, files: &[(&str, &[u8])]) -> PathBuf {
    let device = base.join("device");
    fs::create_dir_all(&device).unwrap();
    for (name, content) in files {
        fs::write(device.join(name), content).unwrap();
    }
    device
}

/// Number of entries in a directory, zero if it does not exist
pub fn entry_count(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}
