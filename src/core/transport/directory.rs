//! A local or mounted folder acting as the remote store.

use super::{RemoteFile, RemoteTransport};
use crate::error::TransportError;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Treats the regular files directly inside `root` as the device contents
#[derive(Debug, Clone)]
pub struct DirectoryTransport {
    root: PathBuf,
}

impl DirectoryTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn io_error(path: PathBuf, source: std::io::Error) -> TransportError {
        TransportError::Io { path, source }
    }
}

impl RemoteTransport for DirectoryTransport {
    fn is_connected(&self) -> Result<bool, TransportError> {
        Ok(self.root.is_dir())
    }

    fn list_remote_entries(&self) -> Result<Vec<RemoteFile>, TransportError> {
        if !self.root.is_dir() {
            return Err(TransportError::RemoteNotFound {
                path: self.root.clone(),
            });
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
                Self::io_error(path, e.into())
            })?;
            if entry.file_type().is_file() {
                files.push(RemoteFile::new(entry.file_name().to_string_lossy()));
            }
        }

        Ok(files)
    }

    fn pull(&self, file: &RemoteFile, local_dest: &Path) -> Result<(), TransportError> {
        let source = self.root.join(&file.name);
        fs::copy(&source, local_dest)
            .map(|_| ())
            .map_err(|e| Self::io_error(source, e))
    }

    fn delete_remote(&self, file: &RemoteFile) -> Result<(), TransportError> {
        let target = self.root.join(&file.name);
        fs::remove_file(&target).map_err(|e| Self::io_error(target, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lists_only_top_level_files_sorted() {
        let device = TempDir::new().unwrap();
        fs::write(device.path().join("b.jpg"), b"b").unwrap();
        fs::write(device.path().join("a.jpg"), b"a").unwrap();
        fs::create_dir(device.path().join(".thumbnails")).unwrap();
        fs::write(device.path().join(".thumbnails").join("t.jpg"), b"t").unwrap();

        let transport = DirectoryTransport::new(device.path());
        let names: Vec<String> = transport
            .list_remote_entries()
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();

        assert_eq!(names, vec!["a.jpg".to_string(), "b.jpg".to_string()]);
    }

    #[test]
    fn missing_root_fails_listing() {
        let transport = DirectoryTransport::new("/nonexistent/device");
        assert!(!transport.is_connected().unwrap());
        assert!(matches!(
            transport.list_remote_entries(),
            Err(TransportError::RemoteNotFound { .. })
        ));
    }

    #[test]
    fn pull_and_delete_round_trip() {
        let device = TempDir::new().unwrap();
        let local = TempDir::new().unwrap();
        fs::write(device.path().join("IMG_1.jpg"), b"pixels").unwrap();

        let transport = DirectoryTransport::new(device.path());
        let file = RemoteFile::new("IMG_1.jpg");
        let dest = local.path().join("IMG_1.jpg");

        transport.pull(&file, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"pixels");

        transport.delete_remote(&file).unwrap();
        assert!(!device.path().join("IMG_1.jpg").exists());
    }
}
