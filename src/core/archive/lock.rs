//! Cross-process exclusion for runs against one archive root.

use crate::error::{ArchiveError, FilesystemError};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Lock file kept in the archive root. Never archived or organized.
pub const LOCK_FILE_NAME: &str = ".archive.lock";

/// Exclusive lock on an archive root, released on drop
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Take the lock without waiting. A held lock is `ArchiveError::Busy`.
    pub fn acquire(archive_root: &Path) -> Result<Self, ArchiveError> {
        std::fs::create_dir_all(archive_root).map_err(|source| FilesystemError::CreateDir {
            path: archive_root.to_path_buf(),
            source,
        })?;

        let path = archive_root.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| FilesystemError::Lock {
                path: path.clone(),
                source,
            })?;

        if let Err(e) = FileExt::try_lock_exclusive(&file) {
            if e.kind() == fs2::lock_contended_error().kind() {
                return Err(ArchiveError::Busy {
                    path: archive_root.to_path_buf(),
                });
            }
            return Err(FilesystemError::Lock { path, source: e }.into());
        }

        tracing::debug!(lock = %path.display(), "acquired run lock");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(lock = %self.path.display(), error = %e, "failed to release run lock");
        }
    }
}
