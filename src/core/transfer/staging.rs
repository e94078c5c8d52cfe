//! Scratch directory for copies that are not yet part of the archive.

use crate::error::FilesystemError;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// A staging directory that is emptied when prepared and again when dropped
///
/// Holding one for the length of a run guarantees no staged copy outlives
/// the run, whether it returns normally, with an error, or cancelled.
#[derive(Debug)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Create `dir` if needed and remove anything left in it
    pub fn prepare(dir: &Path) -> Result<Self, FilesystemError> {
        fs::create_dir_all(dir).map_err(|source| FilesystemError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let area = Self {
            dir: dir.to_path_buf(),
        };
        area.clear()?;
        Ok(area)
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Where a pulled copy of `name` goes
    pub fn slot(&self, name: &OsStr) -> PathBuf {
        self.dir.join(name)
    }

    /// Remove every entry, keeping the directory itself
    pub fn clear(&self) -> Result<(), FilesystemError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(FilesystemError::ReadDir {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        for entry in entries {
            let entry = entry.map_err(|source| FilesystemError::ReadDir {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            let removed = if is_dir {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            removed.map_err(|source| FilesystemError::Remove { path, source })?;
        }
        Ok(())
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if let Err(e) = self.clear() {
            tracing::warn!(dir = %self.dir.display(), error = %e, "failed to clear staging area");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn prepare_removes_leftovers() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("staging");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("stale.jpg"), b"stale").unwrap();

        let area = StagingArea::prepare(&dir).unwrap();

        assert!(area.path().is_dir());
        assert_eq!(fs::read_dir(area.path()).unwrap().count(), 0);
    }

    #[test]
    fn drop_clears_contents_but_keeps_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("staging");

        {
            let area = StagingArea::prepare(&dir).unwrap();
            fs::write(area.slot(OsStr::new("a.jpg")), b"a").unwrap();
        }

        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }
}
