//! Reads the physical layout of the archive root.

use super::types::BucketSummary;
use crate::core::archive::LOCK_FILE_NAME;
use crate::core::classifier::BucketLabel;
use crate::error::FilesystemError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Snapshot of the archive root
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveLayout {
    /// Files directly under the root
    pub unclassified: usize,
    /// Files per bucket folder, sorted by name
    pub buckets: Vec<BucketSummary>,
    /// Directories that are not buckets
    pub other_dirs: Vec<PathBuf>,
}

impl ArchiveLayout {
    pub fn total_files(&self) -> usize {
        self.unclassified + self.buckets.iter().map(|b| b.count).sum::<usize>()
    }

    pub fn is_bucketed(&self) -> bool {
        !self.buckets.is_empty()
    }
}

/// Lists archive contents, one directory level at a time
pub struct ArchiveScanner;

impl ArchiveScanner {
    /// Regular files directly under `dir`, sorted by name. Hidden files are
    /// included; only the lock file is excluded. A missing directory has no
    /// files.
    pub fn files_in(dir: &Path) -> Result<Vec<PathBuf>, FilesystemError> {
        Ok(Self::entries(dir)?
            .into_iter()
            .filter(|(_, is_dir)| !is_dir)
            .map(|(path, _)| path)
            .filter(|path| !Self::is_reserved(path))
            .collect())
    }

    /// Bucket folders directly under the root, sorted by name
    pub fn bucket_folders(root: &Path) -> Result<Vec<(BucketLabel, PathBuf)>, FilesystemError> {
        Ok(Self::entries(root)?
            .into_iter()
            .filter(|(_, is_dir)| *is_dir)
            .filter_map(|(path, _)| {
                let label = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(BucketLabel::parse_folder)?;
                Some((label, path))
            })
            .collect())
    }

    pub fn layout(root: &Path) -> Result<ArchiveLayout, FilesystemError> {
        let mut layout = ArchiveLayout {
            unclassified: Self::files_in(root)?.len(),
            ..ArchiveLayout::default()
        };

        for (path, is_dir) in Self::entries(root)? {
            if !is_dir {
                continue;
            }
            match path.file_name().and_then(|n| n.to_str()).and_then(BucketLabel::parse_folder) {
                Some(label) => layout.buckets.push(BucketSummary {
                    bucket: label.folder_name(),
                    count: Self::files_in(&path)?.len(),
                }),
                None => layout.other_dirs.push(path),
            }
        }

        Ok(layout)
    }

    fn is_reserved(path: &Path) -> bool {
        path.file_name().is_some_and(|n| n == LOCK_FILE_NAME)
    }

    /// `(path, is_dir)` for each child; symlinks count as neither
    fn entries(dir: &Path) -> Result<Vec<(PathBuf, bool)>, FilesystemError> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| FilesystemError::ReadDir {
                path: dir.to_path_buf(),
                source: e.into(),
            })?;
            let file_type = entry.file_type();
            if file_type.is_dir() {
                out.push((entry.into_path(), true));
            } else if file_type.is_file() {
                out.push((entry.into_path(), false));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_root_is_empty() {
        let files = ArchiveScanner::files_in(Path::new("/nonexistent/archive")).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn root_files_keep_hidden_files_but_not_the_lock() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".nomedia"), b"").unwrap();
        fs::write(temp.path().join("b.jpg"), b"b").unwrap();
        fs::write(temp.path().join("a.jpg"), b"a").unwrap();
        fs::write(temp.path().join(LOCK_FILE_NAME), b"").unwrap();
        fs::create_dir(temp.path().join("2020")).unwrap();

        let files = ArchiveScanner::files_in(temp.path()).unwrap();
        assert_eq!(
            files,
            vec![
                temp.path().join(".nomedia"),
                temp.path().join("a.jpg"),
                temp.path().join("b.jpg"),
            ]
        );
    }

    #[test]
    fn layout_counts_buckets_and_strays() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("new.jpg"), b"n").unwrap();
        fs::create_dir(temp.path().join("2020")).unwrap();
        fs::write(temp.path().join("2020").join("a.jpg"), b"a").unwrap();
        fs::write(temp.path().join("2020").join("b.jpg"), b"b").unwrap();
        fs::create_dir(temp.path().join("Unknown")).unwrap();
        fs::create_dir(temp.path().join("Holiday")).unwrap();

        let layout = ArchiveScanner::layout(temp.path()).unwrap();

        assert_eq!(layout.unclassified, 1);
        assert_eq!(layout.total_files(), 3);
        assert_eq!(
            layout.buckets,
            vec![
                BucketSummary { bucket: "2020".to_string(), count: 2 },
                BucketSummary { bucket: "Unknown".to_string(), count: 0 },
            ]
        );
        assert_eq!(layout.other_dirs, vec![temp.path().join("Holiday")]);
    }
}
