//! Moves archived files into bucket folders and back.

use super::mover::{ensure_dir, move_file};
use super::naming::unique_destination;
use super::scanner::ArchiveScanner;
use super::types::*;
use crate::core::cancel::CancellationToken;
use crate::core::classifier::Classifier;
use crate::error::{ArchiveError, FilesystemError};
use crate::events::{EventSender, Operation};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Bucket reorganization of one archive root
///
/// Both directions assume they are the only writer on the root.
pub struct Reorganizer<'a> {
    archive_root: &'a Path,
    classifier: &'a Classifier,
}

impl<'a> Reorganizer<'a> {
    pub fn new(archive_root: &'a Path, classifier: &'a Classifier) -> Self {
        Self {
            archive_root,
            classifier,
        }
    }

    /// Move every file directly under the root into its bucket.
    ///
    /// Files already inside a bucket are not looked at, so running this
    /// twice moves nothing the second time.
    pub fn organize(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<OrganizeResult, ArchiveError> {
        let start = Instant::now();
        let files = ArchiveScanner::files_in(self.archive_root)?;
        let total = files.len();
        events.started(Operation::Organize, total);
        tracing::info!(root = %self.archive_root.display(), files = total, "organizing archive");

        let mut result = OrganizeResult::default();
        let mut by_bucket: BTreeMap<String, usize> = BTreeMap::new();

        for (i, source) in files.iter().enumerate() {
            cancel.check()?;
            let Some(file_name) = source.file_name() else {
                continue;
            };

            let bucket = self.classifier.classify(source).folder_name();
            let bucket_dir = self.archive_root.join(&bucket);
            if ensure_dir(&bucket_dir)? {
                result.folders_created += 1;
            }

            let dest = unique_destination(&bucket_dir, file_name);
            move_file(source, &dest)?;
            tracing::debug!(from = %source.display(), to = %dest.display(), "filed");

            if dest.file_name() != Some(file_name) {
                result.renamed.push(RenamedFile {
                    original: source.clone(),
                    destination: dest.clone(),
                });
            }
            result.files_moved += 1;
            *by_bucket.entry(bucket).or_default() += 1;

            events.progress(Operation::Organize, i + 1, total, &file_name.to_string_lossy());
        }

        result.by_bucket = by_bucket
            .into_iter()
            .map(|(bucket, count)| BucketSummary { bucket, count })
            .collect();
        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    /// Move every file in every bucket back to the root, then remove the
    /// emptied buckets.
    pub fn undo(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<UndoResult, ArchiveError> {
        let start = Instant::now();
        let buckets = ArchiveScanner::bucket_folders(self.archive_root)?;

        let mut plan: Vec<(PathBuf, Vec<PathBuf>)> = Vec::with_capacity(buckets.len());
        for (_, dir) in buckets {
            let files = ArchiveScanner::files_in(&dir)?;
            plan.push((dir, files));
        }
        let total: usize = plan.iter().map(|(_, files)| files.len()).sum();
        events.started(Operation::Undo, total);
        tracing::info!(root = %self.archive_root.display(), files = total, "undoing organization");

        let mut result = UndoResult::default();
        let mut index = 0;

        for (dir, files) in plan {
            for source in files {
                cancel.check()?;
                let Some(file_name) = source.file_name() else {
                    continue;
                };

                let dest = unique_destination(self.archive_root, file_name);
                move_file(&source, &dest)?;

                if dest.file_name() != Some(file_name) {
                    result.renamed.push(RenamedFile {
                        original: source.clone(),
                        destination: dest,
                    });
                }
                result.files_restored += 1;
                index += 1;
                events.progress(Operation::Undo, index, total, &file_name.to_string_lossy());
            }

            if remove_if_empty(&dir)? {
                result.folders_removed += 1;
            } else {
                tracing::warn!(folder = %dir.display(), "bucket not empty after undo, keeping it");
                result.folders_kept.push(dir);
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }
}

fn remove_if_empty(dir: &Path) -> Result<bool, FilesystemError> {
    let mut entries = fs::read_dir(dir).map_err(|source| FilesystemError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;
    if entries.next().is_some() {
        return Ok(false);
    }

    fs::remove_dir(dir).map_err(|source| FilesystemError::Remove {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(true)
}
