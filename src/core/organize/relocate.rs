//! Moves the whole archive to a new root, keeping its bucket layout.

use super::mover::{ensure_dir, move_file};
use super::naming::unique_destination;
use super::scanner::ArchiveScanner;
use super::types::{RelocateResult, RenamedFile};
use crate::core::archive::LOCK_FILE_NAME;
use crate::core::cancel::CancellationToken;
use crate::error::{ArchiveError, FilesystemError};
use crate::events::{EventSender, Operation};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Move root files and bucket contents from `from` into `to`.
///
/// Loose files land in the new root and bucket files in the bucket of the
/// same name, created on demand. Names already taken in the destination get
/// the numbered suffix. Emptied buckets are removed from the old root.
/// Every entry still in the old root afterwards, apart from the lock file,
/// is reported in `left_behind`.
pub fn relocate_archive(
    from: &Path,
    to: &Path,
    events: &EventSender,
    cancel: &CancellationToken,
) -> Result<RelocateResult, ArchiveError> {
    let start = Instant::now();
    ensure_dir(to)?;

    let mut plan: Vec<(PathBuf, PathBuf)> = ArchiveScanner::files_in(from)?
        .into_iter()
        .map(|file| (file, to.to_path_buf()))
        .collect();
    let mut buckets = Vec::new();
    for (label, dir) in ArchiveScanner::bucket_folders(from)? {
        let target = to.join(label.folder_name());
        for file in ArchiveScanner::files_in(&dir)? {
            plan.push((file, target.clone()));
        }
        buckets.push(dir);
    }

    let total = plan.len();
    events.started(Operation::Relocate, total);
    tracing::info!(from = %from.display(), to = %to.display(), files = total, "relocating archive");

    let mut result = RelocateResult::default();
    for (i, (source, target_dir)) in plan.into_iter().enumerate() {
        cancel.check()?;
        let Some(file_name) = source.file_name() else {
            continue;
        };

        ensure_dir(&target_dir)?;
        let dest = unique_destination(&target_dir, file_name);
        move_file(&source, &dest)?;

        if dest.file_name() != Some(file_name) {
            result.renamed.push(RenamedFile {
                original: source.clone(),
                destination: dest,
            });
        }
        result.files_moved += 1;
        events.progress(Operation::Relocate, i + 1, total, &file_name.to_string_lossy());
    }

    for dir in buckets {
        // Leftover subdirectories keep the bucket alive in the old root
        if fs::remove_dir(&dir).is_ok() {
            tracing::debug!(folder = %dir.display(), "removed emptied bucket");
        }
    }
    result.left_behind = remaining_entries(from)?;
    if !result.left_behind.is_empty() {
        tracing::warn!(
            from = %from.display(),
            count = result.left_behind.len(),
            "entries left in the old archive root"
        );
    }

    result.duration_ms = start.elapsed().as_millis() as u64;
    Ok(result)
}

/// Everything directly under `dir` except the lock file, sorted
fn remaining_entries(dir: &Path) -> Result<Vec<PathBuf>, FilesystemError> {
    let entries = fs::read_dir(dir).map_err(|source| FilesystemError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut left = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| FilesystemError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_name() != LOCK_FILE_NAME {
            left.push(entry.path());
        }
    }
    left.sort();
    Ok(left)
}

/// Whether two paths name the same directory once resolved
pub fn same_location(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
