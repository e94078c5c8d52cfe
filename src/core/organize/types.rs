//! Types for the organize module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Files moved into one bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSummary {
    /// Folder name (`2021`, `Unknown`)
    pub bucket: String,
    pub count: usize,
}

/// A move that had to take a numbered name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamedFile {
    pub original: PathBuf,
    pub destination: PathBuf,
}

/// Result of organizing the archive root into buckets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizeResult {
    pub files_moved: usize,
    pub folders_created: usize,
    /// Sorted by bucket name
    pub by_bucket: Vec<BucketSummary>,
    pub renamed: Vec<RenamedFile>,
    pub duration_ms: u64,
}

/// Result of flattening buckets back into the archive root
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UndoResult {
    pub files_restored: usize,
    pub folders_removed: usize,
    pub renamed: Vec<RenamedFile>,
    /// Buckets left in place because something other than files remained
    pub folders_kept: Vec<PathBuf>,
    pub duration_ms: u64,
}

/// Result of moving the whole archive to a new root
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelocateResult {
    pub files_moved: usize,
    pub renamed: Vec<RenamedFile>,
    /// Entries still in the old root afterwards, lock file aside
    pub left_behind: Vec<PathBuf>,
    pub duration_ms: u64,
}
