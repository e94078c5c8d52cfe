use assert_fs::prelude::*;
use assert_fs::TempDir;
use chrono::{Datelike, Utc};
use dcim_archiver::config::ArchiveConfig;
use dcim_archiver::core::archive::{ArchiveService, LOCK_FILE_NAME};
use dcim_archiver::core::classifier::FallbackPolicy;
use dcim_archiver::core::metadata::{MediaKind, TemporalMetadata};
use dcim_archiver::error::MetadataError;
use predicates::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use walkdir::WalkDir;

/// Capture years keyed by file stem prefix, e.g. `y2020_beach.jpg`
struct YearInName;

impl TemporalMetadata for YearInName {
    fn extract_year(&self, path: &Path, _kind: MediaKind) -> Result<Option<i32>, MetadataError> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        Ok(name
            .strip_prefix('y')
            .and_then(|rest| rest.get(..4))
            .and_then(|year| year.parse().ok()))
    }
}

fn service(config: ArchiveConfig) -> ArchiveService {
    ArchiveService::builder(config)
        .metadata(Arc::new(YearInName))
        .build()
}

/// (file name, content) of every archived file, ignoring folders
fn archive_contents(root: &Path) -> BTreeSet<(String, Vec<u8>)> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name() != LOCK_FILE_NAME)
        .map(|e| {
            (
                e.file_name().to_string_lossy().into_owned(),
                fs::read(e.path()).unwrap(),
            )
        })
        .collect()
}

#[test]
fn organize_then_undo_restores_the_flat_archive() {
    let temp = TempDir::new().unwrap();
    let config = ArchiveConfig::rooted(temp.path());
    let archive = temp.child("DCIM_Backups");
    archive.child("y2019_a.jpg").write_binary(b"a").unwrap();
    archive.child("y2020_b.jpg").write_binary(b"b").unwrap();
    archive.child("y2020_c.mp4").write_binary(b"c").unwrap();
    archive.child("notes.txt").write_binary(b"d").unwrap();
    let before = archive_contents(archive.path());
    let service = service(config);

    let organized = service.organize().unwrap();

    assert_eq!(organized.files_moved, 4);
    archive.child("2019/y2019_a.jpg").assert(predicate::path::is_file());
    archive.child("2020/y2020_b.jpg").assert(predicate::path::is_file());
    archive.child("2020/y2020_c.mp4").assert(predicate::path::is_file());
    archive.child("Unknown/notes.txt").assert(predicate::path::is_file());
    let counts: HashMap<String, usize> = organized
        .by_bucket
        .iter()
        .map(|b| (b.bucket.clone(), b.count))
        .collect();
    assert_eq!(counts["2020"], 2);

    let undone = service.undo_organize().unwrap();

    assert_eq!(undone.files_restored, 4);
    archive.child("2019").assert(predicate::path::missing());
    archive.child("2020").assert(predicate::path::missing());
    archive.child("Unknown").assert(predicate::path::missing());
    assert_eq!(archive_contents(archive.path()), before);
}

#[test]
fn organize_never_overwrites_and_renames_first_fit() {
    let temp = TempDir::new().unwrap();
    let config = ArchiveConfig::rooted(temp.path());
    let archive = temp.child("DCIM_Backups");
    archive.child("2020/y2020_a.jpg").write_binary(b"resident").unwrap();
    archive.child("2020/y2020_a_1.jpg").write_binary(b"resident 1").unwrap();
    archive.child("y2020_a.jpg").write_binary(b"newcomer").unwrap();
    let service = service(config);

    let result = service.organize().unwrap();

    archive.child("2020/y2020_a.jpg").assert("resident");
    archive.child("2020/y2020_a_1.jpg").assert("resident 1");
    archive.child("2020/y2020_a_2.jpg").assert("newcomer");
    assert_eq!(result.renamed.len(), 1);
}

#[test]
fn organize_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let config = ArchiveConfig::rooted(temp.path());
    let archive = temp.child("DCIM_Backups");
    archive.child("y2021_a.jpg").write_binary(b"a").unwrap();
    let service = service(config);

    service.organize().unwrap();
    let second = service.organize().unwrap();

    assert_eq!(second.files_moved, 0);
    archive.child("2021/y2021_a.jpg").assert(predicate::path::is_file());
}

#[test]
fn unreadable_media_goes_to_unknown() {
    let temp = TempDir::new().unwrap();
    let config = ArchiveConfig::rooted(temp.path());
    let archive = temp.child("DCIM_Backups");
    archive.child("broken.jpg").write_binary(b"not a jpeg at all").unwrap();
    archive.child("broken.mp4").write_binary(b"nor a movie").unwrap();
    let service = ArchiveService::builder(config).build();

    let result = service.organize().unwrap();

    assert_eq!(result.files_moved, 2);
    archive.child("Unknown/broken.jpg").assert(predicate::path::is_file());
    archive.child("Unknown/broken.mp4").assert(predicate::path::is_file());
}

#[test]
fn modified_time_fallback_uses_file_year() {
    let temp = TempDir::new().unwrap();
    let mut config = ArchiveConfig::rooted(temp.path());
    config.fallback = FallbackPolicy::ModifiedTime;
    let archive = temp.child("DCIM_Backups");
    archive.child("screenshot.png").write_binary(b"no exif").unwrap();
    let service = ArchiveService::builder(config).build();

    service.organize().unwrap();

    let year = Utc::now().year().to_string();
    archive
        .child(format!("{}/screenshot.png", year))
        .assert(predicate::path::is_file());
}

#[test]
fn undo_leaves_user_folders_alone() {
    let temp = TempDir::new().unwrap();
    let config = ArchiveConfig::rooted(temp.path());
    let archive = temp.child("DCIM_Backups");
    archive.child("Holiday 2019/x.jpg").write_binary(b"x").unwrap();
    archive.child("2019/y.jpg").write_binary(b"y").unwrap();
    let service = service(config);

    let result = service.undo_organize().unwrap();

    assert_eq!(result.files_restored, 1);
    archive.child("y.jpg").assert(predicate::path::is_file());
    archive.child("Holiday 2019/x.jpg").assert(predicate::path::is_file());
}

#[test]
fn undo_empties_buckets_holding_dotfiles() {
    let temp = TempDir::new().unwrap();
    let config = ArchiveConfig::rooted(temp.path());
    let archive = temp.child("DCIM_Backups");
    archive.child("2020/a.jpg").write_binary(b"a").unwrap();
    archive.child("2020/.pending-1-b.jpg").write_binary(b"b").unwrap();
    let service = service(config);

    let result = service.undo_organize().unwrap();

    assert_eq!(result.files_restored, 2);
    assert!(result.folders_kept.is_empty());
    archive.child("2020").assert(predicate::path::missing());
    archive.child(".pending-1-b.jpg").assert("b");
}
