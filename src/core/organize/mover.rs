//! File moves that survive crossing filesystems.

use crate::error::FilesystemError;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Move `source` to `dest`. `dest` must be free.
///
/// `rename` is tried first. When it fails (typically across filesystems) the
/// file is copied, the copy's size checked, and only then the source
/// removed. A short copy is deleted and the source is left in place.
pub fn move_file(source: &Path, dest: &Path) -> Result<(), FilesystemError> {
    let move_error = |source_err: std::io::Error| FilesystemError::Move {
        from: source.to_path_buf(),
        to: dest.to_path_buf(),
        source: source_err,
    };

    if fs::rename(source, dest).is_ok() {
        return Ok(());
    }

    let expected = fs::metadata(source).map_err(move_error)?.len();
    fs::copy(source, dest).map_err(move_error)?;

    let actual = fs::metadata(dest).map_err(move_error)?.len();
    if actual != expected {
        let _ = fs::remove_file(dest);
        return Err(FilesystemError::CopyVerification {
            path: dest.to_path_buf(),
            expected,
            actual,
        });
    }

    fs::remove_file(source).map_err(|e| FilesystemError::Remove {
        path: source.to_path_buf(),
        source: e,
    })
}

/// Remove a file, treating "already gone" as success
pub fn discard(path: &Path) -> Result<(), FilesystemError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(FilesystemError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// `create_dir_all`, reporting whether the directory was newly created.
/// A non-directory already at `path` is `FilesystemError::Blocked`.
pub fn ensure_dir(path: &Path) -> Result<bool, FilesystemError> {
    if path.is_dir() {
        return Ok(false);
    }
    if fs::symlink_metadata(path).is_ok() {
        return Err(FilesystemError::Blocked {
            path: path.to_path_buf(),
        });
    }
    fs::create_dir_all(path).map_err(|source| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}
