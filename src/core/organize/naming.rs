//! Collision-safe naming.
//!
//! `name.ext` is tried first, then `name_1.ext`, `name_2.ext`, ... until a
//! free name turns up. The first free name wins, and an occupied name is
//! never reused, so nothing is ever overwritten.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// `stem_{counter}.ext`, splitting at the last dot like the file system does
pub fn numbered_name(file_name: &OsStr, counter: usize) -> OsString {
    let path = Path::new(file_name);
    let stem = path.file_stem().unwrap_or(file_name);

    let mut name = stem.to_os_string();
    name.push(format!("_{}", counter));
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    name
}

/// First unused path for `file_name` inside `dir`
pub fn unique_destination(dir: &Path, file_name: &OsStr) -> PathBuf {
    let candidate = dir.join(file_name);
    if !is_occupied(&candidate) {
        return candidate;
    }

    let mut counter = 1;
    loop {
        let candidate = dir.join(numbered_name(file_name, counter));
        if !is_occupied(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Broken symlinks occupy a name too
fn is_occupied(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
