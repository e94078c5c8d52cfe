//! # Metadata Module
//!
//! Extracts the capture year from media files.
//!
//! ## Sources
//! - Images: EXIF `DateTimeOriginal`, then `DateTime`
//! - Videos: the QuickTime/MP4 `mvhd` creation time
//!
//! Anything this module fails to read is reported as an error or `None`;
//! deciding what that means for bucketing is the classifier's job.

mod quicktime;

use crate::error::MetadataError;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use exif::{In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Coarse file-type class used to pick a metadata source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "heic", "heif", "tiff", "tif", "dng", "cr2", "nef", "arw",
    "raf",
];

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "3gp", "3g2"];

impl MediaKind {
    /// Detect the class from the file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext.to_lowercase(),
            None => return MediaKind::Other,
        };

        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Video
        } else {
            MediaKind::Other
        }
    }
}

/// Source of temporal metadata
pub trait TemporalMetadata: Send + Sync {
    /// Capture year of the file, if the file records one
    fn extract_year(&self, path: &Path, kind: MediaKind) -> Result<Option<i32>, MetadataError>;
}

/// Reads EXIF for images and container headers for videos
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaMetadata;

impl MediaMetadata {
    pub fn new() -> Self {
        Self
    }
}

impl TemporalMetadata for MediaMetadata {
    fn extract_year(&self, path: &Path, kind: MediaKind) -> Result<Option<i32>, MetadataError> {
        match kind {
            MediaKind::Image => extract_exif_date(path).map(|d| d.map(|d| d.year())),
            MediaKind::Video => quicktime::creation_year(path),
            MediaKind::Other => Ok(None),
        }
    }
}

/// Date the photo was taken according to EXIF
pub fn extract_exif_date(path: &Path) -> Result<Option<NaiveDate>, MetadataError> {
    let file = File::open(path).map_err(|source| MetadataError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let exif = Reader::new()
        .read_from_container(&mut reader)
        .map_err(|e| MetadataError::Exif {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    // DateTimeOriginal is when the shutter fired; DateTime may be an edit time
    for tag in [Tag::DateTimeOriginal, Tag::DateTime] {
        if let Some(field) = exif.get_field(tag, In::PRIMARY) {
            if let Some(date) = ascii_value(&field.value).and_then(|s| parse_exif_datetime(&s)) {
                return Ok(Some(date));
            }
        }
    }

    Ok(None)
}

fn ascii_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        let bytes = vec.first()?;
        let s = std::str::from_utf8(bytes).ok()?;
        let trimmed = s.trim_end_matches('\0').trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    None
}

/// Parse `YYYY:MM:DD HH:MM:SS`, tolerating `-` separators and a missing time
fn parse_exif_datetime(s: &str) -> Option<NaiveDate> {
    let s = s.trim_matches('"');
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S") {
        return Some(dt.date());
    }

    let normalized = s.replace(':', "-");
    let date_part = normalized.split_whitespace().next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
