//! # Classifier Module
//!
//! Maps an archived file to its bucket folder: a 4-digit year or `Unknown`.
//!
//! Classification never fails. Missing, corrupted or unsupported metadata all
//! resolve through the configured [`FallbackPolicy`], and anything still
//! undecided lands in `Unknown`. The classifier never touches the filesystem
//! beyond reading.

use crate::core::metadata::{MediaKind, MediaMetadata, TemporalMetadata};
use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Folder name for files without a usable year
pub const UNKNOWN_BUCKET: &str = "Unknown";

/// A classification folder under the archive root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BucketLabel {
    Year(i32),
    Unknown,
}

impl BucketLabel {
    /// Bucket for a year, if it has four digits
    pub fn from_year(year: i32) -> Option<Self> {
        (1000..=9999).contains(&year).then_some(BucketLabel::Year(year))
    }

    /// Recognize a bucket folder by name
    pub fn parse_folder(name: &str) -> Option<Self> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| Regex::new(r"^(?:\d{4}|Unknown)$").expect("valid regex"));

        if !pattern.is_match(name) {
            return None;
        }
        if name == UNKNOWN_BUCKET {
            return Some(BucketLabel::Unknown);
        }
        name.parse().ok().and_then(Self::from_year)
    }

    pub fn folder_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BucketLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketLabel::Year(year) => write!(f, "{}", year),
            BucketLabel::Unknown => f.write_str(UNKNOWN_BUCKET),
        }
    }
}

/// What to do when a file carries no usable capture date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Put the file in `Unknown`
    #[default]
    Unknown,
    /// Use the year of the file's modification time
    ModifiedTime,
}

/// Buckets files by capture year
#[derive(Clone)]
pub struct Classifier {
    metadata: Arc<dyn TemporalMetadata>,
    fallback: FallbackPolicy,
}

impl Classifier {
    pub fn new(metadata: Arc<dyn TemporalMetadata>, fallback: FallbackPolicy) -> Self {
        Self { metadata, fallback }
    }

    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }

    pub fn classify(&self, path: &Path) -> BucketLabel {
        let kind = MediaKind::from_path(path);

        match self.metadata.extract_year(path, kind) {
            Ok(Some(year)) => {
                if let Some(label) = BucketLabel::from_year(year) {
                    return label;
                }
                tracing::debug!(path = %path.display(), year, "ignoring out-of-range year");
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "metadata unreadable");
            }
        }

        match self.fallback {
            FallbackPolicy::Unknown => BucketLabel::Unknown,
            FallbackPolicy::ModifiedTime => modified_year(path)
                .and_then(BucketLabel::from_year)
                .unwrap_or(BucketLabel::Unknown),
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(Arc::new(MediaMetadata::new()), FallbackPolicy::default())
    }
}

fn modified_year(path: &Path) -> Option<i32> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    let datetime: DateTime<Utc> = modified.into();
    Some(datetime.year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetadataError;
    use tempfile::TempDir;

    struct Fixed(Result<Option<i32>, ()>);

    impl TemporalMetadata for Fixed {
        fn extract_year(&self, path: &Path, _kind: MediaKind) -> Result<Option<i32>, MetadataError> {
            self.0.map_err(|_| MetadataError::Exif {
                path: path.to_path_buf(),
                reason: "corrupt".to_string(),
            })
        }
    }

    fn classifier(result: Result<Option<i32>, ()>, fallback: FallbackPolicy) -> Classifier {
        Classifier::new(Arc::new(Fixed(result)), fallback)
    }

    #[test]
    fn usable_year_becomes_label() {
        let c = classifier(Ok(Some(2020)), FallbackPolicy::Unknown);
        assert_eq!(c.classify(Path::new("/a/IMG_1.jpg")), BucketLabel::Year(2020));
    }

    #[test]
    fn collaborator_failure_is_absorbed() {
        let c = classifier(Err(()), FallbackPolicy::Unknown);
        assert_eq!(c.classify(Path::new("/a/IMG_1.jpg")), BucketLabel::Unknown);
    }

    #[test]
    fn out_of_range_year_is_unknown() {
        let c = classifier(Ok(Some(0)), FallbackPolicy::Unknown);
        assert_eq!(c.classify(Path::new("/a/IMG_1.jpg")), BucketLabel::Unknown);
    }

    #[test]
    fn modified_time_fallback_uses_mtime_year() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("IMG_1.jpg");
        fs::write(&path, b"no exif here").unwrap();

        let c = classifier(Ok(None), FallbackPolicy::ModifiedTime);
        let expected = Utc::now().year();
        assert_eq!(c.classify(&path), BucketLabel::Year(expected));
    }

    #[test]
    fn modified_time_fallback_on_missing_file_is_unknown() {
        let c = classifier(Err(()), FallbackPolicy::ModifiedTime);
        assert_eq!(c.classify(Path::new("/nonexistent/IMG.jpg")), BucketLabel::Unknown);
    }

    #[test]
    fn real_metadata_on_corrupt_file_is_unknown() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("corrupt.jpg");
        fs::write(&path, b"\xFF\xD8 garbage").unwrap();

        assert_eq!(Classifier::default().classify(&path), BucketLabel::Unknown);
    }

    #[test]
    fn bucket_folder_names() {
        assert_eq!(BucketLabel::parse_folder("2020"), Some(BucketLabel::Year(2020)));
        assert_eq!(BucketLabel::parse_folder("Unknown"), Some(BucketLabel::Unknown));
        assert_eq!(BucketLabel::parse_folder("0999"), None);
        assert_eq!(BucketLabel::parse_folder("20201"), None);
        assert_eq!(BucketLabel::parse_folder("unknown"), None);
        assert_eq!(BucketLabel::parse_folder("Vacation"), None);
        assert_eq!(BucketLabel::Year(2021).folder_name(), "2021");
    }
}
