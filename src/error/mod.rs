//! # Error Module
//!
//! Error types for the phone archiver.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Degrade per item** - a failed pull skips one file, it never aborts a run
//! - **Abort on the filesystem** - a failed local move or write stops the run

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Device error: {0}")]
    Transport(#[from] TransportError),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    #[error("Device cleanup refused: {0}")]
    Prune(#[from] PruneError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Another operation is already running on {path}. Wait for it to finish and try again.")]
    Busy { path: PathBuf },

    #[error("Operation was cancelled")]
    Cancelled,
}

/// Errors reading or appending the content ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Failed to read ledger {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to append to ledger {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Ledger {path} is corrupted at line {line}. Restore it from a backup before running again.")]
    Corrupted { path: PathBuf, line: usize },

    #[error("In-memory ledger lock was poisoned")]
    Poisoned,
}

/// Errors talking to the remote device
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("No device connected. Plug in the phone and enable USB debugging.")]
    NoDevice,

    #[error("Could not find the `{name}` binary. Install it or set its path in the configuration.")]
    BinaryNotFound { name: String },

    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed: {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("Remote folder not found: {path}")]
    RemoteNotFound { path: PathBuf },

    #[error("Failed to access remote file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Local filesystem failures. These abort the run.
#[derive(Error, Debug)]
pub enum FilesystemError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Copy verification failed for {path}: expected {expected} bytes, found {actual}")]
    CopyVerification {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create folder {path}: a file with that name is in the way. Rename or move it and try again.")]
    Blocked { path: PathBuf },

    #[error("Failed to lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reasons the verified device cleanup refuses to run
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PruneError {
    #[error("deletion was not confirmed")]
    NotConfirmed,

    #[error("confirmation phrase did not match. Type it exactly as shown.")]
    TokenMismatch,
}

/// Errors loading, saving or changing the configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine a configuration directory for this user")]
    NoConfigDir,

    #[error("Failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration {path} is invalid: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Failed to write configuration {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Moving the archive was not confirmed")]
    RelocateNotConfirmed,

    #[error("The archive is already located at {path}")]
    SameRoot { path: PathBuf },
}

/// Errors with the run history database
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Failed to open history database at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("History query failed: {0}")]
    QueryFailed(String),
}

/// Errors reading temporal metadata. Never surfaced past the classifier.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No readable EXIF in {path}: {reason}")]
    Exif { path: PathBuf, reason: String },

    #[error("Malformed container in {path}: {reason}")]
    Container { path: PathBuf, reason: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, ArchiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_error_includes_both_paths() {
        let error = FilesystemError::Move {
            from: PathBuf::from("/staging/IMG_1.jpg"),
            to: PathBuf::from("/archive/IMG_1.jpg"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = error.to_string();
        assert!(message.contains("/staging/IMG_1.jpg"));
        assert!(message.contains("/archive/IMG_1.jpg"));
    }

    #[test]
    fn corrupted_ledger_names_line() {
        let error = LedgerError::Corrupted {
            path: PathBuf::from("/data/backup_log.txt"),
            line: 7,
        };
        let message = error.to_string();
        assert!(message.contains("line 7"));
        assert!(message.contains("backup_log.txt"));
    }

    #[test]
    fn prune_errors_convert_to_archive_error() {
        let error: ArchiveError = PruneError::TokenMismatch.into();
        assert!(matches!(error, ArchiveError::Prune(PruneError::TokenMismatch)));
        assert!(error.to_string().contains("exactly"));
    }
}
