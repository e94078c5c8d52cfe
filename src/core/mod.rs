//! # Core Module
//!
//! The presentation-agnostic archive engine.
//!
//! ## Modules
//! - `hasher` - SHA-256 content identity
//! - `ledger` - Durable set of archived content hashes
//! - `transport` - Access to the device (adb or a mounted folder)
//! - `transfer` - Backup from the device into the archive
//! - `metadata` - Capture years from EXIF and QuickTime headers
//! - `classifier` - Maps files to year buckets
//! - `organize` - Moves files between the root and buckets
//! - `prune` - Hash-verified deletion from the device
//! - `history` - Run history in SQLite
//! - `archive` - The service that ties it together

pub mod archive;
pub mod cancel;
pub mod classifier;
pub mod hasher;
pub mod history;
pub mod ledger;
pub mod metadata;
pub mod organize;
pub mod prune;
pub mod transfer;
pub mod transport;

// Re-export commonly used types
pub use archive::{ArchiveService, ArchiveStatus};
pub use cancel::CancellationToken;
pub use classifier::{BucketLabel, Classifier, FallbackPolicy};
pub use hasher::ContentHash;
pub use transport::{RemoteFile, RemoteTransport};
