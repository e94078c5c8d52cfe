//! # Transfer Module
//!
//! Backup from the device into the archive root.
//!
//! ## Algorithm
//! 1. Load the ledger and list the remote folder
//! 2. For each entry: pull into staging, hash, then either move into the
//!    archive (new content) or drop the copy (already seen)
//! 3. Append the new hashes to the ledger in one batch
//!
//! The staging area is cleared on every exit path.

mod executor;
mod staging;

pub use executor::{TransferPipeline, TransferResult};
pub use staging::StagingArea;
