//! # DCIM Archiver
//!
//! Backs up a phone's camera folder into a local archive, never storing the
//! same content twice.
//!
//! ## Core Philosophy
//! - **Content is identity** - Files are deduplicated by SHA-256, not by name
//! - **Never overwrite** - Name clashes get a numbered suffix
//! - **Verify before deleting** - Device files are removed only after a fresh
//!   copy hashes to a value already archived
//!
//! ## Architecture
//! - `core` - The archive engine
//! - `config` - Persistent settings
//! - `events` - Ordered progress reporting
//! - `error` - User-friendly error types

pub mod config;
pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use config::ArchiveConfig;
pub use error::{ArchiveError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. Filtering follows
/// `RUST_LOG`, defaulting to warnings only. Calling it twice is harmless.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
