//! # Archive Module
//!
//! The service callers drive, plus the lock that keeps two runs off the
//! same archive root.

mod lock;
mod service;

pub use lock::{RunLock, LOCK_FILE_NAME};
pub use service::{ArchiveService, ArchiveServiceBuilder, ArchiveStatus, OperationReport};
