//! # Ledger Module
//!
//! Durable record of every content hash already archived.
//!
//! ## Guarantees
//! - A missing store is an empty ledger, not an error
//! - The store only grows; entries are appended, never rewritten
//! - Each hash is written at most once
//!
//! ## Backends
//! - `FileLedger` - Text file, one hex hash per line
//! - `InMemoryLedger` - For testing

mod file;
mod memory;
mod traits;

pub use file::FileLedger;
pub use memory::InMemoryLedger;
pub use traits::LedgerBackend;
