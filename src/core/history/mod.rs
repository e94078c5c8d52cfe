//! # Run History Module
//!
//! Keeps a record of every backup, organize, undo, prune and relocate run.
//!
//! ## Features
//! - Persistent storage using SQLite
//! - Pagination, newest first
//! - Clear operation

mod repository;
mod types;

pub use repository::HistoryRepository;
pub use types::{RunHistoryPage, RunRecord, RunStatus};
