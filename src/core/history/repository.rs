//! Database operations for run history.

use super::types::{RunHistoryPage, RunRecord, RunStatus};
use crate::error::HistoryError;
use crate::events::Operation;
use chrono::{TimeZone, Utc};
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// Repository for run history operations
pub struct HistoryRepository {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl HistoryRepository {
    /// Open or create the history database
    pub fn open(path: &Path) -> Result<Self, HistoryError> {
        let open_failed = |reason: String| HistoryError::OpenFailed {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| open_failed(e.to_string()))?;
        }

        let conn = Connection::open(path).map_err(|e| open_failed(e.to_string()))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| open_failed(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS run_history (
                id TEXT PRIMARY KEY,
                operation TEXT NOT NULL,
                started_at INTEGER NOT NULL,
                item_count INTEGER NOT NULL,
                duration_ms INTEGER NOT NULL,
                status TEXT NOT NULL,
                error_message TEXT
            )",
            [],
        )
        .map_err(|e| open_failed(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_run_history_time ON run_history(started_at DESC)",
            [],
        )
        .map_err(|e| open_failed(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Save a run
    pub fn record(&self, record: &RunRecord) -> Result<(), HistoryError> {
        let conn = self.lock()?;

        let error_msg = match &record.status {
            RunStatus::Error(msg) => Some(msg.as_str()),
            _ => None,
        };

        conn.execute(
            "INSERT OR REPLACE INTO run_history
             (id, operation, started_at, item_count, duration_ms, status, error_message)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                record.id.to_string(),
                record.operation.as_str(),
                record.started_at.timestamp_millis(),
                record.count as i64,
                record.duration_ms as i64,
                record.status.as_str(),
                error_msg,
            ],
        )
        .map_err(query_failed)?;

        Ok(())
    }

    /// List runs with pagination, newest first
    pub fn list(&self, limit: usize, offset: usize) -> Result<RunHistoryPage, HistoryError> {
        let conn = self.lock()?;

        let total_count: usize = conn
            .query_row("SELECT COUNT(*) FROM run_history", [], |row| {
                row.get::<_, i64>(0).map(|v| v as usize)
            })
            .map_err(query_failed)?;

        let mut stmt = conn
            .prepare(
                "SELECT id, operation, started_at, item_count, duration_ms, status, error_message
                 FROM run_history
                 ORDER BY started_at DESC
                 LIMIT ? OFFSET ?",
            )
            .map_err(query_failed)?;

        let entries: Vec<RunRecord> = stmt
            .query_map(params![limit as i64, offset as i64], read_row)
            .map_err(query_failed)?
            .filter_map(|r| match r {
                Ok(Some(record)) => Some(record),
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable history row");
                    None
                }
            })
            .collect();

        Ok(RunHistoryPage {
            entries,
            total_count,
        })
    }

    /// Clear all history, returning how many runs were removed
    pub fn clear(&self) -> Result<usize, HistoryError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM run_history", []).map_err(query_failed)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, HistoryError> {
        self.conn
            .lock()
            .map_err(|e| HistoryError::QueryFailed(e.to_string()))
    }
}

fn query_failed(e: rusqlite::Error) -> HistoryError {
    HistoryError::QueryFailed(e.to_string())
}

/// Rows with an unknown operation or id are dropped rather than failing the
/// whole listing.
fn read_row(row: &Row<'_>) -> rusqlite::Result<Option<RunRecord>> {
    let id: String = row.get(0)?;
    let operation: String = row.get(1)?;
    let started_at: i64 = row.get(2)?;
    let count: i64 = row.get(3)?;
    let duration_ms: i64 = row.get(4)?;
    let status: String = row.get(5)?;
    let error_message: Option<String> = row.get(6)?;

    let (Ok(id), Some(operation), Some(started_at)) = (
        Uuid::parse_str(&id),
        Operation::from_str(&operation),
        Utc.timestamp_millis_opt(started_at).single(),
    ) else {
        return Ok(None);
    };

    Ok(Some(RunRecord {
        id,
        operation,
        started_at,
        count: count as usize,
        duration_ms: duration_ms as u64,
        status: RunStatus::from_str(&status, error_message.as_deref()),
    }))
}
