//! Types for run history storage.

use crate::events::Operation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Cancelled,
    Error(String),
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Error(_) => "error",
        }
    }

    pub fn from_str(s: &str, error_msg: Option<&str>) -> Self {
        match s {
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            "error" => Self::Error(error_msg.unwrap_or("Unknown error").to_string()),
            _ => Self::Error(format!("Unknown status: {}", s)),
        }
    }
}

/// One operation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub operation: Operation,
    pub started_at: DateTime<Utc>,
    /// Files archived, moved or deleted, depending on the operation
    pub count: usize,
    pub duration_ms: u64,
    pub status: RunStatus,
}

impl RunRecord {
    /// A fresh record stamped now
    pub fn new(operation: Operation, count: usize, duration_ms: u64, status: RunStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            operation,
            started_at: Utc::now(),
            count,
            duration_ms,
            status,
        }
    }

    pub fn started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }
}

/// A page of run history, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunHistoryPage {
    pub entries: Vec<RunRecord>,
    pub total_count: usize,
}
