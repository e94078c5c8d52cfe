//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};

/// All events emitted by archive operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Run-level lifecycle events
    Run(RunEvent),
    /// Per-item events
    Item(ItemEvent),
}

/// The caller-facing operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Backup,
    Organize,
    Undo,
    Prune,
    Relocate,
}

impl Operation {
    /// Stable storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Backup => "backup",
            Operation::Organize => "organize",
            Operation::Undo => "undo",
            Operation::Prune => "prune",
            Operation::Relocate => "relocate",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "backup" => Some(Operation::Backup),
            "organize" => Some(Operation::Organize),
            "undo" => Some(Operation::Undo),
            "prune" => Some(Operation::Prune),
            "relocate" => Some(Operation::Relocate),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Backup => write!(f, "Backing up"),
            Operation::Organize => write!(f, "Organizing"),
            Operation::Undo => write!(f, "Undoing organization"),
            Operation::Prune => write!(f, "Cleaning device"),
            Operation::Relocate => write!(f, "Moving archive"),
        }
    }
}

/// Lifecycle of one operation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEvent {
    /// The item list is known and processing begins
    Started { operation: Operation, total: usize },
    /// The run finished; always the last event of a successful run
    Completed { summary: RunSummary },
    /// The run stopped at a cancellation check
    Cancelled { operation: Operation },
    /// The run hit a fatal error
    Error { operation: Operation, message: String },
}

/// Per-item events, delivered in strict item order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ItemEvent {
    /// An item finished processing
    Progress(ItemProgress),
    /// An item was skipped without failing the run (e.g. the pull failed)
    Skipped {
        operation: Operation,
        name: String,
        reason: String,
    },
}

/// Progress after an item completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemProgress {
    pub operation: Operation,
    /// 1-based index of the item that just completed
    pub index: usize,
    pub total: usize,
    pub name: String,
}

/// Final outcome of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub operation: Operation,
    /// Files archived, moved, restored or deleted, depending on the operation
    pub count: usize,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Item(ItemEvent::Progress(ItemProgress {
            operation: Operation::Backup,
            index: 3,
            total: 10,
            name: "IMG_0003.jpg".to_string(),
        }));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Item(ItemEvent::Progress(p)) => {
                assert_eq!(p.index, 3);
                assert_eq!(p.name, "IMG_0003.jpg");
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn operation_names_round_trip() {
        for op in [
            Operation::Backup,
            Operation::Organize,
            Operation::Undo,
            Operation::Prune,
            Operation::Relocate,
        ] {
            assert_eq!(Operation::from_str(op.as_str()), Some(op));
        }
        assert_eq!(Operation::from_str("scan"), None);
    }
}
