use std::collections::HashSet;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::slot::{SlotStorage, StorageError};

/// Slot holding the serialized task sequence.
pub const TASKS_SLOT: &str = "focus-todo-items";

/// Opaque task identifier. New tasks get a v4 UUID; loaded ids are kept as-is.
pub type TaskId = String;

/// One to-do item.
///
/// `id` never changes once assigned and `title` is trimmed and non-empty;
/// both are checked when a task is created or loaded, never on mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub completed: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Builds a fresh, not-yet-completed task, or `None` when `title` is blank.
    pub fn new(title: &str) -> Option<Self> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        Some(Self {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            completed: false,
            // Persisted with millisecond precision.
            created_at: Utc::now().trunc_subsecs(3),
        })
    }

    /// Reads the persisted task sequence.
    ///
    /// Missing, unreadable and malformed slots all read as an empty list.
    /// Individual records that do not parse, have a blank title or repeat an
    /// earlier id are dropped without affecting the rest.
    pub fn load_all(storage: &dyn SlotStorage) -> Vec<Task> {
        let raw = match storage.get(TASKS_SLOT) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read task slot, starting empty");
                return Vec::new();
            }
        };

        let records: Vec<Value> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Discarding malformed task slot");
                return Vec::new();
            }
        };

        let loaded = records.len();
        let mut seen = HashSet::with_capacity(loaded);
        let tasks: Vec<Task> = records
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<Task>(record) {
                Ok(task) => Some(task),
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable task record");
                    None
                }
            })
            .filter(|task| !task.title.trim().is_empty() && seen.insert(task.id.clone()))
            .collect();

        if tasks.len() != loaded {
            warn!(
                dropped = loaded - tasks.len(),
                "Dropped invalid task records from slot"
            );
        }
        debug!(count = tasks.len(), "Loaded tasks");
        tasks
    }

    /// Writes a snapshot of the full sequence, replacing whatever was stored.
    pub fn save_all(storage: &dyn SlotStorage, tasks: &[Task]) -> Result<(), StorageError> {
        // Serializing a Vec of plain fields cannot fail.
        let json = serde_json::to_string(tasks).unwrap_or_else(|_| "[]".to_string());
        storage.set(TASKS_SLOT, &json)
    }
}
