//! In-memory task list and the only writer of the persisted task slot.

use db::{
    DBService,
    models::task::{Task, TaskId},
};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use tracing::{debug, warn};

/// View selector over the task sequence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TaskFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub completed: usize,
    pub total: usize,
}

/// Ordered task collection, newest first.
///
/// Every operation is total: blank titles and unknown ids are silent no-ops.
/// Mutations write the full sequence back to storage on a best-effort basis.
pub struct TaskListStore {
    db: DBService,
    tasks: Vec<Task>,
    input: String,
}

impl TaskListStore {
    /// Hydrates the store from the persisted slot.
    pub fn open(db: DBService) -> Self {
        let tasks = Task::load_all(db.storage.as_ref());
        Self {
            db,
            tasks,
            input: String::new(),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Adds the pending input as a task.
    pub fn submit(&mut self) -> Option<TaskId> {
        let title = std::mem::take(&mut self.input);
        let added = self.add(&title);
        if added.is_none() {
            self.input = title;
        }
        added
    }

    /// Prepends a new task and clears the pending input.
    ///
    /// Returns `None` without touching anything when `title` is blank.
    pub fn add(&mut self, title: &str) -> Option<TaskId> {
        let task = Task::new(title)?;
        let id = task.id.clone();
        debug!(task_id = %id, "Adding task");
        self.tasks.insert(0, task);
        self.input.clear();
        self.persist();
        Some(id)
    }

    pub fn toggle(&mut self, id: &str) {
        match self.tasks.iter_mut().find(|task| task.id == id) {
            Some(task) => task.completed = !task.completed,
            None => debug!(task_id = %id, "Toggle on unknown task ignored"),
        }
        self.persist();
    }

    pub fn remove(&mut self, id: &str) {
        self.tasks.retain(|task| task.id != id);
        self.persist();
    }

    /// Drops every completed task in one step.
    pub fn clear_completed(&mut self) {
        self.tasks.retain(|task| !task.completed);
        self.persist();
    }

    pub fn filtered_view(&self, filter: TaskFilter) -> Vec<&Task> {
        self.tasks.iter().filter(|task| filter.matches(task)).collect()
    }

    pub fn stats(&self) -> TaskStats {
        TaskStats {
            completed: self.tasks.iter().filter(|task| task.completed).count(),
            total: self.tasks.len(),
        }
    }

    /// Finds the single task whose id starts with `prefix` (ASCII case-insensitive).
    ///
    /// Returns `None` when no task or more than one task matches.
    pub fn resolve_id(&self, prefix: &str) -> Option<TaskId> {
        let prefix = prefix.trim().to_ascii_lowercase();
        if prefix.is_empty() {
            return None;
        }
        let mut matches = self
            .tasks
            .iter()
            .filter(|task| task.id.to_ascii_lowercase().starts_with(&prefix));
        let first = matches.next()?;
        match matches.next() {
            Some(_) => None,
            None => Some(first.id.clone()),
        }
    }

    fn persist(&self) {
        if let Err(e) = Task::save_all(self.db.storage.as_ref(), &self.tasks) {
            warn!(error = %e, "Failed to persist tasks");
        }
    }
}
