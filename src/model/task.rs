use serde::{Deserialize, Serialize};

/// A single completable item inside a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Opaque unique id, assigned at creation
    pub id: String,
    /// Display text (stored trimmed)
    pub text: String,
    /// Completion flag
    #[serde(default)]
    pub completed: bool,
    /// Creation time in epoch milliseconds
    pub created_at: i64,
}

impl Task {
    /// Create a new, not-yet-completed task. `text` is trimmed.
    pub fn new(id: String, text: &str, created_at: i64) -> Self {
        Task {
            id,
            text: text.trim().to_string(),
            completed: false,
            created_at,
        }
    }
}

/// Task text must be non-empty once surrounding whitespace is removed.
pub fn is_valid_task_text(text: &str) -> bool {
    !text.trim().is_empty()
}
