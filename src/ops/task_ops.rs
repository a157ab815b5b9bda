use crate::model::category::Category;
use crate::model::ids::{IdGenerator, now_millis};
use crate::model::task::{Task, is_valid_task_text};

/// Direction of a single-step reorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward index 0
    Up,
    /// Toward the end of the list
    Down,
}

// Every operation here takes the category by reference and returns a new
// value. Invalid input and unknown ids yield an unchanged clone.

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// Append a new task to the end of the category.
pub fn add_task(category: &Category, text: &str, ids: &mut IdGenerator) -> Category {
    let mut next = category.clone();
    if !is_valid_task_text(text) {
        return next;
    }
    next.tasks.push(Task::new(ids.next_id(), text, now_millis()));
    next
}

/// Flip the completion flag of a task.
pub fn toggle_task(category: &Category, task_id: &str) -> Category {
    let mut next = category.clone();
    if let Some(task) = next.tasks.iter_mut().find(|t| t.id == task_id) {
        task.completed = !task.completed;
    }
    next
}

/// Remove a task.
pub fn delete_task(category: &Category, task_id: &str) -> Category {
    let mut next = category.clone();
    next.tasks.retain(|t| t.id != task_id);
    next
}

/// Replace the text of a task, keeping its id, state and creation time.
pub fn edit_task_text(category: &Category, task_id: &str, text: &str) -> Category {
    let mut next = category.clone();
    if !is_valid_task_text(text) {
        return next;
    }
    if let Some(task) = next.tasks.iter_mut().find(|t| t.id == task_id) {
        task.text = text.trim().to_string();
    }
    next
}

// ---------------------------------------------------------------------------
// Reorder
// ---------------------------------------------------------------------------

/// Swap a task with its neighbor in `direction`.
///
/// One call moves the task by exactly one position. Already at the boundary
/// (first for `Up`, last for `Down`) or unknown id: unchanged.
pub fn move_task(category: &Category, task_id: &str, direction: Direction) -> Category {
    let mut next = category.clone();
    let Some(idx) = task_position(&next, task_id) else {
        return next;
    };
    let target = match direction {
        Direction::Up if idx > 0 => idx - 1,
        Direction::Down if idx + 1 < next.tasks.len() => idx + 1,
        _ => return next,
    };
    next.tasks.swap(idx, target);
    next
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

pub fn find_task<'a>(category: &'a Category, task_id: &str) -> Option<&'a Task> {
    category.tasks.iter().find(|t| t.id == task_id)
}

/// Index of a task within its category.
fn task_position(category: &Category, task_id: &str) -> Option<usize> {
    category.tasks.iter().position(|t| t.id == task_id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
