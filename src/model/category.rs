use serde::{Deserialize, Serialize};

use super::task::Task;

/// Colors offered when creating a category. The first entry is the default.
pub const PRESET_COLORS: [&str; 15] = [
    "#FF6B9D", "#4ECDC4", "#95E1D3", "#FFA07A", "#9B59B6", "#3498DB", "#E74C3C", "#F39C12",
    "#2ECC71", "#1ABC9C", "#34495E", "#E67E22", "#16A085", "#8E44AD", "#C0392B",
];

/// A named, colored, ordered group of tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Opaque unique id, assigned at creation
    pub id: String,
    /// Display name (stored trimmed)
    pub name: String,
    /// Color token, usually a `#RRGGBB` hex string
    pub color: String,
    /// Tasks in user-chosen order
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// The full set of categories held by a session
pub type CategoryCollection = Vec<Category>;

impl Category {
    /// Create an empty category. `name` is trimmed.
    pub fn new(id: String, name: &str, color: &str) -> Self {
        Category {
            id,
            name: name.trim().to_string(),
            color: color.to_string(),
            tasks: Vec::new(),
        }
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }
}

/// Category names must be non-empty once surrounding whitespace is removed.
pub fn is_valid_category_name(name: &str) -> bool {
    !name.trim().is_empty()
}

/// The bootstrap collection used when no snapshot exists yet.
pub fn seed_categories() -> CategoryCollection {
    [
        ("1", "Client", "#FF6B9D"),
        ("2", "Biz System", "#4ECDC4"),
        ("3", "Web & Funnel", "#95E1D3"),
        ("4", "AI & Tech", "#FFA07A"),
        ("5", "Learning", "#9B59B6"),
        ("6", "Personal", "#3498DB"),
    ]
    .into_iter()
    .map(|(id, name, color)| Category::new(id.to_string(), name, color))
    .collect()
}
