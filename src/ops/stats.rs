use crate::model::category::Category;

/// Completion figures for one category
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryProgress {
    pub completed: usize,
    pub total: usize,
    /// `completed / total`, or 0.0 for an empty category
    pub fraction: f64,
}

/// Totals across a whole collection
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub completed: usize,
    pub percent: u32,
    pub categories: Vec<(String, CategoryProgress)>,
}

pub fn total_tasks(categories: &[Category]) -> usize {
    categories.iter().map(|c| c.tasks.len()).sum()
}

pub fn completed_tasks(categories: &[Category]) -> usize {
    categories.iter().map(|c| c.completed_count()).sum()
}

/// Whole-number percentage of completed tasks, 0 when there are none.
pub fn percent_complete(categories: &[Category]) -> u32 {
    percent(completed_tasks(categories), total_tasks(categories))
}

pub fn category_progress(category: &Category) -> CategoryProgress {
    let completed = category.completed_count();
    let total = category.tasks.len();
    let fraction = if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64
    };
    CategoryProgress {
        completed,
        total,
        fraction,
    }
}

/// Compute every figure in one pass over the current collection.
pub fn summarize(categories: &[Category]) -> Summary {
    let per_category: Vec<(String, CategoryProgress)> = categories
        .iter()
        .map(|c| (c.id.clone(), category_progress(c)))
        .collect();
    let total = per_category.iter().map(|(_, p)| p.total).sum();
    let completed = per_category.iter().map(|(_, p)| p.completed).sum();
    Summary {
        total,
        completed,
        percent: percent(completed, total),
        categories: per_category,
    }
}

fn percent(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * completed as f64 / total as f64).round() as u32
}
