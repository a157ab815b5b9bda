use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::model::category::{Category, PRESET_COLORS};
use crate::model::task::Task;
use crate::ops::stats::{CategoryProgress, Summary};
use crate::session::identity::Identity;

const BAR_WIDTH: usize = 10;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub created: Option<String>,
}

#[derive(Serialize)]
pub struct CategoryJson {
    pub id: String,
    pub name: String,
    pub color: String,
    pub completed: usize,
    pub total: usize,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct StatsJson {
    pub total: usize,
    pub completed: usize,
    pub percent: u32,
    pub categories: Vec<CategoryStatsJson>,
}

#[derive(Serialize)]
pub struct CategoryStatsJson {
    pub id: String,
    pub name: String,
    pub completed: usize,
    pub total: usize,
    pub fraction: f64,
}

#[derive(Serialize)]
pub struct WhoamiJson {
    pub signed_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,
}

/// Result of a command that may create something
#[derive(Serialize)]
pub struct ChangeJson {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Serialize)]
pub struct ColorJson {
    pub index: usize,
    pub color: &'static str,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn millis_to_rfc3339(ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
}

pub fn task_to_json(task: &Task) -> TaskJson {
    TaskJson {
        id: task.id.clone(),
        text: task.text.clone(),
        completed: task.completed,
        created: millis_to_rfc3339(task.created_at),
    }
}

pub fn category_to_json(category: &Category) -> CategoryJson {
    CategoryJson {
        id: category.id.clone(),
        name: category.name.clone(),
        color: category.color.clone(),
        completed: category.completed_count(),
        total: category.tasks.len(),
        tasks: category.tasks.iter().map(task_to_json).collect(),
    }
}

pub fn stats_to_json(categories: &[Category], summary: &Summary) -> StatsJson {
    StatsJson {
        total: summary.total,
        completed: summary.completed,
        percent: summary.percent,
        categories: categories
            .iter()
            .zip(&summary.categories)
            .map(|(c, (_, p))| CategoryStatsJson {
                id: c.id.clone(),
                name: c.name.clone(),
                completed: p.completed,
                total: p.total,
                fraction: p.fraction,
            })
            .collect(),
    }
}

pub fn palette_to_json() -> Vec<ColorJson> {
    PRESET_COLORS
        .iter()
        .enumerate()
        .map(|(i, &color)| ColorJson {
            index: i + 1,
            color,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// Right-pad `s` with spaces to `width` terminal columns.
pub fn pad_display(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    format!("{}{}", s, " ".repeat(width.saturating_sub(w)))
}

/// `[####------]` style bar for a 0.0..=1.0 fraction.
pub fn progress_bar(fraction: f64) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled)
    )
}

pub fn format_task_line(task: &Task) -> String {
    let check = if task.completed { "x" } else { " " };
    format!("  [{}] {}  {}", check, task.id, task.text)
}

/// A category header followed by its tasks, one per line.
pub fn format_category(category: &Category) -> String {
    let mut lines = vec![format!(
        "{} ({})  {}/{}  {}",
        category.name,
        category.id,
        category.completed_count(),
        category.tasks.len(),
        category.color
    )];
    if category.tasks.is_empty() {
        lines.push("  (no tasks)".to_string());
    }
    lines.extend(category.tasks.iter().map(format_task_line));
    lines.join("\n")
}

/// The stats table: one row per category plus a total row.
pub fn format_stats(categories: &[Category], summary: &Summary) -> String {
    let name_w = categories
        .iter()
        .map(|c| UnicodeWidthStr::width(c.name.as_str()))
        .max()
        .unwrap_or(0)
        .max("Category".len());

    let row = |name: &str, p: &CategoryProgress| {
        format!(
            "{}  {:>4}  {:>5}  {}  {:>3}%",
            pad_display(name, name_w),
            p.completed,
            p.total,
            progress_bar(p.fraction),
            (p.fraction * 100.0).round() as u32,
        )
    };

    let mut lines = vec![format!(
        "{}  {:>4}  {:>5}  Progress",
        pad_display("Category", name_w),
        "Done",
        "Total"
    )];
    for (category, (_, progress)) in categories.iter().zip(&summary.categories) {
        lines.push(row(&category.name, progress));
    }

    let overall = CategoryProgress {
        completed: summary.completed,
        total: summary.total,
        fraction: if summary.total == 0 {
            0.0
        } else {
            summary.completed as f64 / summary.total as f64
        },
    };
    lines.push(String::new());
    lines.push(row("Total", &overall));
    lines.join("\n")
}

pub fn format_palette() -> String {
    PRESET_COLORS
        .iter()
        .enumerate()
        .map(|(i, color)| format!("{:>2}  {}", i + 1, color))
        .collect::<Vec<_>>()
        .join("\n")
}
