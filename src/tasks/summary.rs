use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::db::models::{Priority, Todo, DEFAULT_CATEGORY};

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    pub overdue: usize,
    pub by_priority: PriorityCounts,
    pub by_category: BTreeMap<String, usize>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Counts over one user's todos. Priority and category breakdowns only
/// include open todos.
pub fn stats(todos: &[Todo], today: NaiveDate) -> Stats {
    let mut stats = Stats {
        total: todos.len(),
        ..Default::default()
    };

    for todo in todos {
        if todo.completed {
            stats.completed += 1;
            continue;
        }
        stats.active += 1;
        if todo.is_overdue(today) {
            stats.overdue += 1;
        }
        match todo.priority {
            Priority::High => stats.by_priority.high += 1,
            Priority::Medium => stats.by_priority.medium += 1,
            Priority::Low => stats.by_priority.low += 1,
        }
        let category = if todo.category.is_empty() {
            "Uncategorized"
        } else {
            todo.category.as_str()
        };
        *stats.by_category.entry(category.to_string()).or_default() += 1;
    }

    stats
}

/// Distinct categories in order of first appearance.
pub fn categories(todos: &[Todo]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for todo in todos {
        let category = if todo.category.is_empty() {
            DEFAULT_CATEGORY
        } else {
            todo.category.as_str()
        };
        if !seen.iter().any(|c| c == category) {
            seen.push(category.to_string());
        }
    }
    seen
}
