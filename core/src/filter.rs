//! Derivation of the visible subset of todos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Todo, TodoStatus};

/// Active view predicate. Replaced wholesale on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TodoStatus>,
    #[serde(default)]
    pub overdue: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
}

impl TodoFilter {
    /// An empty search term is treated as no search term.
    pub fn search_term(&self) -> Option<&str> {
        self.search_term.as_deref().filter(|term| !term.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && !self.overdue && self.search_term().is_none()
    }
}

/// Keep the items that satisfy every active criterion, preserving order.
///
/// Criteria are checked in order: status, search term (case-insensitive
/// substring of title or description), overdue as of `now`.
pub fn apply_filter<'a>(items: &'a [Todo], filter: &TodoFilter, now: DateTime<Utc>) -> Vec<&'a Todo> {
    let needle = filter.search_term().map(str::to_lowercase);

    items
        .iter()
        .filter(|todo| filter.status.map_or(true, |status| todo.status == status))
        .filter(|todo| match &needle {
            Some(needle) => matches_search(todo, needle),
            None => true,
        })
        .filter(|todo| !filter.overdue || is_overdue_candidate(todo, now))
        .collect()
}

fn matches_search(todo: &Todo, needle: &str) -> bool {
    todo.title.to_lowercase().contains(needle)
        || todo
            .description
            .as_deref()
            .is_some_and(|description| description.to_lowercase().contains(needle))
}

fn is_overdue_candidate(todo: &Todo, now: DateTime<Utc>) -> bool {
    match todo.due_date {
        Some(due) if todo.status != TodoStatus::Done => due < now,
        _ => false,
    }
}
