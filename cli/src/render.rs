//! Plain-text rendering of list and item views.

use std::fmt::Write;

use todo_core::{ItemView, ListView};

pub fn list(view: &ListView<'_>) -> String {
    match view {
        ListView::Loading => "Loading...\n".to_string(),
        ListView::Empty => "No todos found\n".to_string(),
        ListView::Items(items) => items.iter().map(item).collect(),
    }
}

pub fn item(view: &ItemView<'_>) -> String {
    let mut out = String::new();
    let mark = if view.is_completed() { "x" } else { " " };
    let _ = writeln!(
        out,
        "[{mark}] {title}  ({status}, id {id})",
        title = view.title(),
        status = view.status_label(),
        id = view.todo().id
    );
    if let Some(description) = view.description() {
        let _ = writeln!(out, "      {description}");
    }
    if let Some(due) = view.due_date() {
        let overdue = if view.is_overdue() { " (Overdue)" } else { "" };
        let _ = writeln!(out, "      due {}{overdue}", due.format("%Y-%m-%d"));
    }
    out
}
