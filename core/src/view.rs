//! Renderer-agnostic contracts for the list, item, filter bar and form.
//!
//! Nothing here draws anything. Each type derives what a renderer needs from
//! store data and turns user intents into callbacks or payloads, so any front
//! end (terminal, web, native) can sit on top.

use chrono::{DateTime, Utc};

use crate::error::FormError;
use crate::filter::TodoFilter;
use crate::types::{CreateTodo, Todo, TodoStatus, UpdateTodo};

/// Callbacks an item or list forwards to the page controller.
pub trait TodoActions {
    fn on_edit(&mut self, todo: &Todo);
    fn on_delete(&mut self, id: &str);
    fn on_status_change(&mut self, id: &str, status: TodoStatus);
}

/// What happened to a requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// The callback fired.
    Applied,
    /// Reopening a done item was declined; nothing fired.
    Declined,
    /// The target equals the current status; nothing fired.
    Unchanged,
}

/// Display data for one todo.
#[derive(Debug, Clone, Copy)]
pub struct ItemView<'a> {
    todo: &'a Todo,
    now: DateTime<Utc>,
}

impl<'a> ItemView<'a> {
    pub fn new(todo: &'a Todo, now: DateTime<Utc>) -> Self {
        Self { todo, now }
    }

    pub fn todo(&self) -> &'a Todo {
        self.todo
    }

    pub fn title(&self) -> &'a str {
        &self.todo.title
    }

    pub fn description(&self) -> Option<&'a str> {
        self.todo.description.as_deref().filter(|d| !d.is_empty())
    }

    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        self.todo.due_date
    }

    pub fn status_label(&self) -> &'static str {
        self.todo.status.label()
    }

    pub fn is_completed(&self) -> bool {
        self.todo.is_completed()
    }

    pub fn is_overdue(&self) -> bool {
        self.todo.is_overdue_at(self.now)
    }

    /// One trigger per status other than the current one.
    pub fn status_targets(&self) -> Vec<TodoStatus> {
        TodoStatus::ALL
            .into_iter()
            .filter(|status| *status != self.todo.status)
            .collect()
    }

    pub fn edit(&self, actions: &mut impl TodoActions) {
        actions.on_edit(self.todo);
    }

    pub fn delete(&self, actions: &mut impl TodoActions) {
        actions.on_delete(&self.todo.id);
    }

    /// Moving a done item back to an open status asks `confirm` first; every
    /// other transition fires immediately.
    pub fn change_status(
        &self,
        target: TodoStatus,
        confirm: impl FnOnce(&Todo, TodoStatus) -> bool,
        actions: &mut impl TodoActions,
    ) -> StatusChange {
        if target == self.todo.status {
            return StatusChange::Unchanged;
        }
        if self.todo.status == TodoStatus::Done && !confirm(self.todo, target) {
            return StatusChange::Declined;
        }
        actions.on_status_change(&self.todo.id, target);
        StatusChange::Applied
    }
}

/// What the list shows. Loading wins over empty.
#[derive(Debug, Clone)]
pub enum ListView<'a> {
    Loading,
    Empty,
    Items(Vec<ItemView<'a>>),
}

impl<'a> ListView<'a> {
    pub fn new<I>(todos: I, loading: bool, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a Todo>,
    {
        if loading {
            return ListView::Loading;
        }
        let items: Vec<ItemView<'a>> = todos.into_iter().map(|todo| ItemView::new(todo, now)).collect();
        if items.is_empty() {
            ListView::Empty
        } else {
            ListView::Items(items)
        }
    }

    pub fn items(&self) -> &[ItemView<'a>] {
        match self {
            ListView::Items(items) => items,
            ListView::Loading | ListView::Empty => &[],
        }
    }
}

/// Filter controls. Each setter emits the whole filter with one field changed.
#[derive(Debug, Clone, Default)]
pub struct FilterBar {
    current: TodoFilter,
}

impl FilterBar {
    pub fn new(current: TodoFilter) -> Self {
        Self { current }
    }

    pub fn current(&self) -> &TodoFilter {
        &self.current
    }

    pub fn set_status(&mut self, status: Option<TodoStatus>, on_change: impl FnOnce(TodoFilter)) {
        self.current.status = status;
        on_change(self.current.clone());
    }

    /// An empty search box clears the term.
    pub fn set_search(&mut self, text: &str, on_change: impl FnOnce(TodoFilter)) {
        self.current.search_term = (!text.is_empty()).then(|| text.to_string());
        on_change(self.current.clone());
    }

    pub fn set_overdue_only(&mut self, checked: bool, on_change: impl FnOnce(TodoFilter)) {
        self.current.overdue = checked;
        on_change(self.current.clone());
    }
}

/// Payload produced by a valid form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormSubmission {
    Create(CreateTodo),
    Update(UpdateTodo),
}

/// Create/edit form state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoForm {
    editing: Option<String>,
    pub title: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
}

impl TodoForm {
    pub fn create() -> Self {
        Self::default()
    }

    /// Edit mode, prefilled from `todo`.
    pub fn edit(todo: &Todo) -> Self {
        Self {
            editing: Some(todo.id.clone()),
            title: todo.title.clone(),
            description: todo.description.clone().unwrap_or_default(),
            due_date: todo.due_date,
        }
    }

    pub fn from_initial(initial: Option<&Todo>) -> Self {
        initial.map_or_else(Self::create, Self::edit)
    }

    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    pub fn validate(&self) -> Result<(), FormError> {
        if self.title.trim().is_empty() {
            return Err(FormError::EmptyTitle);
        }
        Ok(())
    }

    pub fn submit(&self) -> Result<FormSubmission, FormError> {
        self.validate()?;
        let title = self.title.clone();
        let description = (!self.description.trim().is_empty()).then(|| self.description.clone());
        let due_date = self.due_date;

        Ok(match &self.editing {
            Some(id) => FormSubmission::Update(UpdateTodo {
                id: id.clone(),
                title,
                description,
                due_date,
            }),
            None => FormSubmission::Create(CreateTodo {
                title,
                description,
                due_date,
            }),
        })
    }
}
