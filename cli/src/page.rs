//! Wires user intents from the views to the store.
//!
//! Views report intents through `TodoActions` synchronously; the page
//! collects them and dispatches the matching store operations afterwards.
//! A failed operation is reported once: its message is taken out of the
//! store's error slot and returned to the caller.

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use todo_core::{
    FilterBar, FormSubmission, ItemView, ListView, OperationError, StatusChange, Todo, TodoActions, TodoForm,
    TodoStatus, TodoStore, Transport,
};
use tracing::{debug, warn};

use crate::cli::{AddArgs, EditArgs, ListArgs};
use crate::render;

/// Asks the user to confirm a destructive or surprising action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Terminal prompt, or an unconditional yes when `assume_yes` is set.
pub struct Prompt {
    pub assume_yes: bool,
}

impl Confirm for Prompt {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        match dialoguer::Confirm::new().with_prompt(prompt).default(false).interact() {
            Ok(answer) => answer,
            Err(err) => {
                warn!(%err, "confirmation prompt failed");
                false
            }
        }
    }
}

#[derive(Debug)]
enum Intent {
    Edit(Todo),
    Delete(String),
    ChangeStatus(String, TodoStatus),
}

#[derive(Debug, Default)]
struct Intents(Vec<Intent>);

impl TodoActions for Intents {
    fn on_edit(&mut self, todo: &Todo) {
        self.0.push(Intent::Edit(todo.clone()));
    }

    fn on_delete(&mut self, id: &str) {
        self.0.push(Intent::Delete(id.to_string()));
    }

    fn on_status_change(&mut self, id: &str, status: TodoStatus) {
        self.0.push(Intent::ChangeStatus(id.to_string(), status));
    }
}

pub struct TodoPage<T> {
    store: TodoStore<T>,
}

impl<T: Transport> TodoPage<T> {
    pub fn new(store: TodoStore<T>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &TodoStore<T> {
        &self.store
    }

    pub async fn list(&self, args: &ListArgs) -> Result<String> {
        let mut bar = FilterBar::new(self.store.read(|s| s.filter().clone()));
        bar.set_status(args.status, |filter| self.store.set_filter(filter));
        bar.set_search(args.search.as_deref().unwrap_or(""), |filter| self.store.set_filter(filter));
        bar.set_overdue_only(args.overdue, |filter| self.store.set_filter(filter));

        self.store.fetch_todos().await.map_err(|err| self.report(err))?;

        let now = Utc::now();
        let visible = self.store.visible_todos();
        Ok(render::list(&ListView::new(&visible, self.store.loading(), now)))
    }

    pub async fn show(&self, id: &str) -> Result<String> {
        let todo = self.store.fetch_todo(id).await.map_err(|err| self.report(err))?;
        Ok(render::item(&ItemView::new(&todo, Utc::now())))
    }

    pub async fn add(&self, args: &AddArgs) -> Result<Todo> {
        let mut form = TodoForm::create();
        form.title = args.title.clone();
        form.description = args.description.clone().unwrap_or_default();
        form.due_date = args.due;

        match form.submit()? {
            FormSubmission::Create(input) => self.store.create_todo(&input).await.map_err(|err| self.report(err)),
            FormSubmission::Update(_) => bail!("a new todo cannot be submitted as an update"),
        }
    }

    pub async fn edit(&self, args: &EditArgs) -> Result<Todo> {
        let todo = self.load(&args.id).await?;
        let mut intents = Intents::default();
        ItemView::new(&todo, Utc::now()).edit(&mut intents);
        self.dispatch(intents).await?;

        let mut form = TodoForm::from_initial(self.store.selected().as_ref());
        if let Some(title) = &args.title {
            form.title = title.clone();
        }
        if let Some(description) = &args.description {
            form.description = description.clone();
        }
        if args.clear_due {
            form.due_date = None;
        } else if args.due.is_some() {
            form.due_date = args.due;
        }

        let submission = match form.submit() {
            Ok(submission) => submission,
            Err(err) => {
                self.store.set_selected(None);
                return Err(err.into());
            }
        };
        match submission {
            FormSubmission::Update(input) => self.store.update_todo(&input).await.map_err(|err| self.report(err)),
            FormSubmission::Create(_) => bail!("editing must produce an update"),
        }
    }

    pub async fn change_status(&self, id: &str, target: TodoStatus, confirm: &dyn Confirm) -> Result<StatusChange> {
        let todo = self.load(id).await?;
        let mut intents = Intents::default();
        let outcome = ItemView::new(&todo, Utc::now()).change_status(
            target,
            |todo, target| confirm.confirm(&format!("\"{}\" is done. Move it back to {target}?", todo.title)),
            &mut intents,
        );
        self.dispatch(intents).await?;
        Ok(outcome)
    }

    /// Returns false when the user declined.
    pub async fn delete(&self, id: &str, confirm: &dyn Confirm) -> Result<bool> {
        let todo = self.load(id).await?;
        if !confirm.confirm("Are you sure you want to delete this todo?") {
            return Ok(false);
        }
        let mut intents = Intents::default();
        ItemView::new(&todo, Utc::now()).delete(&mut intents);
        self.dispatch(intents).await?;
        Ok(true)
    }

    async fn load(&self, id: &str) -> Result<Todo> {
        self.store.fetch_todos().await.map_err(|err| self.report(err))?;
        self.store
            .read(|s| s.items().iter().find(|todo| todo.id == id).cloned())
            .ok_or_else(|| anyhow!("Todo {id} not found"))
    }

    async fn dispatch(&self, intents: Intents) -> Result<()> {
        for intent in intents.0 {
            debug!(?intent, "dispatching intent");
            match intent {
                Intent::Edit(todo) => self.store.set_selected(Some(todo)),
                Intent::Delete(id) => self.store.delete_todo(&id).await.map_err(|err| self.report(err))?,
                Intent::ChangeStatus(id, status) => {
                    self.store
                        .update_todo_status(&id, status)
                        .await
                        .map_err(|err| self.report(err))?;
                }
            }
        }
        Ok(())
    }

    /// Take the failure out of the store's error slot so it is shown once.
    fn report(&self, err: OperationError) -> anyhow::Error {
        let message = self.store.error().unwrap_or(err.message);
        self.store.clear_error();
        anyhow!(message)
    }
}
