//! Client-side synchronization store.
//!
//! # Overview
//! `TodoStore` owns the authoritative in-memory collection, the active filter,
//! the selected todo and per-operation progress. Async operations go through
//! three steps:
//!
//! 1. pending: the operation's in-flight counter is raised and the error slot
//!    is cleared;
//! 2. the request built by `TodoClient` is executed by the `Transport`;
//! 3. settlement: the result is reconciled into the collection (fulfilled) or
//!    its message is written to the error slot (rejected).
//!
//! # Design
//! State sits behind a `std::sync::Mutex` that is only held for the pending
//! and settlement steps, never across an `.await`, so operations dispatched
//! concurrently interleave and settle in whatever order their responses
//! arrive. `loading` is derived from the in-flight counters rather than
//! stored, so overlapping operations cannot leave it stale.
//!
//! With `StoreConfig::serialize_writes`, writes that name an id wait on a
//! per-id async lock between pending and execution. The lock is dropped from
//! the table once no write for that id is running or waiting.
//!
//! A dispatch whose future is dropped before it settles (a timeout, a lost
//! `select!` branch, an aborted task) still lowers its in-flight counter; its
//! phase becomes `Cancelled` and the error slot is left alone.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::client::TodoClient;
use crate::config::{LoadingPolicy, StoreConfig};
use crate::error::{ApiError, OperationError};
use crate::filter::{apply_filter, TodoFilter};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{CreateTodo, Todo, TodoStatus, UpdateTodo};

/// The asynchronous operations the store can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchAll,
    FetchOne,
    Create,
    Update,
    UpdateStatus,
    Delete,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::FetchAll => "fetch_todos",
            Operation::FetchOne => "fetch_todo",
            Operation::Create => "create_todo",
            Operation::Update => "update_todo",
            Operation::UpdateStatus => "update_todo_status",
            Operation::Delete => "delete_todo",
        }
    }

    /// Stored in the error slot when the underlying failure has no message.
    pub fn fallback_message(self) -> &'static str {
        match self {
            Operation::FetchAll => "Failed to fetch todos",
            Operation::FetchOne => "Failed to fetch todo",
            Operation::Create => "Failed to create todo",
            Operation::Update => "Failed to update todo",
            Operation::UpdateStatus => "Failed to update todo status",
            Operation::Delete => "Failed to delete todo",
        }
    }
}

/// Outcome of the most recent dispatch of one operation kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Fulfilled,
    Rejected(String),
    /// The dispatching future was dropped before a response was reconciled.
    Cancelled,
}

#[derive(Debug, Clone, Default)]
struct Progress {
    in_flight: usize,
    phase: Option<Phase>,
}

/// Everything the UI layer reads.
#[derive(Debug, Clone, Default)]
pub struct TodoState {
    items: Vec<Todo>,
    error: Option<String>,
    filter: TodoFilter,
    selected: Option<Todo>,
    progress: HashMap<Operation, Progress>,
    loading_policy: LoadingPolicy,
}

impl TodoState {
    pub fn new(loading_policy: LoadingPolicy) -> Self {
        Self {
            loading_policy,
            ..Self::default()
        }
    }

    pub fn items(&self) -> &[Todo] {
        &self.items
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn filter(&self) -> &TodoFilter {
        &self.filter
    }

    pub fn selected(&self) -> Option<&Todo> {
        self.selected.as_ref()
    }

    /// True while any operation counted by the loading policy is in flight.
    pub fn loading(&self) -> bool {
        self.progress
            .iter()
            .any(|(op, progress)| progress.in_flight > 0 && self.loading_policy.tracks(*op))
    }

    /// `None` until the operation has been dispatched once.
    ///
    /// While dispatches of the same kind overlap the phase stays `Pending`,
    /// and only the one that settles last records its outcome. An earlier
    /// rejection can therefore show as `Fulfilled` here while its message is
    /// still in the error slot; read `error` for failures.
    pub fn phase(&self, operation: Operation) -> Option<&Phase> {
        self.progress.get(&operation).and_then(|p| p.phase.as_ref())
    }

    pub fn in_flight(&self, operation: Operation) -> usize {
        self.progress.get(&operation).map_or(0, |p| p.in_flight)
    }

    pub fn visible_at(&self, now: DateTime<Utc>) -> Vec<&Todo> {
        apply_filter(&self.items, &self.filter, now)
    }

    fn begin(&mut self, operation: Operation) {
        let progress = self.progress.entry(operation).or_default();
        progress.in_flight += 1;
        progress.phase = Some(Phase::Pending);
        self.error = None;
    }

    fn settle(&mut self, operation: Operation, outcome: Phase) {
        let progress = self.progress.entry(operation).or_default();
        progress.in_flight = progress.in_flight.saturating_sub(1);
        // an overlapping dispatch of the same kind is still running
        if progress.in_flight == 0 {
            progress.phase = Some(outcome);
        }
    }

    fn abandon(&mut self, operation: Operation) {
        let progress = self.progress.entry(operation).or_default();
        progress.in_flight = progress.in_flight.saturating_sub(1);
        if progress.in_flight == 0 && progress.phase == Some(Phase::Pending) {
            progress.phase = Some(Phase::Cancelled);
        }
    }

    fn reject(&mut self, operation: Operation, message: String) {
        self.settle(operation, Phase::Rejected(message.clone()));
        self.error = Some(message);
    }

    fn replace_all(&mut self, items: Vec<Todo>) {
        self.items = items;
    }

    fn insert_front(&mut self, todo: Todo) {
        self.items.insert(0, todo);
    }

    /// Replaces the first item with a matching id. Returns false (and changes
    /// nothing) when the id is not in the collection.
    fn replace(&mut self, todo: Todo) -> bool {
        match self.items.iter_mut().find(|item| item.id == todo.id) {
            Some(slot) => {
                *slot = todo;
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, id: &str) {
        self.items.retain(|item| item.id != id);
        if self.selected.as_ref().is_some_and(|s| s.id == id) {
            self.selected = None;
        }
    }
}

type WriteLocks = Mutex<HashMap<String, Arc<AsyncMutex<()>>>>;

/// Keeps an operation counted as in flight until it settles or is dropped.
struct InFlight<'a> {
    state: &'a Mutex<TodoState>,
    operation: Operation,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn begin(state: &'a Mutex<TodoState>, operation: Operation) -> Self {
        lock(state).begin(operation);
        Self {
            state,
            operation,
            settled: false,
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!(operation = self.operation.name(), "dropped before settling");
            lock(self.state).abandon(self.operation);
        }
    }
}

/// Holds the per-id write lock; removes the table entry when the last user
/// of it lets go.
struct WriteSlot<'a> {
    locks: &'a WriteLocks,
    id: &'a str,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for WriteSlot<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = lock(self.locks);
        if locks.get(self.id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(self.id);
        }
    }
}

/// Explicit state container shared with the UI layer by reference or `Arc`.
pub struct TodoStore<T> {
    client: TodoClient,
    transport: T,
    config: StoreConfig,
    state: Mutex<TodoState>,
    write_locks: WriteLocks,
}

impl<T: Transport> TodoStore<T> {
    pub fn new(client: TodoClient, transport: T) -> Self {
        Self::with_config(client, transport, StoreConfig::default())
    }

    pub fn with_config(client: TodoClient, transport: T, config: StoreConfig) -> Self {
        Self {
            client,
            transport,
            config,
            state: Mutex::new(TodoState::new(config.loading_policy)),
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> StoreConfig {
        self.config
    }

    /// Run `f` against the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&TodoState) -> R) -> R {
        f(&self.lock_state())
    }

    pub fn snapshot(&self) -> TodoState {
        self.lock_state().clone()
    }

    pub fn loading(&self) -> bool {
        self.read(TodoState::loading)
    }

    pub fn error(&self) -> Option<String> {
        self.read(|state| state.error.clone())
    }

    pub fn selected(&self) -> Option<Todo> {
        self.read(|state| state.selected.clone())
    }

    /// The collection narrowed by the active filter, evaluated against the
    /// wall clock at call time.
    pub fn visible_todos(&self) -> Vec<Todo> {
        let now = Utc::now();
        self.read(|state| state.visible_at(now).into_iter().cloned().collect())
    }

    pub fn set_filter(&self, filter: TodoFilter) {
        self.lock_state().filter = filter;
    }

    pub fn clear_filter(&self) {
        self.lock_state().filter = TodoFilter::default();
    }

    pub fn set_selected(&self, todo: Option<Todo>) {
        self.lock_state().selected = todo;
    }

    pub fn clear_error(&self) {
        self.lock_state().error = None;
    }

    /// Replace the collection with the server's list.
    pub async fn fetch_todos(&self) -> Result<Vec<Todo>, OperationError> {
        let request = Ok(self.client.build_list_todos());
        self.dispatch(
            Operation::FetchAll,
            None,
            request,
            |client, response| client.parse_list_todos(response),
            |state, items| state.replace_all(items.clone()),
        )
        .await
    }

    /// Fetch one todo. If it is already in the collection it is refreshed in
    /// place; it is never inserted.
    pub async fn fetch_todo(&self, id: &str) -> Result<Todo, OperationError> {
        let request = Ok(self.client.build_get_todo(id));
        self.dispatch(
            Operation::FetchOne,
            None,
            request,
            |client, response| client.parse_get_todo(response),
            |state, todo| {
                state.replace(todo.clone());
            },
        )
        .await
    }

    /// Create a todo; the server's copy is inserted at the front.
    pub async fn create_todo(&self, input: &CreateTodo) -> Result<Todo, OperationError> {
        let request = self.client.build_create_todo(input);
        self.dispatch(
            Operation::Create,
            None,
            request,
            |client, response| client.parse_create_todo(response),
            |state, todo| state.insert_front(todo.clone()),
        )
        .await
    }

    /// Replace the editable fields of a todo and leave edit mode.
    pub async fn update_todo(&self, input: &UpdateTodo) -> Result<Todo, OperationError> {
        let request = self.client.build_update_todo(input);
        self.dispatch(
            Operation::Update,
            Some(&input.id),
            request,
            |client, response| client.parse_update_todo(response),
            |state, todo| {
                if !state.replace(todo.clone()) {
                    debug!(id = %todo.id, "updated todo is not in the collection");
                }
                state.selected = None;
            },
        )
        .await
    }

    pub async fn update_todo_status(&self, id: &str, status: TodoStatus) -> Result<Todo, OperationError> {
        let request = self.client.build_update_todo_status(id, status);
        self.dispatch(
            Operation::UpdateStatus,
            Some(id),
            request,
            |client, response| client.parse_update_todo_status(response),
            |state, todo| {
                state.replace(todo.clone());
            },
        )
        .await
    }

    /// Delete a todo; clears the selection if it pointed at the deleted item.
    pub async fn delete_todo(&self, id: &str) -> Result<(), OperationError> {
        let request = Ok(self.client.build_delete_todo(id));
        self.dispatch(
            Operation::Delete,
            Some(id),
            request,
            |client, response| client.parse_delete_todo(response),
            |state, _| state.remove(id),
        )
        .await
    }

    async fn dispatch<R>(
        &self,
        operation: Operation,
        target: Option<&str>,
        request: Result<HttpRequest, ApiError>,
        parse: impl FnOnce(&TodoClient, HttpResponse) -> Result<R, ApiError>,
        reconcile: impl FnOnce(&mut TodoState, &R),
    ) -> Result<R, OperationError> {
        let mut in_flight = InFlight::begin(&self.state, operation);

        let _write_slot = match target {
            Some(id) if self.config.serialize_writes => Some(self.write_slot(id).await),
            _ => None,
        };

        let outcome = match request {
            Ok(request) => {
                debug!(operation = operation.name(), method = %request.method, url = %request.path, "dispatching");
                match self.transport.execute(request).await {
                    Ok(response) => parse(&self.client, response),
                    Err(err) => Err(err),
                }
            }
            Err(err) => Err(err),
        };

        let mut state = self.lock_state();
        in_flight.settled = true;
        match outcome {
            Ok(value) => {
                state.settle(operation, Phase::Fulfilled);
                reconcile(&mut state, &value);
                debug!(operation = operation.name(), items = state.items.len(), "fulfilled");
                Ok(value)
            }
            Err(err) => {
                let failure = OperationError::from_api(operation, &err);
                warn!(operation = operation.name(), error = %failure.message, "rejected");
                state.reject(operation, failure.message.clone());
                Err(failure)
            }
        }
    }

    async fn write_slot<'a>(&'a self, id: &'a str) -> WriteSlot<'a> {
        let write_lock = Arc::clone(lock(&self.write_locks).entry(id.to_string()).or_default());
        let guard = write_lock.lock_owned().await;
        WriteSlot {
            locks: &self.write_locks,
            id,
            guard: Some(guard),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, TodoState> {
        lock(&self.state)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
