use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Done,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    fn set_status(&mut self, status: Status) {
        self.status = status;
        self.is_completed = status == Status::Done;
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodo {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct UpdateStatus {
    pub status: Status,
}

/// Todos in insertion order.
pub type Db = Arc<RwLock<Vec<Todo>>>;

type ApiResult<T> = Result<T, (StatusCode, String)>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Vec::new()));
    let todos = Router::new()
        .route("/todos", get(list_todos).post(create_todo).put(update_todo))
        .route("/todos/{id}", get(get_todo).delete(delete_todo))
        .route("/todos/{id}/status", patch(update_status))
        .with_state(db);
    Router::new().nest("/api", todos)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn not_found(id: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("Todo {id} not found"))
}

fn require_title(title: &str) -> ApiResult<()> {
    if title.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Title is required".to_string()));
    }
    Ok(())
}

async fn list_todos(State(db): State<Db>) -> Json<Vec<Todo>> {
    Json(db.read().await.clone())
}

async fn create_todo(State(db): State<Db>, Json(input): Json<CreateTodo>) -> ApiResult<(StatusCode, Json<Todo>)> {
    require_title(&input.title)?;
    let now = Utc::now();
    let todo = Todo {
        id: Uuid::new_v4(),
        title: input.title,
        description: input.description,
        status: Status::Todo,
        due_date: input.due_date,
        is_completed: false,
        created_by: None,
        updated_by: None,
        created_at: now,
        updated_at: now,
    };
    db.write().await.push(todo.clone());
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo(State(db): State<Db>, Path(id): Path<Uuid>) -> ApiResult<Json<Todo>> {
    let todos = db.read().await;
    todos
        .iter()
        .find(|todo| todo.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found(id))
}

async fn update_todo(State(db): State<Db>, Json(input): Json<UpdateTodo>) -> ApiResult<Json<Todo>> {
    let id: Uuid = input
        .id
        .parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, format!("Invalid id: {}", input.id)))?;
    require_title(&input.title)?;

    let mut todos = db.write().await;
    let todo = todos.iter_mut().find(|todo| todo.id == id).ok_or_else(|| not_found(id))?;
    todo.title = input.title;
    todo.description = input.description;
    todo.due_date = input.due_date;
    todo.updated_at = Utc::now();
    Ok(Json(todo.clone()))
}

async fn update_status(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateStatus>,
) -> ApiResult<Json<Todo>> {
    let mut todos = db.write().await;
    let todo = todos.iter_mut().find(|todo| todo.id == id).ok_or_else(|| not_found(id))?;
    todo.set_status(input.status);
    todo.updated_at = Utc::now();
    Ok(Json(todo.clone()))
}

async fn delete_todo(State(db): State<Db>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    let mut todos = db.write().await;
    let index = todos.iter().position(|todo| todo.id == id).ok_or_else(|| not_found(id))?;
    todos.remove(index);
    Ok(StatusCode::NO_CONTENT)
}
