//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Any 2xx status counts as success; anything else becomes `ApiError::Http`
//! carrying the raw body.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateTodo, StatusUpdate, Todo, TodoStatus, UpdateTodo};

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_list_todos(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/todos", None)
    }

    /// The id is appended to the path verbatim, without percent-encoding.
    /// Server-assigned ids are UUIDs; an id containing `/`, `?` or `#` would
    /// address a different resource. The same holds for
    /// `build_update_todo_status` and `build_delete_todo`.
    pub fn build_get_todo(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/todos/{id}"), None)
    }

    pub fn build_create_todo(&self, input: &CreateTodo) -> Result<HttpRequest, ApiError> {
        Ok(self.request(HttpMethod::Post, "/todos", Some(to_json(input)?)))
    }

    /// The id travels in the body; the path is the collection itself.
    pub fn build_update_todo(&self, input: &UpdateTodo) -> Result<HttpRequest, ApiError> {
        Ok(self.request(HttpMethod::Put, "/todos", Some(to_json(input)?)))
    }

    pub fn build_update_todo_status(&self, id: &str, status: TodoStatus) -> Result<HttpRequest, ApiError> {
        let body = to_json(&StatusUpdate { status })?;
        Ok(self.request(HttpMethod::Patch, &format!("/todos/{id}/status"), Some(body)))
    }

    pub fn build_delete_todo(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/todos/{id}"), None)
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<Todo>, ApiError> {
        parse_json(response)
    }

    pub fn parse_get_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_json(response)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_json(response)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_json(response)
    }

    pub fn parse_update_todo_status(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_json(response)
    }

    /// The body of a successful delete is ignored.
    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    fn request(&self, method: HttpMethod, resource: &str, body: Option<String>) -> HttpRequest {
        HttpRequest {
            method,
            path: format!("{}{resource}", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body,
        }
    }
}

fn to_json<T: Serialize>(input: &T) -> Result<String, ApiError> {
    serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map non-2xx status codes to `ApiError::Http`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TODO_JSON: &str = r#"{"id":"1","title":"Test","status":"Todo","isCompleted":false,"createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-01T00:00:00Z"}"#;

    fn client() -> TodoClient {
        TodoClient::new("http://localhost:5000/api")
    }

    fn json_header() -> Vec<(String, String)> {
        vec![("content-type".to_string(), "application/json".to_string())]
    }

    #[test]
    fn build_list_todos_produces_correct_request() {
        let req = client().build_list_todos();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:5000/api/todos");
        assert!(req.body.is_none());
        assert_eq!(req.headers, json_header());
    }

    #[test]
    fn build_get_todo_produces_correct_request() {
        let req = client().build_get_todo("abc");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:5000/api/todos/abc");
        assert!(req.body.is_none());
    }

    #[test]
    fn ids_are_placed_in_paths_verbatim() {
        let id = "a/b";
        assert_eq!(client().build_get_todo(id).path, "http://localhost:5000/api/todos/a/b");
        assert_eq!(client().build_delete_todo(id).path, "http://localhost:5000/api/todos/a/b");
    }

    #[test]
    fn build_create_todo_produces_correct_request() {
        let input = CreateTodo {
            title: "Buy milk".to_string(),
            description: Some("2 litres".to_string()),
            due_date: None,
        };
        let req = client().build_create_todo(&input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:5000/api/todos");
        assert_eq!(req.headers, json_header());
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["title"], "Buy milk");
        assert_eq!(body["description"], "2 litres");
        assert!(body.get("dueDate").is_none());
    }

    #[test]
    fn build_update_todo_puts_to_collection_with_id_in_body() {
        let input = UpdateTodo {
            id: "7".to_string(),
            title: "Updated".to_string(),
            description: None,
            due_date: Some("2024-03-01T00:00:00Z".parse().unwrap()),
        };
        let req = client().build_update_todo(&input).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "http://localhost:5000/api/todos");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["id"], "7");
        assert_eq!(body["dueDate"], "2024-03-01T00:00:00Z");
    }

    #[test]
    fn build_update_todo_status_patches_status_resource() {
        let req = client().build_update_todo_status("7", TodoStatus::Done).unwrap();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.path, "http://localhost:5000/api/todos/7/status");
        assert_eq!(req.body.as_deref(), Some(r#"{"status":"Done"}"#));
    }

    #[test]
    fn build_delete_todo_produces_correct_request() {
        let req = client().build_delete_todo("7");
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.path, "http://localhost:5000/api/todos/7");
        assert!(req.body.is_none());
    }

    #[test]
    fn parse_list_todos_success() {
        let response = HttpResponse::new(200, format!("[{TODO_JSON}]"));
        let todos = client().parse_list_todos(response).unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "Test");
    }

    #[test]
    fn parse_create_todo_accepts_any_2xx() {
        let todo = client().parse_create_todo(HttpResponse::new(201, TODO_JSON)).unwrap();
        assert_eq!(todo.id, "1");
        let todo = client().parse_create_todo(HttpResponse::new(200, TODO_JSON)).unwrap();
        assert_eq!(todo.id, "1");
    }

    #[test]
    fn parse_get_todo_not_found_carries_body() {
        let err = client()
            .parse_get_todo(HttpResponse::new(404, "Todo 1 not found"))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Todo 1 not found");
    }

    #[test]
    fn parse_update_todo_server_error_without_body() {
        let err = client()
            .parse_update_todo(HttpResponse::new(500, ""))
            .unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 500, .. }));
        assert_eq!(err.to_string(), "HTTP error! status: 500");
    }

    #[test]
    fn parse_delete_todo_ignores_body() {
        assert!(client().parse_delete_todo(HttpResponse::new(204, "")).is_ok());
        assert!(client().parse_delete_todo(HttpResponse::new(200, "not json")).is_ok());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = TodoClient::new("http://localhost:5000/api/");
        let req = client.build_list_todos();
        assert_eq!(req.path, "http://localhost:5000/api/todos");
    }

    #[test]
    fn parse_list_todos_bad_json() {
        let err = client()
            .parse_list_todos(HttpResponse::new(200, "not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }
}
