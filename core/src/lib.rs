//! Client core for the todo service.
//!
//! # Overview
//! - `client` builds `HttpRequest` values and parses `HttpResponse` values
//!   without touching the network (host-does-IO pattern).
//! - `transport` is the seam where a host executes those requests.
//! - `store` keeps the local collection in sync with the server and records
//!   per-operation progress, the latest error, the filter and the selection.
//! - `filter` and `view` derive what a front end shows and turn user intents
//!   into store calls.
//!
//! # Design
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.
//! - Ids are opaque strings assigned by the server.

pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod store;
pub mod transport;
pub mod types;
pub mod view;

pub use client::TodoClient;
pub use config::{ClientConfig, LoadingPolicy, StoreConfig};
pub use error::{ApiError, FormError, OperationError};
pub use filter::{apply_filter, TodoFilter};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use store::{Operation, Phase, TodoState, TodoStore};
pub use transport::{ReqwestTransport, Transport};
pub use types::{is_overdue, is_overdue_at, CreateTodo, StatusUpdate, Todo, TodoStatus, UpdateTodo};
pub use view::{FilterBar, FormSubmission, ItemView, ListView, StatusChange, TodoActions, TodoForm};
