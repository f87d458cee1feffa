//! Error types for the todo API client and store.
//!
//! # Design
//! Every failure reaching the store is reduced to a human-readable message.
//! `ApiError` keeps enough structure for callers that care (status code,
//! transport vs. decode failure); `OperationError` is what the store's async
//! operations return, already carrying the per-operation fallback message.

use thiserror::Error;

use crate::store::Operation;

/// Errors returned by `TodoClient` and `Transport` implementations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{}", http_message(.status, .body))]
    Http { status: u16, body: String },

    /// The request never produced a response.
    #[error("{0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// The message to surface to users, or `None` when there is nothing
    /// useful to say.
    pub fn message(&self) -> Option<String> {
        let message = self.to_string();
        if message.trim().is_empty() {
            None
        } else {
            Some(message)
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

fn http_message(status: &u16, body: &str) -> String {
    if body.trim().is_empty() {
        format!("HTTP error! status: {status}")
    } else {
        body.to_string()
    }
}

/// Failure of one store operation, as recorded in the store's error slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct OperationError {
    pub operation: Operation,
    pub message: String,
}

impl OperationError {
    pub(crate) fn from_api(operation: Operation, err: &ApiError) -> Self {
        Self {
            operation,
            message: err
                .message()
                .unwrap_or_else(|| operation.fallback_message().to_string()),
        }
    }
}

/// Client-side form validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Please enter a title")]
    EmptyTitle,
}
