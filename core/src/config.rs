//! Runtime configuration for the client and store.

use crate::store::Operation;

/// Environment variable overriding the API base address.
pub const API_URL_ENV: &str = "TODO_API_URL";

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Reads `TODO_API_URL`, falling back to [`DEFAULT_API_URL`] when it is
    /// unset or blank.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup(API_URL_ENV)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self { base_url }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

/// Which in-flight operations count towards the store's loading flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadingPolicy {
    /// Reads, create and update raise the flag; status changes and deletes
    /// run without it.
    #[default]
    Reference,
    AllOperations,
}

impl LoadingPolicy {
    pub fn tracks(self, operation: Operation) -> bool {
        match self {
            LoadingPolicy::AllOperations => true,
            LoadingPolicy::Reference => !matches!(operation, Operation::UpdateStatus | Operation::Delete),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    pub loading_policy: LoadingPolicy,
    /// When set, writes that target the same id (update, status change,
    /// delete) are applied one at a time in dispatch order. When unset the
    /// last response to arrive wins.
    pub serialize_writes: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            loading_policy: LoadingPolicy::Reference,
            serialize_writes: true,
        }
    }
}
