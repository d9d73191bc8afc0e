//! Task store connectivity.
//!
//! The controller only ever talks to a remote task collection through the
//! [`TaskStore`] trait, so the transport can be swapped:
//! - [`http::HttpTaskStore`] issues JSON requests against the `/todo` resource
//! - [`memory::InMemoryTaskStore`] keeps tasks in process memory and backs the
//!   development server and offline mode

use crate::task::{Task, TaskId};
use async_trait::async_trait;
use thiserror::Error;

pub mod http;
pub mod memory;

pub use http::{HttpStoreConfig, HttpTaskStore};
pub use memory::InMemoryTaskStore;

/// Errors that can occur while talking to a task store.
///
/// Messages are kept as text so an error can be fanned out to every
/// notification subscriber.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached, or did not answer in time
    #[error("Cannot reach task store: {0}")]
    Transport(String),
    /// The request could not be built (malformed base URL or id)
    #[error("Cannot build request: {0}")]
    Request(String),
    /// The store refused the request as invalid (4xx)
    #[error("Task store rejected the request ({status}): {message}")]
    Client { status: u16, message: String },
    /// The addressed task does not exist (404)
    #[error("Task not found ({status}): {message}")]
    NotFound { status: u16, message: String },
    /// The store failed while handling the request (5xx)
    #[error("Task store failed ({status}): {message}")]
    Server { status: u16, message: String },
    /// The response body did not have the expected shape
    #[error("Unexpected response from task store: {0}")]
    Decode(String),
}

impl StoreError {
    /// Maps a non-success HTTP status onto an error kind.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => StoreError::NotFound { status, message },
            500..=599 => StoreError::Server { status, message },
            _ => StoreError::Client { status, message },
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, StoreError::Transport(_) | StoreError::Server { .. })
    }
}

/// CRUD access to a remote task collection.
///
/// `create` deliberately returns nothing: the collection does not echo the
/// created record, so callers re-fetch to learn the assigned id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Reads the full collection, in store order.
    async fn fetch_all(&self) -> Result<Vec<Task>, StoreError>;
    /// Creates a task with the given description.
    async fn create(&self, description: &str) -> Result<(), StoreError>;
    /// Sets the `completed` flag of one task.
    async fn update(&self, id: &TaskId, completed: bool) -> Result<(), StoreError>;
    /// Deletes one task.
    async fn delete(&self, id: &TaskId) -> Result<(), StoreError>;
}
