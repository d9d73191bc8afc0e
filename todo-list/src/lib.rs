//! Farm task list kept in sync with a remote task collection.
//!
//! - [`task`] holds the task model and the ordered, id-indexed collection
//! - [`store`] talks to the task collection (HTTP or in-memory)
//! - [`controller`] owns the client-side list and reconciles it with the store
//! - [`view`] renders controller state and routes user intents back to it

pub mod controller;
pub mod store;
pub mod task;
pub mod view;

pub use controller::{Notification, TaskListController};
pub use store::{HttpStoreConfig, HttpTaskStore, InMemoryTaskStore, StoreError, TaskStore};
pub use task::{CompletionStats, Task, TaskCollection, TaskId};
pub use view::{Intent, TaskListView, TaskRow, dispatch};
