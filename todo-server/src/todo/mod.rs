use std::sync::Arc;
use todo_list::TaskStore;

pub mod api;

pub use api::create_todo_router;

/// Shared state of the task collection routes.
#[derive(Clone)]
pub struct TodoState {
    pub store: Arc<dyn TaskStore>,
}

impl TodoState {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }
}
