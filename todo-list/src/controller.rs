//! Client-held task list kept in step with a [`TaskStore`].
//!
//! Creation is confirmed by re-fetching the collection, toggles are applied
//! locally first and compensated when the store refuses them, and deletions
//! only touch local state once the store has answered.

use crate::store::{StoreError, TaskStore};
use crate::task::{CompletionStats, Task, TaskCollection, TaskId};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const NOTIFICATION_CHANNEL_CAPACITY: usize = 64;

/// User-visible report of a failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    RefreshFailed { error: StoreError },
    CreateFailed { description: String, error: StoreError },
    /// The store refused a toggle and the local flag was put back.
    ToggleReverted { id: TaskId, completed: bool, error: StoreError },
    RemoveFailed { id: TaskId, error: StoreError },
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notification::RefreshFailed { error } => write!(f, "Failed to load tasks: {}", error),
            Notification::CreateFailed { description, error } => {
                write!(f, "Failed to add '{}': {}", description, error)
            }
            Notification::ToggleReverted { id, error, .. } => {
                write!(f, "Failed to update task {}: {}", id, error)
            }
            Notification::RemoveFailed { id, error } => {
                write!(f, "Failed to delete task {}: {}", id, error)
            }
        }
    }
}

#[derive(Debug, Default)]
struct ListState {
    tasks: TaskCollection,
    draft: String,
    is_loading: bool,
    /// Sequence number of the newest refresh issued.
    refresh_seq: u64,
}

/// Marks the list as loading for one refresh.
///
/// Dropping the guard, whether the refresh settled or its future was
/// cancelled, ends loading unless a newer refresh has started since.
struct LoadingGuard {
    state: Arc<Mutex<ListState>>,
    seq: u64,
}

impl LoadingGuard {
    fn begin(state: Arc<Mutex<ListState>>) -> Self {
        let seq = {
            let mut locked = state.lock();
            locked.refresh_seq += 1;
            locked.is_loading = true;
            locked.refresh_seq
        };
        Self { state, seq }
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if state.refresh_seq == self.seq {
            state.is_loading = false;
        }
    }
}

/// Owns the in-memory task list and orchestrates store calls.
///
/// Cloning is cheap; clones share the same list.
pub struct TaskListController<S: TaskStore + ?Sized> {
    store: Arc<S>,
    state: Arc<Mutex<ListState>>,
    notifications: broadcast::Sender<Notification>,
}

impl<S: TaskStore + ?Sized> Clone for TaskListController<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            state: Arc::clone(&self.state),
            notifications: self.notifications.clone(),
        }
    }
}

impl<S: TaskStore + ?Sized + 'static> TaskListController<S> {
    pub fn new(store: Arc<S>) -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);
        Self {
            store,
            state: Arc::new(Mutex::new(ListState::default())),
            notifications,
        }
    }

    /// Receives every notification emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    fn notify(&self, notification: Notification) {
        tracing::warn!("{}", notification);
        // No subscriber is not an error; the warning above is still logged.
        let _ = self.notifications.send(notification);
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().tasks.to_vec()
    }

    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.state.lock().tasks.get(id).cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().is_loading
    }

    pub fn draft(&self) -> String {
        self.state.lock().draft.clone()
    }

    pub fn set_draft(&self, draft: impl Into<String>) {
        self.state.lock().draft = draft.into();
    }

    /// Counts done tasks in the current list.
    pub fn completion_stats(&self) -> CompletionStats {
        self.state.lock().tasks.completion_stats()
    }

    /// Replaces the list with the store's collection.
    ///
    /// A result is dropped when a newer refresh was issued in the meantime;
    /// loading ends when the newest refresh settles.
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let loading = LoadingGuard::begin(Arc::clone(&self.state));

        let result = self.store.fetch_all().await;

        let mut state = self.state.lock();
        if state.refresh_seq != loading.seq {
            tracing::debug!("Discarding stale refresh {} (newest is {})", loading.seq, state.refresh_seq);
            return result.map(|_| ());
        }
        let result = match result {
            Ok(tasks) => {
                state.tasks.replace_all(tasks);
                tracing::debug!("Loaded {} tasks", state.tasks.len());
                Ok(())
            }
            Err(error) => Err(error),
        };
        drop(state);
        drop(loading);

        if let Err(error) = &result {
            self.notify(Notification::RefreshFailed {
                error: error.clone(),
            });
        }
        result
    }

    /// Creates a task from the draft, then re-fetches to pick up its id.
    ///
    /// A blank draft does nothing. On failure the draft is kept.
    #[tracing::instrument(skip(self))]
    pub async fn submit_draft(&self) -> Result<(), StoreError> {
        let description = {
            let state = self.state.lock();
            state.draft.trim().to_string()
        };
        if description.is_empty() {
            return Ok(());
        }

        if let Err(error) = self.store.create(&description).await {
            self.notify(Notification::CreateFailed {
                description,
                error: error.clone(),
            });
            return Err(error);
        }

        {
            let mut state = self.state.lock();
            if state.draft.trim() == description {
                state.draft.clear();
            }
        }
        tracing::info!("Created task '{}'", description);
        self.refresh().await
    }

    /// Flips a task locally and pushes the new value to the store in the
    /// background.
    ///
    /// Returns `None` when the id is not in the list. When the store refuses
    /// the update, the flip is undone and a [`Notification::ToggleReverted`]
    /// is emitted. Must be called from within a tokio runtime.
    pub fn toggle(&self, id: &TaskId) -> Option<JoinHandle<()>> {
        let completed = {
            let mut state = self.state.lock();
            let task = state.tasks.get_mut(id)?;
            task.completed = !task.completed;
            task.completed
        };
        tracing::debug!("Toggled task {} to {}", id, completed);

        let controller = self.clone();
        let id = id.clone();
        Some(tokio::spawn(async move {
            if let Err(error) = controller.store.update(&id, completed).await {
                controller.revert_toggle(&id, completed, error);
            }
        }))
    }

    fn revert_toggle(&self, id: &TaskId, optimistic: bool, error: StoreError) {
        {
            let mut state = self.state.lock();
            if let Some(task) = state.tasks.get_mut(id) {
                // A later toggle already moved the flag again.
                if task.completed == optimistic {
                    task.completed = !optimistic;
                }
            }
        }
        self.notify(Notification::ToggleReverted {
            id: id.clone(),
            completed: !optimistic,
            error,
        });
    }

    /// Deletes a task in the store, then drops it from the list.
    ///
    /// A task the store no longer knows is dropped as well. Any other failure
    /// leaves the list untouched.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, id: &TaskId) -> Result<(), StoreError> {
        match self.store.delete(id).await {
            Ok(()) => {}
            Err(StoreError::NotFound { .. }) => {
                tracing::info!("Task {} was already gone from the store", id);
            }
            Err(error) => {
                self.notify(Notification::RemoveFailed {
                    id: id.clone(),
                    error: error.clone(),
                });
                return Err(error);
            }
        }
        self.state.lock().tasks.remove(id);
        Ok(())
    }
}
