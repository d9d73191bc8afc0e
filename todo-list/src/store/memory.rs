use super::{StoreError, TaskStore};
use crate::task::{Task, TaskId};
use async_trait::async_trait;
use parking_lot::RwLock;

/// Tasks shown on the landing page preview before anyone signs in.
const DEMO_TASKS: [(&str, bool); 4] = [
    ("Water tomato plants", true),
    ("Apply fertilizer to wheat field", false),
    ("Check irrigation system", false),
    ("Harvest ripe vegetables", false),
];

/// Task store living in process memory.
///
/// Ids and creation timestamps are assigned here, exactly as a remote store
/// would assign them.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<Vec<Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: RwLock::new(tasks),
        }
    }

    /// Store seeded with a handful of farm chores.
    pub fn with_demo_tasks() -> Self {
        let tasks = DEMO_TASKS
            .iter()
            .map(|&(description, completed)| new_task(description, completed))
            .collect();
        Self::with_tasks(tasks)
    }

    /// Appends a task and returns it with its assigned id.
    pub fn insert(&self, description: &str) -> Task {
        let task = new_task(description, false);
        self.tasks.write().push(task.clone());
        task
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }
}

fn new_task(description: &str, completed: bool) -> Task {
    Task {
        id: TaskId::new(uuid::Uuid::new_v4().to_string()),
        description: description.to_string(),
        completed,
        created_at: Some(chrono::Utc::now()),
    }
}

fn not_found(id: &TaskId) -> StoreError {
    StoreError::NotFound {
        status: 404,
        message: format!("Task {} not found", id),
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn fetch_all(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.tasks.read().clone())
    }

    async fn create(&self, description: &str) -> Result<(), StoreError> {
        if description.trim().is_empty() {
            return Err(StoreError::Client {
                status: 400,
                message: "Task description must not be empty".to_string(),
            });
        }
        let task = self.insert(description);
        tracing::info!("Created task {}", task.id);
        Ok(())
    }

    async fn update(&self, id: &TaskId, completed: bool) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write();
        let task = tasks
            .iter_mut()
            .find(|task| &task.id == id)
            .ok_or_else(|| not_found(id))?;
        task.completed = completed;
        Ok(())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write();
        let position = tasks
            .iter()
            .position(|task| &task.id == id)
            .ok_or_else(|| not_found(id))?;
        tasks.remove(position);
        tracing::info!("Deleted task {}", id);
        Ok(())
    }
}
