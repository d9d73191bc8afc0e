//! Rendering of the task list and mapping of user intents back onto the
//! controller. Nothing here holds state of its own.

use crate::controller::TaskListController;
use crate::store::{StoreError, TaskStore};
use crate::task::{CompletionStats, Task, TaskId};
use std::fmt::{Display, Formatter};
use tokio::task::JoinHandle;

const PROGRESS_BAR_WIDTH: usize = 20;

/// One rendered task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: TaskId,
    pub label: String,
    pub checked: bool,
    /// Completed tasks are shown struck through.
    pub struck_through: bool,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            label: task.description.clone(),
            checked: task.completed,
            struck_through: task.completed,
        }
    }
}

/// Everything needed to draw the task card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListView {
    pub stats: CompletionStats,
    pub rows: Vec<TaskRow>,
    pub draft: String,
    pub is_loading: bool,
}

impl TaskListView {
    pub fn new(tasks: &[Task], draft: impl Into<String>, is_loading: bool) -> Self {
        Self {
            stats: CompletionStats {
                completed: tasks.iter().filter(|task| task.completed).count(),
                total: tasks.len(),
            },
            rows: tasks.iter().map(TaskRow::from).collect(),
            draft: draft.into(),
            is_loading,
        }
    }

    /// Header text, e.g. `2/3 done`.
    pub fn header(&self) -> String {
        self.stats.to_string()
    }

    /// Width of the progress indicator in percent.
    pub fn progress_percent(&self) -> u8 {
        self.stats.percent()
    }

    /// Row shown at the given 1-based position.
    pub fn row_at(&self, position: usize) -> Option<&TaskRow> {
        position.checked_sub(1).and_then(|index| self.rows.get(index))
    }

    /// Resolves a row reference typed by the user: a 1-based position, or
    /// otherwise a task id.
    pub fn resolve(&self, reference: &str) -> Option<TaskId> {
        if let Ok(position) = reference.parse::<usize>() {
            if let Some(row) = self.row_at(position) {
                return Some(row.id.clone());
            }
        }
        self.rows
            .iter()
            .find(|row| row.id.as_str() == reference)
            .map(|row| row.id.clone())
    }
}

impl<S: TaskStore + ?Sized + 'static> From<&TaskListController<S>> for TaskListView {
    fn from(controller: &TaskListController<S>) -> Self {
        Self::new(
            &controller.tasks(),
            controller.draft(),
            controller.is_loading(),
        )
    }
}

fn strike_through(text: &str) -> String {
    text.chars().flat_map(|c| [c, '\u{0336}']).collect()
}

impl Display for TaskRow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mark = if self.checked { 'x' } else { ' ' };
        if self.struck_through {
            write!(f, "[{}] {}", mark, strike_through(&self.label))
        } else {
            write!(f, "[{}] {}", mark, self.label)
        }
    }
}

impl Display for TaskListView {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let filled = PROGRESS_BAR_WIDTH * self.progress_percent() as usize / 100;
        writeln!(f, "Your Tasks{:>width$}", self.header(), width = 30)?;
        writeln!(
            f,
            "[{}{}] {}%",
            "#".repeat(filled),
            "-".repeat(PROGRESS_BAR_WIDTH - filled),
            self.progress_percent()
        )?;
        if self.is_loading {
            return writeln!(f, "Loading tasks...");
        }
        if self.rows.is_empty() {
            return writeln!(f, "No tasks yet.");
        }
        for (index, row) in self.rows.iter().enumerate() {
            writeln!(f, "{:>3}. {}  ({})", index + 1, row, row.id)?;
        }
        Ok(())
    }
}

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    EditDraft(String),
    Submit,
    Toggle(TaskId),
    Delete(TaskId),
    Refresh,
}

/// Routes an intent to the matching controller operation.
///
/// A toggle returns as soon as the local flip is applied; the handle of its
/// store call is handed back so the caller can wait for it before exiting.
pub async fn dispatch<S: TaskStore + ?Sized + 'static>(
    controller: &TaskListController<S>,
    intent: Intent,
) -> Result<Option<JoinHandle<()>>, StoreError> {
    match intent {
        Intent::EditDraft(text) => {
            controller.set_draft(text);
            Ok(None)
        }
        Intent::Submit => controller.submit_draft().await.map(|_| None),
        Intent::Toggle(id) => {
            let pending = controller.toggle(&id);
            if pending.is_none() {
                tracing::debug!("Ignoring toggle of unknown task {}", id);
            }
            Ok(pending)
        }
        Intent::Delete(id) => controller.remove(&id).await.map(|_| None),
        Intent::Refresh => controller.refresh().await.map(|_| None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryTaskStore;
    use std::sync::Arc;

    fn tasks() -> Vec<Task> {
        vec![
            Task::new("a1", "Water tomato plants").completed(true),
            Task::new("b2", "Check irrigation system"),
            Task::new("c3", "Harvest ripe vegetables").completed(true),
        ]
    }

    #[test]
    fn view_derives_header_and_progress() {
        // Arrange
        let tasks = tasks();

        // Act
        let view = TaskListView::new(&tasks, "", false);

        // Assert
        assert_eq!(view.header(), "2/3 done");
        assert_eq!(view.progress_percent(), 66);
        assert_eq!(view.rows.len(), 3);
        assert!(view.rows[0].struck_through);
        assert!(!view.rows[1].checked);
    }

    #[test]
    fn empty_view_renders_zero_percent() {
        let view = TaskListView::new(&[], "", false);

        assert_eq!(view.header(), "0/0 done");
        assert_eq!(view.progress_percent(), 0);
        let text = view.to_string();
        assert!(text.contains(" 0%"));
        assert!(!text.contains("NaN"));
        assert!(text.contains("No tasks yet."));
    }

    #[test]
    fn loading_view_hides_rows() {
        let view = TaskListView::new(&tasks(), "", true);

        let text = view.to_string();

        assert!(text.contains("Loading tasks..."));
        assert!(!text.contains("Check irrigation system"));
    }

    #[test]
    fn rows_render_checkbox_and_strike_through() {
        let rows: Vec<TaskRow> = tasks().iter().map(TaskRow::from).collect();

        assert_eq!(rows[1].to_string(), "[ ] Check irrigation system");
        assert!(rows[0].to_string().starts_with("[x] W\u{0336}a\u{0336}"));
    }

    #[test]
    fn resolve_accepts_position_or_id() {
        let view = TaskListView::new(&tasks(), "", false);

        assert_eq!(view.resolve("2"), Some(TaskId::new("b2")));
        assert_eq!(view.resolve("c3"), Some(TaskId::new("c3")));
        assert_eq!(view.resolve("0"), None);
        assert_eq!(view.resolve("9"), None);
        assert_eq!(view.resolve("zz"), None);
    }

    #[tokio::test]
    async fn dispatch_drives_controller() {
        // Arrange
        let controller = TaskListController::new(Arc::new(InMemoryTaskStore::new()));

        // Act
        dispatch(&controller, Intent::EditDraft("Plough the east field".into()))
            .await
            .unwrap();
        dispatch(&controller, Intent::Submit).await.unwrap();
        let id = controller.tasks()[0].id.clone();
        let pending = dispatch(&controller, Intent::Toggle(id.clone()))
            .await
            .unwrap();
        pending
            .expect("toggle of a listed task starts a store call")
            .await
            .unwrap();

        // Assert
        let view = TaskListView::from(&controller);
        assert_eq!(view.header(), "1/1 done");
        assert_eq!(view.draft, "");

        dispatch(&controller, Intent::Delete(id)).await.unwrap();
        assert_eq!(TaskListView::from(&controller).header(), "0/0 done");
    }

    #[tokio::test]
    async fn dispatch_toggle_of_unknown_task_is_ok() {
        let controller = TaskListController::new(Arc::new(InMemoryTaskStore::new()));

        let result = dispatch(&controller, Intent::Toggle(TaskId::new("nope"))).await;

        assert!(matches!(result, Ok(None)));
    }
}
