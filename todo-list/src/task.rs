use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Identifier assigned by the remote store when a task is created.
///
/// The store may hand out integer primary keys or string keys; both are kept
/// in their textual form so the rest of the crate never cares which.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => TaskId(text),
            RawId::Signed(number) => TaskId(number.to_string()),
            RawId::Unsigned(number) => TaskId(number.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(rename = "task")]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            completed: false,
            created_at: None,
        }
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}

/// Snapshot of how many tasks are done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionStats {
    pub completed: usize,
    pub total: usize,
}

impl CompletionStats {
    /// Share of completed tasks in percent, `0` when there are no tasks.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed * 100) / self.total) as u8
    }
}

impl Display for CompletionStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} done", self.completed, self.total)
    }
}

/// Ordered task list with id lookup.
///
/// Iteration follows the order of the last wholesale replacement; local
/// patches never move an item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskCollection {
    tasks: Vec<Task>,
    index: HashMap<TaskId, usize>,
}

impl TaskCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole collection. Repeated ids keep their first occurrence.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks.clear();
        self.index.clear();
        for task in tasks {
            if self.index.contains_key(&task.id) {
                tracing::warn!("Dropping duplicate task id {}", task.id);
                continue;
            }
            self.index.insert(task.id.clone(), self.tasks.len());
            self.tasks.push(task);
        }
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.index.get(id).map(|&position| &self.tasks[position])
    }

    pub fn get_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.index.get(id).map(|&position| &mut self.tasks[position])
    }

    /// Sets the completion flag in place, returning the previous value.
    pub fn set_completed(&mut self, id: &TaskId, completed: bool) -> Option<bool> {
        self.get_mut(id)
            .map(|task| std::mem::replace(&mut task.completed, completed))
    }

    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let position = self.index.remove(id)?;
        let removed = self.tasks.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Position of a task in display order.
    pub fn position(&self, id: &TaskId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn completion_stats(&self) -> CompletionStats {
        CompletionStats {
            completed: self.tasks.iter().filter(|task| task.completed).count(),
            total: self.tasks.len(),
        }
    }

    pub fn to_vec(&self) -> Vec<Task> {
        self.tasks.clone()
    }
}

impl From<Vec<Task>> for TaskCollection {
    fn from(tasks: Vec<Task>) -> Self {
        let mut collection = Self::new();
        collection.replace_all(tasks);
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_tasks() -> TaskCollection {
        TaskCollection::from(vec![
            Task::new("1", "Water tomato plants"),
            Task::new("2", "Apply fertilizer to wheat field"),
            Task::new("3", "Check irrigation system"),
        ])
    }

    mod wire_format_tests {
        use super::*;

        #[test]
        fn can_decode_task_with_numeric_id() {
            // Arrange
            let json = r#"{"id": 17, "task": "Harvest ripe vegetables", "completed": true}"#;

            // Act
            let task: Task = serde_json::from_str(json).unwrap();

            // Assert
            assert_eq!(task.id, TaskId::new("17"));
            assert_eq!(task.description, "Harvest ripe vegetables");
            assert!(task.completed);
            assert_eq!(task.created_at, None);
        }

        #[test]
        fn can_decode_task_with_string_id_and_timestamp() {
            let json = r#"{
                "id": "9f1c",
                "task": "Check irrigation system",
                "completed": false,
                "created_at": "2025-03-01T08:30:00Z"
            }"#;

            let task: Task = serde_json::from_str(json).unwrap();

            assert_eq!(task.id.as_str(), "9f1c");
            assert!(task.created_at.is_some());
        }

        #[test]
        fn missing_completed_defaults_to_false() {
            let task: Task = serde_json::from_str(r#"{"id": 1, "task": "Weed"}"#).unwrap();

            assert!(!task.completed);
        }

        #[test]
        fn serializes_description_under_task_key() {
            let task = Task::new("1", "Weed the carrots");

            let value = serde_json::to_value(&task).unwrap();

            assert_eq!(
                value,
                serde_json::json!({"id": "1", "task": "Weed the carrots", "completed": false})
            );
        }
    }

    #[test]
    fn replace_all_keeps_fetch_order_and_first_duplicate() {
        // Arrange
        let mut collection = three_tasks();

        // Act
        collection.replace_all(vec![
            Task::new("b", "second"),
            Task::new("a", "first"),
            Task::new("b", "duplicate"),
        ]);

        // Assert
        let ids: Vec<&str> = collection.iter().map(|task| task.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(collection.get(&"b".into()).unwrap().description, "second");
    }

    #[test]
    fn remove_keeps_relative_order_and_index() {
        let mut collection = three_tasks();

        let removed = collection.remove(&"2".into());

        assert_eq!(removed.map(|task| task.id), Some(TaskId::new("2")));
        let ids: Vec<&str> = collection.iter().map(|task| task.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(collection.position(&"3".into()), Some(1));
        assert_eq!(collection.get(&"3".into()).unwrap().description, "Check irrigation system");
    }

    #[test]
    fn remove_unknown_id_is_none() {
        let mut collection = three_tasks();

        assert_eq!(collection.remove(&"42".into()), None);
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn set_completed_returns_previous_value() {
        let mut collection = three_tasks();

        assert_eq!(collection.set_completed(&"1".into(), true), Some(false));
        assert_eq!(collection.set_completed(&"1".into(), false), Some(true));
        assert_eq!(collection.set_completed(&"missing".into(), true), None);
    }

    #[test]
    fn completion_stats_counts_done_tasks() {
        let collection = TaskCollection::from(vec![
            Task::new("1", "a").completed(true),
            Task::new("2", "b").completed(true),
            Task::new("3", "c"),
        ]);

        let stats = collection.completion_stats();

        assert_eq!(stats, CompletionStats { completed: 2, total: 3 });
        assert_eq!(stats.percent(), 66);
        assert_eq!(stats.to_string(), "2/3 done");
    }

    #[test]
    fn completion_stats_of_empty_list_is_zero_percent() {
        let stats = TaskCollection::new().completion_stats();

        assert_eq!(stats, CompletionStats { completed: 0, total: 0 });
        assert_eq!(stats.percent(), 0);
    }
}
