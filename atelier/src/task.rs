//! Presentation-facing task model.
//!
//! A [`Task`] tracks one generation request for display: it is created
//! Pending before any remote call, mutated in place when the result or
//! failure arrives, and never persisted beyond the session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::image::GeneratedImage;

/// Lifecycle status of a generation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// The request has been issued and no result has arrived yet.
    Pending,
    /// At least one image was produced.
    Completed,
    /// The request failed or produced no images.
    Failed,
}

/// One generation task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: Uuid,
    /// The user's prompt.
    pub prompt: String,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Model used for generation.
    pub model: String,
    /// Target aspect ratio.
    pub resolution: String,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// When the task finished (completed or failed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Images produced by the task.
    pub images: Vec<GeneratedImage>,
    /// Failure description, when the task failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Task {
    /// Create a new pending task.
    #[must_use]
    pub fn new(
        prompt: impl Into<String>,
        model: impl Into<String>,
        resolution: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt: prompt.into(),
            status: TaskStatus::Pending,
            model: model.into(),
            resolution: resolution.into(),
            created_at: Utc::now(),
            finished_at: None,
            images: Vec::new(),
            error: None,
        }
    }

    /// Complete the task with the produced images.
    ///
    /// An empty image list is a non-fatal failed generation, distinct from
    /// a call failure: the task is marked Failed with a descriptive note
    /// rather than an error from the transport.
    pub fn complete(&mut self, images: Vec<GeneratedImage>) {
        self.finished_at = Some(Utc::now());
        if images.is_empty() {
            self.status = TaskStatus::Failed;
            self.error = Some("the model returned no images".to_string());
        } else {
            self.status = TaskStatus::Completed;
            self.images = images;
        }
    }

    /// Mark the task as failed with the given reason.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.finished_at = Some(Utc::now());
        self.status = TaskStatus::Failed;
        self.error = Some(reason.into());
    }

    /// Duration of the task in seconds, once finished.
    #[must_use]
    pub fn duration_secs(&self) -> Option<f64> {
        self.finished_at
            .map(|end| (end - self.created_at).num_milliseconds() as f64 / 1000.0)
    }
}

/// Session-scoped list of tasks, newest first.
#[derive(Debug, Clone, Default)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    /// Create an empty task list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task to the front of the list and return its id.
    pub fn push(&mut self, task: Task) -> Uuid {
        let id = task.id;
        self.tasks.insert(0, task);
        id
    }

    /// Get a task by id.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Get a mutable task by id.
    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    /// Iterate over tasks, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Number of tasks in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn image(url: &str) -> GeneratedImage {
        GeneratedImage {
            url: url.to_string(),
            prompt: "a cat on a bed".to_string(),
        }
    }

    #[test]
    fn new_task_is_pending() {
        let task = Task::new("a cat on a bed", "img-model", "1:1");
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.finished_at.is_none());
        assert!(task.images.is_empty());
    }

    #[test]
    fn complete_with_images_transitions_to_completed() {
        let mut task = Task::new("a cat on a bed", "img-model", "1:1");
        task.complete(vec![image("https://x/y.png")]);

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.images.len(), 1);
        assert!(task.finished_at.is_some());
        assert!(task.duration_secs().is_some());
        assert!(task.error.is_none());
    }

    #[test]
    fn complete_with_no_images_is_failed_but_described() {
        let mut task = Task::new("a cat on a bed", "img-model", "1:1");
        task.complete(vec![]);

        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error.as_deref().unwrap().contains("no images"));
    }

    #[test]
    fn fail_records_reason() {
        let mut task = Task::new("a cat on a bed", "img-model", "1:1");
        task.fail("HTTP 502: bad gateway");

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("HTTP 502: bad gateway"));
    }

    #[test]
    fn list_is_newest_first_and_addressable_by_id() {
        let mut list = TaskList::new();
        let first = list.push(Task::new("first", "m", "1:1"));
        let second = list.push(Task::new("second", "m", "1:1"));

        assert_eq!(list.len(), 2);
        assert_eq!(list.iter().next().unwrap().id, second);

        list.get_mut(first).unwrap().fail("boom");
        assert_eq!(list.get(first).unwrap().status, TaskStatus::Failed);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Completed).unwrap(),
            "\"completed\""
        );
    }
}
