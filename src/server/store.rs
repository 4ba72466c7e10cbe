//! In-memory task store
//!
//! Every mutation of a task goes through [`TaskStore::apply`], which enforces
//! the lifecycle graph and refuses anything after the final update. Entries
//! live in a [`DashMap`], so updates to one task only contend with tasks
//! hashed to the same shard.

use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use tracing::debug;

use crate::protocol::{
    event::TaskUpdateEvent,
    task::{TaskState, TaskStatus},
    A2AError, A2AResult, Message, Task,
};

#[derive(Debug)]
struct TaskEntry {
    task: Task,
    finalized: bool,
}

/// Outcome of [`TaskStore::create_or_fetch`]
#[derive(Debug, Clone, PartialEq)]
pub enum Creation {
    /// A new task was inserted in the submitted state
    Created(Task),

    /// A task with the same id and context already existed
    Existing(Task),
}

impl Creation {
    pub fn into_task(self) -> Task {
        match self {
            Creation::Created(task) | Creation::Existing(task) => task,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Creation::Created(_))
    }
}

/// Process-scoped registry of tasks, cheap to clone
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Arc<DashMap<String, TaskEntry>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a task, or return the existing one with the same context
    ///
    /// # Errors
    ///
    /// `A2AError::DuplicateTask` when `task_id` is taken by another context.
    pub fn create(&self, task_id: &str, context_id: &str) -> A2AResult<Task> {
        self.create_or_fetch(task_id, context_id)
            .map(Creation::into_task)
    }

    /// Like [`create`](Self::create), telling apart a fresh task from an existing one
    pub fn create_or_fetch(&self, task_id: &str, context_id: &str) -> A2AResult<Creation> {
        match self.tasks.entry(task_id.to_string()) {
            Entry::Occupied(occupied) => {
                let existing = &occupied.get().task;
                if existing.context_id != context_id {
                    return Err(A2AError::DuplicateTask {
                        task_id: task_id.to_string(),
                        existing_context_id: existing.context_id.clone(),
                    });
                }
                Ok(Creation::Existing(existing.clone()))
            }
            Entry::Vacant(vacant) => {
                let task = Task::new(task_id, context_id);
                vacant.insert(TaskEntry {
                    task: task.clone(),
                    finalized: false,
                });
                debug!(task_id, context_id, "task created");
                Ok(Creation::Created(task))
            }
        }
    }

    /// Apply one executor update and return the resulting task
    ///
    /// A non-appending artifact replaces every prior artifact. An appending
    /// one extends the parts of the artifact with the same id, or is added.
    ///
    /// # Errors
    ///
    /// - `A2AError::UnknownTask` if no such task exists
    /// - `A2AError::TerminalTask` if the task already received its final update
    /// - `A2AError::InvalidTransition` for a status that is not a lifecycle successor
    /// - `A2AError::Validation` if the event belongs to another task
    pub fn apply(&self, task_id: &str, event: &TaskUpdateEvent) -> A2AResult<Task> {
        if event.task_id() != task_id {
            return Err(A2AError::Validation(format!(
                "update for task {} applied to task {}",
                event.task_id(),
                task_id
            )));
        }

        let mut entry = self.tasks.get_mut(task_id).ok_or_else(|| A2AError::UnknownTask {
            task_id: task_id.to_string(),
        })?;

        if entry.finalized {
            return Err(A2AError::TerminalTask {
                task_id: task_id.to_string(),
            });
        }

        match event {
            TaskUpdateEvent::Status(update) => {
                let from = entry.task.state();
                let to = update.status.state;
                if !from.can_transition_to(to) {
                    return Err(A2AError::InvalidTransition {
                        task_id: task_id.to_string(),
                        from,
                        to,
                    });
                }
                entry.task.status = update.status.clone();
            }
            TaskUpdateEvent::Artifact(update) => {
                let artifacts = &mut entry.task.artifacts;
                if !update.append {
                    *artifacts = vec![update.artifact.clone()];
                } else if let Some(existing) = artifacts
                    .iter_mut()
                    .find(|a| a.artifact_id == update.artifact.artifact_id)
                {
                    existing.parts.extend(update.artifact.parts.iter().cloned());
                } else {
                    artifacts.push(update.artifact.clone());
                }
            }
        }

        if event.is_final() || entry.task.is_terminal() {
            entry.finalized = true;
        }

        Ok(entry.task.clone())
    }

    /// Record an incoming message in the task history
    pub fn append_history(&self, task_id: &str, message: Message) -> A2AResult<()> {
        let mut entry = self.tasks.get_mut(task_id).ok_or_else(|| A2AError::UnknownTask {
            task_id: task_id.to_string(),
        })?;
        entry.task.history.push(message);
        Ok(())
    }

    /// Move a live task straight to canceled
    ///
    /// Used when no executor is left to emit the final update. A task that is
    /// already final is returned unchanged.
    pub fn cancel(&self, task_id: &str) -> A2AResult<Task> {
        let mut entry = self.tasks.get_mut(task_id).ok_or_else(|| A2AError::UnknownTask {
            task_id: task_id.to_string(),
        })?;

        if !entry.finalized {
            entry.task.status = TaskStatus::new(TaskState::Canceled);
            entry.finalized = true;
        }
        Ok(entry.task.clone())
    }

    pub fn get(&self, task_id: &str) -> Option<Task> {
        self.tasks.get(task_id).map(|entry| entry.task.clone())
    }

    /// Whether the task received its final update
    pub fn is_finalized(&self, task_id: &str) -> bool {
        self.tasks
            .get(task_id)
            .map(|entry| entry.finalized)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::protocol::{
        event::{TaskArtifactUpdateEvent, TaskStatusUpdateEvent},
        Artifact, Part,
    };

    use super::*;

    fn status(state: TaskState, is_final: bool) -> TaskUpdateEvent {
        TaskUpdateEvent::Status(TaskStatusUpdateEvent {
            task_id: "t1".into(),
            context_id: "c1".into(),
            status: TaskStatus::new(state),
            is_final,
        })
    }

    fn artifact(artifact: Artifact, append: bool) -> TaskUpdateEvent {
        TaskUpdateEvent::Artifact(TaskArtifactUpdateEvent {
            task_id: "t1".into(),
            context_id: "c1".into(),
            artifact,
            append,
            is_final: false,
        })
    }

    #[test]
    fn test_create_is_idempotent() {
        let store = TaskStore::new();
        store.create("t1", "c1").unwrap();
        store.apply("t1", &status(TaskState::Working, false)).unwrap();
        store
            .apply("t1", &artifact(Artifact::text("partial"), false))
            .unwrap();

        let again = store.create("t1", "c1").unwrap();

        assert_eq!(again.state(), TaskState::Working);
        assert_eq!(again.artifacts.len(), 1);
        assert_eq!(store.len(), 1);
        assert!(!store.create_or_fetch("t1", "c1").unwrap().is_created());
    }

    #[test]
    fn test_create_with_other_context_is_duplicate() {
        let store = TaskStore::new();
        store.create("t1", "c1").unwrap();

        let err = store.create("t1", "c2").unwrap_err();
        match err {
            A2AError::DuplicateTask {
                task_id,
                existing_context_id,
            } => {
                assert_eq!(task_id, "t1");
                assert_eq!(existing_context_id, "c1");
            }
            other => panic!("Expected DuplicateTask, got {other:?}"),
        }
    }

    #[test]
    fn test_apply_unknown_task() {
        let store = TaskStore::new();

        let err = store.apply("t1", &status(TaskState::Working, false)).unwrap_err();
        assert!(matches!(err, A2AError::UnknownTask { .. }));
        assert!(store.get("t1").is_none());
    }

    #[test]
    fn test_nothing_applies_after_final() {
        let store = TaskStore::new();
        store.create("t1", "c1").unwrap();
        store.apply("t1", &status(TaskState::Working, false)).unwrap();
        store.apply("t1", &status(TaskState::Completed, true)).unwrap();

        assert!(store.is_finalized("t1"));
        let err = store
            .apply("t1", &artifact(Artifact::text("late"), true))
            .unwrap_err();
        assert!(matches!(err, A2AError::TerminalTask { .. }));
        assert!(store.get("t1").unwrap().artifacts.is_empty());
    }

    #[test]
    fn test_backwards_transition_is_rejected() {
        let store = TaskStore::new();
        store.create("t1", "c1").unwrap();
        store.apply("t1", &status(TaskState::Working, false)).unwrap();

        let err = store
            .apply("t1", &status(TaskState::Submitted, false))
            .unwrap_err();
        assert!(matches!(
            err,
            A2AError::InvalidTransition {
                from: TaskState::Working,
                to: TaskState::Submitted,
                ..
            }
        ));
    }

    #[test]
    fn test_artifact_replace_and_append() {
        let store = TaskStore::new();
        store.create("t1", "c1").unwrap();

        let first = Artifact::text("A");
        let id = first.artifact_id.clone();
        store.apply("t1", &artifact(first, false)).unwrap();

        let mut more = Artifact::new(vec![Part::text("B")]);
        more.artifact_id = id;
        store.apply("t1", &artifact(more, true)).unwrap();
        let task = store.apply("t1", &artifact(Artifact::text("C"), true)).unwrap();

        assert_eq!(task.artifacts.len(), 2);
        assert_eq!(task.artifacts[0].text_content(), "AB");

        let task = store
            .apply("t1", &artifact(Artifact::text("fresh"), false))
            .unwrap();
        assert_eq!(task.artifacts.len(), 1);
        assert_eq!(task.artifacts[0].text_content(), "fresh");
    }

    #[test]
    fn test_input_required_is_not_final() {
        let store = TaskStore::new();
        store.create("t1", "c1").unwrap();
        store.apply("t1", &status(TaskState::Working, false)).unwrap();
        store
            .apply("t1", &status(TaskState::InputRequired, false))
            .unwrap();

        assert!(!store.is_finalized("t1"));
        let task = store.apply("t1", &status(TaskState::Working, false)).unwrap();
        assert_eq!(task.state(), TaskState::Working);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let store = TaskStore::new();
        store.create("t1", "c1").unwrap();

        assert_eq!(store.cancel("t1").unwrap().state(), TaskState::Canceled);
        assert_eq!(store.cancel("t1").unwrap().state(), TaskState::Canceled);
        assert!(store.is_finalized("t1"));
        assert!(matches!(
            store.cancel("nope"),
            Err(A2AError::UnknownTask { .. })
        ));
    }

    #[test]
    fn test_event_for_other_task_is_rejected() {
        let store = TaskStore::new();
        store.create("t2", "c1").unwrap();

        let err = store.apply("t2", &status(TaskState::Working, false)).unwrap_err();
        assert!(matches!(err, A2AError::Validation(_)));
    }
}
