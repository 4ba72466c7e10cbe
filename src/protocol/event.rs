//! Task update events and stream frames

use serde::{Deserialize, Serialize};

use super::{
    message::Message,
    task::{Task, TaskState, TaskStatus},
    Artifact,
};

/// A change of task status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusUpdateEvent {
    pub task_id: String,
    pub context_id: String,
    pub status: TaskStatus,

    /// No further event follows for this task
    #[serde(rename = "final", default)]
    pub is_final: bool,
}

/// A new or extended task artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskArtifactUpdateEvent {
    pub task_id: String,
    pub context_id: String,
    pub artifact: Artifact,

    /// `false` replaces every prior artifact, `true` accumulates
    #[serde(default)]
    pub append: bool,

    #[serde(rename = "final", default)]
    pub is_final: bool,
}

/// An update emitted by a task executor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum TaskUpdateEvent {
    #[serde(rename = "status-update")]
    Status(TaskStatusUpdateEvent),

    #[serde(rename = "artifact-update")]
    Artifact(TaskArtifactUpdateEvent),
}

impl TaskUpdateEvent {
    pub fn task_id(&self) -> &str {
        match self {
            TaskUpdateEvent::Status(event) => &event.task_id,
            TaskUpdateEvent::Artifact(event) => &event.task_id,
        }
    }

    pub fn is_final(&self) -> bool {
        match self {
            TaskUpdateEvent::Status(event) => event.is_final,
            TaskUpdateEvent::Artifact(event) => event.is_final,
        }
    }

    /// The state carried by a status update
    pub fn state(&self) -> Option<TaskState> {
        match self {
            TaskUpdateEvent::Status(event) => Some(event.status.state),
            TaskUpdateEvent::Artifact(_) => None,
        }
    }
}

/// One frame received from an agent: the result of `message/send` or an
/// element of a `message/stream` response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum StreamResponse {
    /// Snapshot of a whole task
    #[serde(rename = "task")]
    Task(Task),

    /// Direct reply without a task
    #[serde(rename = "message")]
    Message(Message),

    #[serde(rename = "status-update")]
    Status(TaskStatusUpdateEvent),

    #[serde(rename = "artifact-update")]
    Artifact(TaskArtifactUpdateEvent),
}

impl StreamResponse {
    /// Check if no further frame may follow this one
    pub fn is_final(&self) -> bool {
        match self {
            StreamResponse::Task(task) => task.is_terminal(),
            StreamResponse::Message(_) => true,
            StreamResponse::Status(event) => event.is_final,
            StreamResponse::Artifact(event) => event.is_final,
        }
    }
}

impl From<TaskUpdateEvent> for StreamResponse {
    fn from(event: TaskUpdateEvent) -> Self {
        match event {
            TaskUpdateEvent::Status(event) => StreamResponse::Status(event),
            TaskUpdateEvent::Artifact(event) => StreamResponse::Artifact(event),
        }
    }
}
