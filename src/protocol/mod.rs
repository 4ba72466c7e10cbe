//! Core A2A protocol types and definitions

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub mod agent;
pub mod error;
pub mod event;
pub mod message;
pub mod operation;
pub mod task;

pub use agent::{AgentCapabilities, AgentCard, AgentSkill};
pub use error::{A2AError, A2AResult};
pub use event::{StreamResponse, TaskArtifactUpdateEvent, TaskStatusUpdateEvent, TaskUpdateEvent};
pub use message::{Message, Part, Role};
pub use operation::A2AOperation;
pub use task::{Task, TaskState, TaskStatus};

/// Artifacts represent task outputs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Unique identifier of the Artifact
    pub artifact_id: String,

    /// A human readable name for the Artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// A human readable description of the Artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Contents of the Artifact. Must contain at least one part
    pub parts: Vec<Part>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Artifact {
    /// Create an artifact with a fresh id
    pub fn new(parts: Vec<Part>) -> Self {
        Self {
            artifact_id: Uuid::now_v7().to_string(),
            name: None,
            description: None,
            parts,
            metadata: None,
        }
    }

    /// Create an artifact holding a single text part
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![Part::text(text)])
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Concatenated text of all text parts
    pub fn text_content(&self) -> String {
        message::concat_text(&self.parts)
    }
}
