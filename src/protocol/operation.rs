//! A2A protocol operations

use super::{agent::AGENT_CARD_PATH, message::Message};

/// A2A protocol operations
///
/// Each variant is one abstract operation a client can perform against a
/// remote agent. The RPC operations share the JSON-RPC endpoint; discovery
/// is a plain GET on a well-known path.
#[derive(Debug, Clone)]
pub enum A2AOperation {
    /// Send a message to an agent
    SendMessage {
        /// The message to send. Its task and context ids address an existing task
        message: Message,

        /// Whether to stream the response (`message/stream`)
        stream: bool,
    },

    /// Get a task by ID
    GetTask {
        /// The task ID to retrieve
        task_id: String,
    },

    /// Cancel a task
    CancelTask {
        /// The task ID to cancel
        task_id: String,
    },

    /// Fetch the Agent Card from a well-known path
    DiscoverAgent {
        /// Path relative to the agent base URL
        path: String,
    },
}

impl A2AOperation {
    /// Discover the agent at the primary well-known path
    pub fn discover() -> Self {
        A2AOperation::DiscoverAgent {
            path: AGENT_CARD_PATH.to_string(),
        }
    }

    /// Get the HTTP endpoint path for this operation
    pub fn endpoint(&self) -> &str {
        match self {
            A2AOperation::DiscoverAgent { path } => path,
            _ => "/",
        }
    }

    /// Get the HTTP method for this operation
    pub fn method(&self) -> &'static str {
        match self {
            A2AOperation::DiscoverAgent { .. } => "GET",
            _ => "POST",
        }
    }

    /// Check if this operation expects a streaming response
    pub fn is_streaming(&self) -> bool {
        matches!(self, A2AOperation::SendMessage { stream: true, .. })
    }

    /// Short operation name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            A2AOperation::SendMessage { stream: false, .. } => "send_message",
            A2AOperation::SendMessage { stream: true, .. } => "stream_message",
            A2AOperation::GetTask { .. } => "get_task",
            A2AOperation::CancelTask { .. } => "cancel_task",
            A2AOperation::DiscoverAgent { .. } => "discover_agent",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::agent::LEGACY_AGENT_CARD_PATH;

    #[test]
    fn test_operation_endpoints() {
        let op = A2AOperation::SendMessage {
            message: Message::user("test"),
            stream: false,
        };
        assert_eq!(op.endpoint(), "/");
        assert_eq!(op.method(), "POST");

        let op = A2AOperation::GetTask {
            task_id: "task-123".to_string(),
        };
        assert_eq!(op.endpoint(), "/");
        assert_eq!(op.method(), "POST");

        let op = A2AOperation::discover();
        assert_eq!(op.endpoint(), "/.well-known/agent-card.json");
        assert_eq!(op.method(), "GET");

        let op = A2AOperation::DiscoverAgent {
            path: LEGACY_AGENT_CARD_PATH.to_string(),
        };
        assert_eq!(op.endpoint(), "/.well-known/agent.json");
    }

    #[test]
    fn test_operation_streaming() {
        let op = A2AOperation::SendMessage {
            message: Message::user("test"),
            stream: true,
        };
        assert!(op.is_streaming());
        assert_eq!(op.name(), "stream_message");

        let op = A2AOperation::CancelTask {
            task_id: "task-123".to_string(),
        };
        assert!(!op.is_streaming());
    }
}
