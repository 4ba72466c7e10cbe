//! Error types for A2A protocol operations

use thiserror::Error;

use super::task::TaskState;

/// Main error type for A2A protocol operations
#[derive(Debug, Error)]
pub enum A2AError {
    /// Transport-level error (network, connection, etc.)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Protocol-level error (JSON-RPC error object, unsupported operation, etc.)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Validation error (invalid request or response)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A bounded network wait was exceeded
    #[error("Request timeout")]
    Timeout,

    /// No discovery path yielded a usable agent card
    ///
    /// `url` is the last URL that was attempted, `source` the reason it failed.
    #[error("Agent discovery failed at {url}: {source}")]
    Discovery {
        url: String,
        #[source]
        source: Box<A2AError>,
    },

    /// A live task with this id already exists under a different context
    #[error("Task {task_id} already exists in context {existing_context_id}")]
    DuplicateTask {
        task_id: String,
        existing_context_id: String,
    },

    /// No task with this id exists
    #[error("Task not found: {task_id}")]
    UnknownTask { task_id: String },

    /// Mutation attempted after the task received its final update
    #[error("Task {task_id} is already final")]
    TerminalTask { task_id: String },

    /// Status update that is not an edge of the task lifecycle graph
    #[error("Task {task_id} cannot move from {from} to {to}")]
    InvalidTransition {
        task_id: String,
        from: TaskState,
        to: TaskState,
    },

    /// An executor for this task is still running
    #[error("Task {task_id} is still being processed")]
    TaskBusy { task_id: String },

    /// The remote task ended unsuccessfully without producing output
    #[error("Task {task_id} ended as {state}: {message}")]
    Execution {
        task_id: String,
        state: TaskState,
        message: String,
    },

    /// Malformed or out-of-order update received on a task stream
    #[error("Stream protocol error: {0}")]
    StreamProtocol(String),
}

impl A2AError {
    /// Check if this error, or the discovery failure it wraps, is a timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            A2AError::Timeout => true,
            A2AError::Discovery { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

/// Result type alias for A2A operations
pub type A2AResult<T> = Result<T, A2AError>;

impl From<reqwest::Error> for A2AError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            A2AError::Timeout
        } else if err.is_connect() {
            A2AError::Transport(format!("Connection error: {}", err))
        } else {
            A2AError::Transport(err.to_string())
        }
    }
}

impl From<tokio::time::error::Elapsed> for A2AError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        A2AError::Timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_error_carries_url_and_cause() {
        let err = A2AError::Discovery {
            url: "http://agent/.well-known/agent.json".to_string(),
            source: Box::new(A2AError::Transport("HTTP error: 404".into())),
        };

        let text = err.to_string();
        assert!(text.contains("http://agent/.well-known/agent.json"));
        assert!(text.contains("404"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_timeout_detection() {
        assert!(A2AError::Timeout.is_timeout());

        let wrapped = A2AError::Discovery {
            url: "http://agent".to_string(),
            source: Box::new(A2AError::Timeout),
        };
        assert!(wrapped.is_timeout());
        assert!(!A2AError::StreamProtocol("x".into()).is_timeout());
    }
}
