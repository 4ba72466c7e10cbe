//! High-level A2A agent client

use tower::ServiceExt;
use tower_service::Service;
use tracing::debug;

use crate::{
    client::{config::ClientConfig, resolver::CardResolver},
    protocol::{A2AError, A2AOperation, AgentCard, Message, Task},
    service::{A2ARequest, A2AResponse, RequestContext, UpdateStream},
};

/// Result of a non-streaming `message/send`
#[derive(Debug, Clone, PartialEq)]
pub enum SendMessageResponse {
    /// The agent created (or continued) a task
    Task(Task),

    /// The agent answered directly
    Message(Message),
}

/// High-level A2A client for interacting with agents
///
/// This client wraps a Tower service and provides convenient methods for common A2A operations.
/// The service is generic over any implementation that satisfies the Service trait bounds.
///
/// # Example
///
/// ```rust,no_run
/// use a2a_taskflow::prelude::*;
///
/// # async fn example() -> Result<(), A2AError> {
/// let url = "http://localhost:10001".parse().unwrap();
/// let mut client = A2AClientBuilder::new_http(url).build()?;
///
/// let card = client.discover().await?;
/// let reply = client.send_message(Message::user("Find jobs at Google")).await?;
/// println!("{} answered: {:?}", card.name, reply);
/// # Ok(())
/// # }
/// ```
pub struct AgentClient<S> {
    service: S,
    config: ClientConfig,
}

impl<S> AgentClient<S>
where
    S: Service<A2ARequest, Response = A2AResponse, Error = A2AError>,
{
    /// Create a new agent client
    ///
    /// # Arguments
    ///
    /// * `service` - The Tower service that handles requests
    /// * `config` - Client configuration
    pub fn new(service: S, config: ClientConfig) -> Self {
        Self { service, config }
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn build_context(&self) -> RequestContext {
        RequestContext::from_config(&self.config)
    }

    async fn call(&mut self, operation: A2AOperation) -> Result<A2AResponse, A2AError> {
        let request = A2ARequest::new(operation, self.build_context());
        self.service.ready().await?.call(request).await
    }

    /// Discover agent capabilities by fetching the Agent Card
    ///
    /// Tries every configured well-known path in order.
    pub async fn discover(&mut self) -> Result<AgentCard, A2AError> {
        let context = self.build_context();
        CardResolver::new(self.config.discovery_paths.clone())
            .resolve(&mut self.service, &context)
            .await
    }

    /// Send a message to the agent
    ///
    /// # Returns
    ///
    /// The task the agent created for the message, or its direct reply
    pub async fn send_message(&mut self, message: Message) -> Result<SendMessageResponse, A2AError> {
        let operation = A2AOperation::SendMessage {
            message,
            stream: false,
        };

        match self.call(operation).await? {
            A2AResponse::Task(task) => Ok(SendMessageResponse::Task(*task)),
            A2AResponse::Message(message) => Ok(SendMessageResponse::Message(*message)),
            other => Err(A2AError::Protocol(format!(
                "Expected task or message from send_message, got {:?}",
                other
            ))),
        }
    }

    /// Send a message and receive task updates as they are produced
    pub async fn send_message_streaming(
        &mut self,
        message: Message,
    ) -> Result<UpdateStream, A2AError> {
        let operation = A2AOperation::SendMessage {
            message,
            stream: true,
        };

        match self.call(operation).await? {
            A2AResponse::Stream(stream) => Ok(stream),
            other => Err(A2AError::Protocol(format!(
                "Expected update stream from send_message_streaming, got {:?}",
                other
            ))),
        }
    }

    /// Get a task by ID
    ///
    /// # Errors
    ///
    /// Returns `A2AError::UnknownTask` if the task doesn't exist
    pub async fn get_task(&mut self, task_id: impl Into<String>) -> Result<Task, A2AError> {
        let operation = A2AOperation::GetTask {
            task_id: task_id.into(),
        };

        self.call(operation)
            .await?
            .into_task()
            .ok_or_else(|| A2AError::Protocol("Expected task response from get_task".into()))
    }

    /// Cancel a task by ID
    ///
    /// Cancelling a task that already finished returns it unchanged.
    pub async fn cancel_task(&mut self, task_id: impl Into<String>) -> Result<Task, A2AError> {
        let operation = A2AOperation::CancelTask {
            task_id: task_id.into(),
        };

        self.call(operation)
            .await?
            .into_task()
            .ok_or_else(|| A2AError::Protocol("Expected task response from cancel_task".into()))
    }

    /// Poll a task until it stops making progress on its own
    ///
    /// Repeatedly calls `get_task` until the task is terminal or waits for
    /// input, using the configured interval and attempt limit.
    ///
    /// # Errors
    ///
    /// `A2AError::Timeout` once the attempt limit is reached
    pub async fn poll_until_complete(&mut self, task_id: impl Into<String>) -> Result<Task, A2AError> {
        let task_id = task_id.into();
        let max_attempts = self.config.max_poll_attempts;
        let mut attempts = 0;

        loop {
            let task = self.get_task(task_id.clone()).await?;

            if task.is_terminal() || task.requires_input() {
                return Ok(task);
            }

            attempts += 1;
            if max_attempts > 0 && attempts >= max_attempts {
                return Err(A2AError::Timeout);
            }

            debug!(task_id = %task_id, state = %task.state(), attempts, "task still running");
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}
