//! Validation layer for A2A protocol requests and responses

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tower_layer::Layer;
use tower_service::Service;

use crate::{
    protocol::{
        error::A2AError,
        message::Part,
        operation::A2AOperation,
        task::TaskState,
    },
    service::{A2ARequest, A2AResponse},
};

/// Maximum length of a task or context identifier
pub const MAX_ID_LEN: usize = 128;

/// Check a task or context identifier: 1..=128 chars of `[A-Za-z0-9._:-]`
pub fn validate_id(kind: &str, id: &str) -> Result<(), A2AError> {
    if id.is_empty() || id.len() > MAX_ID_LEN {
        return Err(A2AError::Validation(format!(
            "{} must be 1 to {} characters",
            kind, MAX_ID_LEN
        )));
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '-');
    if !id.chars().all(allowed) {
        return Err(A2AError::Validation(format!(
            "{} contains invalid characters: {}",
            kind, id
        )));
    }

    Ok(())
}

/// Layer that validates A2A protocol requests and responses
#[derive(Clone, Debug, Default)]
pub struct A2AValidationLayer;

impl A2AValidationLayer {
    /// Create a new validation layer
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for A2AValidationLayer {
    type Service = A2AValidationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        A2AValidationService { inner }
    }
}

/// Validation service that wraps an inner service
#[derive(Clone, Debug)]
pub struct A2AValidationService<S> {
    inner: S,
}

impl<S> A2AValidationService<S> {
    /// Validate an A2A request
    fn validate_request(req: &A2ARequest) -> Result<(), A2AError> {
        match &req.operation {
            A2AOperation::SendMessage { message, .. } => {
                if message.parts.is_empty() {
                    return Err(A2AError::Validation(
                        "Message must have at least one part".into(),
                    ));
                }

                if message.message_id.is_empty() {
                    return Err(A2AError::Validation("Message ID cannot be empty".into()));
                }

                if let Some(task_id) = &message.task_id {
                    validate_id("Task ID", task_id)?;
                }
                if let Some(context_id) = &message.context_id {
                    validate_id("Context ID", context_id)?;
                }

                let has_text = message
                    .parts
                    .iter()
                    .any(|part| matches!(part, Part::Text(text) if !text.text.is_empty()));
                let has_other = message.parts.iter().any(|part| matches!(part, Part::Other(_)));
                if !has_text && !has_other {
                    return Err(A2AError::Validation("Text part cannot be empty".into()));
                }
            }
            A2AOperation::GetTask { task_id } | A2AOperation::CancelTask { task_id } => {
                validate_id("Task ID", task_id)?;
            }
            A2AOperation::DiscoverAgent { path } => {
                if !path.starts_with('/') {
                    return Err(A2AError::Validation(format!(
                        "Discovery path must be absolute: {}",
                        path
                    )));
                }
            }
        }

        if req.context.agent_url.is_empty() {
            return Err(A2AError::Validation("Agent URL cannot be empty".into()));
        }

        Ok(())
    }

    /// Validate an A2A response
    fn validate_response(resp: &A2AResponse) -> Result<(), A2AError> {
        match resp {
            A2AResponse::Task(task) => {
                validate_id("Task ID", &task.id)?;

                for artifact in &task.artifacts {
                    if artifact.parts.is_empty() {
                        return Err(A2AError::Validation(format!(
                            "Artifact {} of task {} has no parts",
                            artifact.artifact_id, task.id
                        )));
                    }
                }

                if task.state() == TaskState::Submitted && !task.artifacts.is_empty() {
                    return Err(A2AError::Validation(
                        "Submitted task cannot carry artifacts".into(),
                    ));
                }
            }
            A2AResponse::Message(message) => {
                if message.parts.is_empty() {
                    return Err(A2AError::Validation(
                        "Message must have at least one part".into(),
                    ));
                }
            }
            A2AResponse::AgentCard(card) => {
                if card.name.is_empty() {
                    return Err(A2AError::Validation("Agent name cannot be empty".into()));
                }
                if card.url.is_empty() {
                    return Err(A2AError::Validation("Agent card must have a URL".into()));
                }
            }
            // Frames are checked one by one by the consumer
            A2AResponse::Stream(_) => {}
        }

        Ok(())
    }
}

impl<S> Service<A2ARequest> for A2AValidationService<S>
where
    S: Service<A2ARequest, Response = A2AResponse, Error = A2AError> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = A2AResponse;
    type Error = A2AError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: A2ARequest) -> Self::Future {
        if let Err(e) = Self::validate_request(&req) {
            return Box::pin(async move { Err(e) });
        }

        // Drive the service that was polled ready, leave the clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move {
            let response = inner.call(req).await?;
            Self::validate_response(&response)?;
            Ok(response)
        })
    }
}
