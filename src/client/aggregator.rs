//! Drives a remote task end to end and reduces its updates to one result

use futures::StreamExt;
use tracing::{debug, info};
use url::Url;

use crate::{
    client::{builder::A2AClientBuilder, config::ClientConfig, SendMessageResponse},
    protocol::{
        error::A2AError,
        event::StreamResponse,
        message::Message,
        task::{Task, TaskState},
    },
};

/// Final outcome of a remote task
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedResult {
    /// Remote task id, absent when the agent answered with a plain message
    pub task_id: Option<String>,

    /// Last state observed, absent when no status was ever reported
    pub state: Option<TaskState>,

    /// Reduced text of all artifacts
    pub text: String,
}

/// Folds task frames into a running result
///
/// A non-appending artifact replaces the result with its text, an appending
/// one is concatenated onto it. Status frames only move the state.
#[derive(Debug, Default)]
pub struct ResultReducer {
    task_id: Option<String>,
    state: Option<TaskState>,
    text: String,
    produced_output: bool,
    finished: bool,
    status_message: Option<String>,
}

impl ResultReducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a final frame has been applied
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn check_task(&mut self, task_id: &str) -> Result<(), A2AError> {
        match &self.task_id {
            Some(known) if known != task_id => Err(A2AError::StreamProtocol(format!(
                "update for task {} on the stream of task {}",
                task_id, known
            ))),
            Some(_) => Ok(()),
            None => {
                self.task_id = Some(task_id.to_string());
                Ok(())
            }
        }
    }

    fn move_to(&mut self, next: TaskState) -> Result<(), A2AError> {
        if let Some(current) = self.state {
            if !current.can_transition_to(next) {
                return Err(A2AError::StreamProtocol(format!(
                    "out-of-order status {} after {}",
                    next, current
                )));
            }
        }
        self.state = Some(next);
        Ok(())
    }

    /// Replace the running result with a task snapshot
    pub fn apply_task(&mut self, task: &Task) -> Result<(), A2AError> {
        self.check_task(&task.id)?;
        self.state = Some(task.state());
        self.text = task.artifacts.iter().map(|a| a.text_content()).collect();
        self.produced_output = !task.artifacts.is_empty();
        self.status_message = task.status.message.as_ref().map(Message::text);
        Ok(())
    }

    /// Apply one frame
    ///
    /// # Errors
    ///
    /// `A2AError::StreamProtocol` for a frame after the final one, a frame of
    /// another task, or a status that is not a lifecycle successor.
    pub fn apply(&mut self, frame: &StreamResponse) -> Result<(), A2AError> {
        if self.finished {
            return Err(A2AError::StreamProtocol(
                "update received after the final event".into(),
            ));
        }

        match frame {
            StreamResponse::Task(task) => self.apply_task(task)?,
            StreamResponse::Message(message) => {
                self.text.push_str(&message.text());
                self.produced_output = true;
            }
            StreamResponse::Status(event) => {
                self.check_task(&event.task_id)?;
                self.move_to(event.status.state)?;
                if let Some(message) = &event.status.message {
                    self.status_message = Some(message.text());
                }
            }
            StreamResponse::Artifact(event) => {
                self.check_task(&event.task_id)?;
                let text = event.artifact.text_content();
                if event.append {
                    self.text.push_str(&text);
                } else {
                    self.text = text;
                }
                self.produced_output = true;
            }
        }

        self.finished = frame.is_final();
        Ok(())
    }

    /// Produce the result
    ///
    /// # Errors
    ///
    /// `A2AError::Execution` when the task failed or was canceled without
    /// producing any output.
    pub fn finish(self) -> Result<AggregatedResult, A2AError> {
        if let Some(state) = self.state.filter(TaskState::is_unsuccessful) {
            if !self.produced_output {
                return Err(A2AError::Execution {
                    task_id: self.task_id.unwrap_or_default(),
                    state,
                    message: self
                        .status_message
                        .unwrap_or_else(|| "task produced no output".to_string()),
                });
            }
        }

        Ok(AggregatedResult {
            task_id: self.task_id,
            state: self.state,
            text: self.text,
        })
    }
}

/// Client-side driver of a remote task
///
/// Resolves the remote card, sends one text message and reduces everything
/// the agent sends back. Streaming is used when the card advertises it;
/// otherwise a non-terminal task is polled until it finishes.
#[derive(Debug, Clone, Default)]
pub struct StreamingAggregator {
    config: ClientConfig,
}

impl StreamingAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` for every run; its agent URL is ignored
    pub fn with_config(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Run `text` against the agent at `remote_url` and return the result text
    pub async fn run(&self, remote_url: &str, text: &str) -> Result<String, A2AError> {
        Ok(self.run_detailed(remote_url, text).await?.text)
    }

    /// Like [`run`](Self::run), keeping the task id and final state
    pub async fn run_detailed(
        &self,
        remote_url: &str,
        text: &str,
    ) -> Result<AggregatedResult, A2AError> {
        self.run_message(remote_url, Message::user(text)).await
    }

    /// Send a prepared message, e.g. one continuing an input-required task
    pub async fn run_message(
        &self,
        remote_url: &str,
        message: Message,
    ) -> Result<AggregatedResult, A2AError> {
        let base = parse_url(remote_url)?;
        let mut discovery = A2AClientBuilder::new_http(base.clone())
            .with_config(self.config.clone())
            .build()?;
        let card = discovery.discover().await?;

        // The card names the RPC endpoint; fall back to where it was found
        let endpoint = Url::parse(&card.url).unwrap_or(base);
        let mut client = A2AClientBuilder::new_http(endpoint)
            .with_config(self.config.clone())
            .build()?;

        let mut reducer = ResultReducer::new();

        if card.capabilities.streaming {
            let mut stream = client.send_message_streaming(message).await?;

            loop {
                let next = tokio::time::timeout(self.config.idle_timeout, stream.next()).await?;
                let Some(frame) = next else {
                    debug!("update stream ended");
                    break;
                };

                let frame = frame?;
                debug!(kind = frame_kind(&frame), "received update");
                reducer.apply(&frame)?;
                if reducer.is_finished() {
                    break;
                }
            }
        } else {
            match client.send_message(message).await? {
                SendMessageResponse::Message(message) => {
                    reducer.apply(&StreamResponse::Message(message))?;
                }
                SendMessageResponse::Task(task) => {
                    let task = if task.is_terminal() || task.requires_input() {
                        task
                    } else {
                        client.poll_until_complete(task.id.clone()).await?
                    };
                    reducer.apply_task(&task)?;
                }
            }
        }

        let result = reducer.finish()?;
        info!(
            agent = %card.name,
            task_id = result.task_id.as_deref().unwrap_or("-"),
            state = result.state.map(|s| s.as_str()).unwrap_or("-"),
            "remote task finished"
        );
        Ok(result)
    }
}

fn parse_url(remote_url: &str) -> Result<Url, A2AError> {
    Url::parse(remote_url).map_err(|e| A2AError::Discovery {
        url: remote_url.to_string(),
        source: Box::new(A2AError::Validation(format!("Invalid agent URL: {}", e))),
    })
}

fn frame_kind(frame: &StreamResponse) -> &'static str {
    match frame {
        StreamResponse::Task(_) => "task",
        StreamResponse::Message(_) => "message",
        StreamResponse::Status(_) => "status-update",
        StreamResponse::Artifact(_) => "artifact-update",
    }
}

#[cfg(test)]
mod tests {
    use crate::protocol::{
        event::{TaskArtifactUpdateEvent, TaskStatusUpdateEvent},
        task::TaskStatus,
        Artifact,
    };

    use super::*;

    fn artifact(task_id: &str, text: &str, append: bool) -> StreamResponse {
        StreamResponse::Artifact(TaskArtifactUpdateEvent {
            task_id: task_id.into(),
            context_id: "ctx".into(),
            artifact: Artifact::text(text),
            append,
            is_final: false,
        })
    }

    fn status(task_id: &str, state: TaskState, is_final: bool) -> StreamResponse {
        StreamResponse::Status(TaskStatusUpdateEvent {
            task_id: task_id.into(),
            context_id: "ctx".into(),
            status: TaskStatus::new(state),
            is_final,
        })
    }

    fn reduce(frames: &[StreamResponse]) -> Result<AggregatedResult, A2AError> {
        let mut reducer = ResultReducer::new();
        for frame in frames {
            reducer.apply(frame)?;
        }
        reducer.finish()
    }

    #[test]
    fn test_replace_then_append() {
        let result = reduce(&[
            artifact("t", "A", false),
            artifact("t", "B", true),
            status("t", TaskState::Completed, true),
        ])
        .unwrap();

        assert_eq!(result.text, "AB");
        assert_eq!(result.state, Some(TaskState::Completed));
        assert_eq!(result.task_id.as_deref(), Some("t"));
    }

    #[test]
    fn test_snapshot_replaces_earlier_artifacts() {
        let result = reduce(&[
            status("t", TaskState::Working, false),
            artifact("t", "draft", false),
            artifact("t", " more", true),
            artifact("t", "final", false),
            status("t", TaskState::Completed, true),
        ])
        .unwrap();

        assert_eq!(result.text, "final");
    }

    #[test]
    fn test_failed_without_output_is_an_error() {
        let err = reduce(&[status("t", TaskState::Failed, true)]).unwrap_err();

        match err {
            A2AError::Execution { task_id, state, .. } => {
                assert_eq!(task_id, "t");
                assert_eq!(state, TaskState::Failed);
            }
            other => panic!("Expected Execution error, got {other:?}"),
        }
    }

    #[test]
    fn test_failed_with_diagnostic_keeps_text() {
        let result = reduce(&[
            status("t", TaskState::Working, false),
            artifact("t", "Error: boom", false),
            status("t", TaskState::Failed, true),
        ])
        .unwrap();

        assert_eq!(result.state, Some(TaskState::Failed));
        assert_eq!(result.text, "Error: boom");
    }

    #[test]
    fn test_event_after_final_is_rejected() {
        let mut reducer = ResultReducer::new();
        reducer
            .apply(&status("t", TaskState::Canceled, true))
            .unwrap();

        let err = reducer.apply(&artifact("t", "late", true)).unwrap_err();
        assert!(matches!(err, A2AError::StreamProtocol(_)));
    }

    #[test]
    fn test_foreign_task_and_backwards_status_are_rejected() {
        let mut reducer = ResultReducer::new();
        reducer.apply(&status("t", TaskState::Working, false)).unwrap();

        let err = reducer.apply(&artifact("other", "x", false)).unwrap_err();
        assert!(matches!(err, A2AError::StreamProtocol(_)));

        let err = reducer
            .apply(&status("t", TaskState::Submitted, false))
            .unwrap_err();
        assert!(matches!(err, A2AError::StreamProtocol(_)));
    }

    #[test]
    fn test_stream_ending_without_final_keeps_partial_result() {
        let result = reduce(&[
            status("t", TaskState::Working, false),
            artifact("t", "Which job ID?", false),
            status("t", TaskState::InputRequired, false),
        ])
        .unwrap();

        assert_eq!(result.state, Some(TaskState::InputRequired));
        assert_eq!(result.text, "Which job ID?");
    }

    #[test]
    fn test_direct_message_reply() {
        let result = reduce(&[StreamResponse::Message(Message::agent("Hello there"))]).unwrap();

        assert_eq!(result.text, "Hello there");
        assert_eq!(result.task_id, None);
    }

    #[tokio::test]
    async fn test_invalid_url_is_a_discovery_error() {
        let err = StreamingAggregator::new()
            .run("not a url", "hi")
            .await
            .unwrap_err();

        assert!(matches!(err, A2AError::Discovery { .. }));
    }
}
