//! Task executor: drives one run of a skill through the task lifecycle

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use async_trait::async_trait;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tower::BoxError;
use tracing::{debug, info, warn};

use crate::{
    protocol::{
        event::{TaskArtifactUpdateEvent, TaskStatusUpdateEvent, TaskUpdateEvent},
        task::{TaskState, TaskStatus},
        A2AResult, Artifact, Message, Task,
    },
    server::channel::EventSender,
};

/// What a skill produced for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillOutput {
    /// Final answer; the task completes
    Completed(String),

    /// The skill needs clarification; the task waits for another message
    NeedsInput(String),
}

/// Domain logic behind an agent
///
/// Errors and panics are turned into a failed task by the executor.
#[async_trait]
pub trait Skill: Send + Sync + 'static {
    /// Handle the concatenated request text of one message
    async fn invoke(&self, text: &str, context: &ExecutionContext) -> Result<SkillOutput, BoxError>;
}

/// Everything an executor run needs to know about its task
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub task_id: String,
    pub context_id: String,

    /// The message that started this run
    pub message: Message,

    /// Snapshot of the task before this run, `None` for a new task
    pub current_task: Option<Task>,

    /// Fires on `tasks/cancel` or when the update consumer goes away
    pub cancellation: CancellationToken,
}

impl ExecutionContext {
    /// Whether this run continues a task that asked for input
    pub fn is_resumed(&self) -> bool {
        self.current_task
            .as_ref()
            .is_some_and(|task| task.requires_input())
    }

    /// Texts of the messages received before this run, oldest first
    pub fn previous_texts(&self) -> Vec<String> {
        self.current_task
            .as_ref()
            .map(|task| task.history.iter().map(Message::text).collect())
            .unwrap_or_default()
    }
}

/// Builds update events for one task and sends them
pub struct TaskUpdater<'a> {
    task_id: &'a str,
    context_id: &'a str,
    events: &'a mut EventSender,
}

impl<'a> TaskUpdater<'a> {
    pub fn new(context: &'a ExecutionContext, events: &'a mut EventSender) -> Self {
        Self {
            task_id: &context.task_id,
            context_id: &context.context_id,
            events,
        }
    }

    pub async fn status(&mut self, state: TaskState, is_final: bool) -> A2AResult<()> {
        self.send_status(TaskStatus::new(state), is_final).await
    }

    /// Status carrying an agent message explaining it
    pub async fn status_with_message(
        &mut self,
        state: TaskState,
        text: impl Into<String>,
        is_final: bool,
    ) -> A2AResult<()> {
        let mut status = TaskStatus::new(state);
        status.message = Some(Message::agent(text).with_task(self.task_id, self.context_id));
        self.send_status(status, is_final).await
    }

    async fn send_status(&mut self, status: TaskStatus, is_final: bool) -> A2AResult<()> {
        debug!(task_id = self.task_id, state = %status.state, is_final, "emitting status");
        self.events
            .send(TaskUpdateEvent::Status(TaskStatusUpdateEvent {
                task_id: self.task_id.to_string(),
                context_id: self.context_id.to_string(),
                status,
                is_final,
            }))
            .await
    }

    /// Emit a single-part text artifact
    pub async fn artifact(&mut self, text: impl Into<String>, append: bool) -> A2AResult<()> {
        self.events
            .send(TaskUpdateEvent::Artifact(TaskArtifactUpdateEvent {
                task_id: self.task_id.to_string(),
                context_id: self.context_id.to_string(),
                artifact: Artifact::text(text),
                append,
                is_final: false,
            }))
            .await
    }

    pub async fn cancel(&mut self) -> A2AResult<()> {
        self.status(TaskState::Canceled, true).await
    }
}

/// Runs a [`Skill`] for one message and reports progress as task updates
///
/// A run emits `submitted` (new tasks only) and `working`, then the skill's
/// answer as one artifact followed by `completed`.
///
/// A run is canceled through [`ExecutionContext::cancellation`]. The token is
/// checked before the skill is called and before the artifact is emitted, and
/// a run that observes it ends with a final `canceled` update.
#[derive(Clone)]
pub struct TaskExecutor {
    skill: Arc<dyn Skill>,
}

impl TaskExecutor {
    pub fn new(skill: Arc<dyn Skill>) -> Self {
        Self { skill }
    }

    /// Execute one run
    ///
    /// Skill failures never escape: they end the task as failed. The only
    /// errors returned are delivery failures on the channel.
    pub async fn execute(&self, context: ExecutionContext, events: &mut EventSender) -> A2AResult<()> {
        let mut updater = TaskUpdater::new(&context, events);

        if context.current_task.is_none() {
            updater.status(TaskState::Submitted, false).await?;
        }
        updater.status(TaskState::Working, false).await?;

        if context.cancellation.is_cancelled() {
            info!(task_id = %context.task_id, "task canceled before dispatch");
            return updater.cancel().await;
        }

        let text = context.message.text();
        let outcome = AssertUnwindSafe(self.skill.invoke(&text, &context))
            .catch_unwind()
            .await;

        if context.cancellation.is_cancelled() {
            info!(task_id = %context.task_id, "task canceled before artifact");
            return updater.cancel().await;
        }

        let output = match outcome {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(task_id = %context.task_id, error = %e, "skill failed");
                return fail(&mut updater, format!("Error: {}", e)).await;
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                warn!(task_id = %context.task_id, %reason, "skill panicked");
                return fail(&mut updater, format!("Error: skill panicked: {}", reason)).await;
            }
        };

        match output {
            SkillOutput::Completed(reply) => {
                updater.artifact(reply, false).await?;
                updater.status(TaskState::Completed, true).await?;
                info!(task_id = %context.task_id, "task completed");
            }
            SkillOutput::NeedsInput(prompt) => {
                updater.artifact(prompt.clone(), false).await?;
                updater
                    .status_with_message(TaskState::InputRequired, prompt, false)
                    .await?;
                info!(task_id = %context.task_id, "task waiting for input");
            }
        }
        Ok(())
    }
}

async fn fail(updater: &mut TaskUpdater<'_>, diagnostic: String) -> A2AResult<()> {
    updater.artifact(diagnostic.clone(), false).await?;
    updater
        .status_with_message(TaskState::Failed, diagnostic, true)
        .await
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
