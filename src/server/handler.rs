//! Request handler: starts executor runs and relays their updates

use std::{pin::Pin, sync::Arc, time::Duration};

use dashmap::{mapref::entry::Entry, DashMap};
use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    layer::validate_id,
    protocol::{event::TaskUpdateEvent, A2AError, A2AResult, Message, Task},
    server::{
        channel::event_channel,
        executor::{ExecutionContext, TaskExecutor},
        store::{Creation, TaskStore},
    },
};

/// Live updates of one task run
pub type EventStream = Pin<Box<dyn Stream<Item = TaskUpdateEvent> + Send>>;

/// How long `cancel` waits for a running executor to wind down
const CANCEL_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct RunningTask {
    cancellation: CancellationToken,
    done: watch::Receiver<bool>,
}

struct Inner {
    store: TaskStore,
    executor: TaskExecutor,
    running: DashMap<String, RunningTask>,
    channel_capacity: usize,
}

/// Entry point for task submissions, lookups and cancellation
///
/// At most one executor runs per task. Each update is written to the
/// [`TaskStore`] before it is queued for the stream, so `get` never lags
/// behind what a stream consumer has seen, and a consumer that stops reading
/// cannot keep a finished run out of the store.
#[derive(Clone)]
pub struct RequestHandler {
    inner: Arc<Inner>,
}

impl RequestHandler {
    pub fn new(store: TaskStore, executor: TaskExecutor, channel_capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                executor,
                running: DashMap::new(),
                channel_capacity,
            }),
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.inner.store
    }

    /// Start a run for `message`, taking the ids from the message or assigning fresh ones
    ///
    /// A message naming a known task without a context joins that task's
    /// context. Returns the task id together with the update stream.
    pub fn submit_message(&self, message: Message) -> A2AResult<(String, EventStream)> {
        let task_id = message
            .task_id
            .clone()
            .unwrap_or_else(|| Uuid::now_v7().to_string());
        let context_id = message
            .context_id
            .clone()
            .or_else(|| self.inner.store.get(&task_id).map(|task| task.context_id))
            .unwrap_or_else(|| Uuid::now_v7().to_string());

        let events = self.submit(&task_id, &context_id, message)?;
        Ok((task_id, events))
    }

    /// Create or resume `task_id` and start its executor
    ///
    /// # Errors
    ///
    /// - `A2AError::Validation` for malformed identifiers
    /// - `A2AError::DuplicateTask` when the id belongs to another context
    /// - `A2AError::TerminalTask` when the task already finished
    /// - `A2AError::TaskBusy` while a previous run of the task is still going
    pub fn submit(&self, task_id: &str, context_id: &str, message: Message) -> A2AResult<EventStream> {
        validate_id("task id", task_id)?;
        validate_id("context id", context_id)?;

        let store = &self.inner.store;
        let current_task = match store.create_or_fetch(task_id, context_id)? {
            Creation::Created(_) => None,
            Creation::Existing(task) => {
                if store.is_finalized(task_id) {
                    return Err(A2AError::TerminalTask {
                        task_id: task_id.to_string(),
                    });
                }
                Some(task)
            }
        };

        let cancellation = CancellationToken::new();
        let (done_tx, done_rx) = watch::channel(false);
        match self.inner.running.entry(task_id.to_string()) {
            Entry::Occupied(_) => {
                return Err(A2AError::TaskBusy {
                    task_id: task_id.to_string(),
                })
            }
            Entry::Vacant(vacant) => {
                vacant.insert(RunningTask {
                    cancellation: cancellation.clone(),
                    done: done_rx,
                });
            }
        }

        store.append_history(task_id, message.clone())?;
        info!(
            task_id,
            context_id,
            resumed = current_task.is_some(),
            "task submitted"
        );

        let (sender, mut receiver) =
            event_channel(self.inner.channel_capacity, cancellation.clone());
        let mut sender = sender.recording(store.clone());
        let context = ExecutionContext {
            task_id: task_id.to_string(),
            context_id: context_id.to_string(),
            message,
            current_task,
            cancellation,
        };

        let handler = self.clone();
        tokio::spawn(async move {
            let task_id = context.task_id.clone();
            let outcome = handler.inner.executor.execute(context, &mut sender).await;
            if let Err(e) = &outcome {
                debug!(task_id = %task_id, error = %e, "executor stopped early");
            }
            handler.settle(&task_id, outcome.is_ok(), sender.consumer_disconnected());

            // The relay ends once the sender is gone, so a follow-up
            // submission must already find the task idle
            handler.inner.running.remove(&task_id);
            drop(sender);
            let _ = done_tx.send(true);
        });

        let task_id = task_id.to_string();
        let relay = async_stream::stream! {
            while let Some(event) = receiver.recv().await {
                debug!(task_id = %task_id, is_final = event.is_final(), "relaying update");
                yield event;
            }
        };

        Ok(Box::pin(relay))
    }

    /// Finalize a task whose run ended without a final update
    ///
    /// Only a run that completed normally may leave its task waiting for input.
    fn settle(&self, task_id: &str, completed: bool, disconnected: bool) {
        let store = &self.inner.store;
        if store.is_finalized(task_id) {
            return;
        }
        let parked = completed && store.get(task_id).is_some_and(|task| task.requires_input());
        if parked {
            return;
        }

        if disconnected {
            warn!(task_id, "update consumer disconnected, canceling task");
        } else {
            warn!(task_id, "run ended without a final update, canceling task");
        }
        if let Err(e) = store.cancel(task_id) {
            warn!(task_id, error = %e, "failed to cancel task");
        }
    }

    /// Run `message` to the end of its executor run and return the task
    pub async fn send(&self, message: Message) -> A2AResult<Task> {
        let (task_id, mut events) = self.submit_message(message)?;
        while events.next().await.is_some() {}
        self.get(&task_id)
    }

    /// Look up a task
    pub fn get(&self, task_id: &str) -> A2AResult<Task> {
        self.inner
            .store
            .get(task_id)
            .ok_or_else(|| A2AError::UnknownTask {
                task_id: task_id.to_string(),
            })
    }

    /// Cancel a task
    ///
    /// A running executor is signalled and given a grace period to emit its
    /// final update; past it the task is canceled in the store. A task with
    /// no run left is canceled in the store directly. Canceling a finished
    /// task returns it unchanged.
    pub async fn cancel(&self, task_id: &str) -> A2AResult<Task> {
        let task = self.get(task_id)?;
        if self.inner.store.is_finalized(task_id) {
            return Ok(task);
        }

        let running = self.inner.running.get(task_id).map(|r| r.clone());
        match running {
            Some(mut running) => {
                info!(task_id, "canceling running task");
                running.cancellation.cancel();
                let stopped = tokio::time::timeout(CANCEL_GRACE, running.done.wait_for(|done| *done))
                    .await
                    .is_ok();
                if stopped {
                    return self.get(task_id);
                }
                warn!(task_id, "executor did not stop within the grace period");
                self.inner.store.cancel(task_id)
            }
            None => {
                info!(task_id, "canceling idle task");
                self.inner.store.cancel(task_id)
            }
        }
    }

    /// Whether an executor is currently running for `task_id`
    pub fn is_running(&self, task_id: &str) -> bool {
        self.inner.running.contains_key(task_id)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;
    use tower::BoxError;

    use crate::{
        protocol::task::TaskState,
        server::executor::{Skill, SkillOutput},
    };

    use super::*;

    struct Echo;

    #[async_trait]
    impl Skill for Echo {
        async fn invoke(&self, text: &str, _: &ExecutionContext) -> Result<SkillOutput, BoxError> {
            Ok(SkillOutput::Completed(format!("echo: {}", text)))
        }
    }

    /// Blocks until released, then answers
    struct Gate(Arc<Notify>);

    #[async_trait]
    impl Skill for Gate {
        async fn invoke(&self, _: &str, _: &ExecutionContext) -> Result<SkillOutput, BoxError> {
            self.0.notified().await;
            Ok(SkillOutput::Completed("released".into()))
        }
    }

    /// Asks for a job id unless the message carries one
    struct NeedsId;

    #[async_trait]
    impl Skill for NeedsId {
        async fn invoke(&self, text: &str, _: &ExecutionContext) -> Result<SkillOutput, BoxError> {
            if text.contains("ID") {
                Ok(SkillOutput::Completed(format!("got {}", text)))
            } else {
                Ok(SkillOutput::NeedsInput("Which job ID?".into()))
            }
        }
    }

    fn handler(skill: impl Skill) -> RequestHandler {
        RequestHandler::new(TaskStore::new(), TaskExecutor::new(Arc::new(skill)), 8)
    }

    fn message(task_id: &str, text: &str) -> Message {
        Message::user(text).with_task(task_id, "ctx-1")
    }

    #[tokio::test]
    async fn test_send_returns_completed_task() {
        let handler = handler(Echo);

        let task = handler.send(message("t1", "hi")).await.unwrap();

        assert_eq!(task.state(), TaskState::Completed);
        assert_eq!(task.artifacts[0].text_content(), "echo: hi");
        assert_eq!(task.history.len(), 1);
        assert_eq!(handler.get("t1").unwrap(), task);
    }

    #[tokio::test]
    async fn test_assigns_ids_when_missing() {
        let handler = handler(Echo);

        let task = handler.send(Message::user("hi")).await.unwrap();

        assert!(!task.id.is_empty());
        assert!(!task.context_id.is_empty());
        assert_eq!(task.state(), TaskState::Completed);
    }

    #[tokio::test]
    async fn test_store_is_never_behind_the_stream() {
        let handler = handler(Echo);
        let mut events = handler.submit("t1", "ctx-1", Message::user("hi")).unwrap();

        let mut seen = Vec::new();
        while let Some(event) = events.next().await {
            if let Some(state) = event.state() {
                seen.push((state, handler.get("t1").unwrap().state()));
            }
        }

        let order: Vec<_> = seen.iter().map(|(state, _)| *state).collect();
        for (i, (_, stored)) in seen.iter().enumerate() {
            let at = order.iter().position(|state| state == stored).unwrap();
            assert!(at >= i, "store at {stored} behind streamed {}", order[i]);
        }
    }

    #[tokio::test]
    async fn test_dropping_stream_after_run_keeps_buffered_updates() {
        let handler = handler(Echo);
        let mut events = handler.submit("t1", "ctx-1", Message::user("hi")).unwrap();

        events.next().await;
        while handler.is_running("t1") {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        drop(events);

        let task = handler.get("t1").unwrap();
        assert_eq!(task.state(), TaskState::Completed);
        assert_eq!(task.artifacts[0].text_content(), "echo: hi");
        assert_eq!(handler.cancel("t1").await.unwrap().state(), TaskState::Completed);
    }

    #[tokio::test]
    async fn test_cancel_task_without_run_cancels_in_store() {
        let handler = handler(Echo);
        handler.store().create("t1", "ctx-1").unwrap();

        let task = handler.cancel("t1").await.unwrap();

        assert_eq!(task.state(), TaskState::Canceled);
        assert!(handler.store().is_finalized("t1"));
    }

    #[tokio::test]
    async fn test_rejects_malformed_ids() {
        let handler = handler(Echo);

        let err = handler
            .submit("bad id", "ctx-1", Message::user("hi"))
            .err()
            .unwrap();
        assert!(matches!(err, A2AError::Validation(_)));
    }

    #[tokio::test]
    async fn test_finished_task_cannot_be_resubmitted() {
        let handler = handler(Echo);
        handler.send(message("t1", "hi")).await.unwrap();

        let err = handler.send(message("t1", "again")).await.unwrap_err();
        assert!(matches!(err, A2AError::TerminalTask { .. }));
    }

    #[tokio::test]
    async fn test_second_submission_while_running_is_busy() {
        let gate = Arc::new(Notify::new());
        let handler = handler(Gate(gate.clone()));
        let _first = handler.submit("t1", "ctx-1", Message::user("a")).unwrap();

        let err = handler
            .submit("t1", "ctx-1", Message::user("b"))
            .err()
            .unwrap();
        assert!(matches!(err, A2AError::TaskBusy { .. }));
        gate.notify_one();
    }

    #[tokio::test]
    async fn test_input_required_then_resume() {
        let handler = handler(NeedsId);

        let task = handler.send(message("t1", "apply please")).await.unwrap();
        assert_eq!(task.state(), TaskState::InputRequired);

        let task = handler.send(message("t1", "ID google_0")).await.unwrap();
        assert_eq!(task.state(), TaskState::Completed);
        assert_eq!(task.artifacts[0].text_content(), "got ID google_0");
        assert_eq!(task.history.len(), 2);
    }

    #[tokio::test]
    async fn test_resume_without_context_joins_task_context() {
        let handler = handler(NeedsId);
        handler.send(message("t1", "apply please")).await.unwrap();

        let mut reply = Message::user("ID google_0");
        reply.task_id = Some("t1".into());
        let task = handler.send(reply).await.unwrap();

        assert_eq!(task.context_id, "ctx-1");
        assert_eq!(task.state(), TaskState::Completed);
    }

    #[tokio::test]
    async fn test_cancel_running_task_before_artifact() {
        let gate = Arc::new(Notify::new());
        let handler = handler(Gate(gate.clone()));
        let mut events = handler.submit("t1", "ctx-1", Message::user("a")).unwrap();

        let relay = tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(event) = events.next().await {
                seen.push(event);
            }
            seen
        });

        // Wait until the skill is parked on the gate
        while handler.get("t1").unwrap().state() != TaskState::Working {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let canceling = {
            let handler = handler.clone();
            tokio::spawn(async move { handler.cancel("t1").await })
        };
        while !handler.inner.running.get("t1").is_some_and(|r| r.cancellation.is_cancelled()) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        gate.notify_one();

        canceling.await.unwrap().unwrap();
        let seen = relay.await.unwrap();

        let task = handler.get("t1").unwrap();
        assert_eq!(task.state(), TaskState::Canceled);
        assert!(task.artifacts.is_empty());
        assert!(seen.last().unwrap().is_final());
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent_and_checks_existence() {
        let handler = handler(Echo);
        handler.send(message("t1", "hi")).await.unwrap();

        let task = handler.cancel("t1").await.unwrap();
        assert_eq!(task.state(), TaskState::Completed);

        let err = handler.cancel("missing").await.unwrap_err();
        assert!(matches!(err, A2AError::UnknownTask { .. }));
    }

    #[tokio::test]
    async fn test_cancel_waiting_task_cancels_in_store() {
        let handler = handler(NeedsId);
        handler.send(message("t1", "apply")).await.unwrap();

        let task = handler.cancel("t1").await.unwrap();
        assert_eq!(task.state(), TaskState::Canceled);
        assert_eq!(handler.cancel("t1").await.unwrap().state(), TaskState::Canceled);
    }

    #[tokio::test]
    async fn test_dropping_stream_cancels_task() {
        let gate = Arc::new(Notify::new());
        let handler = handler(Gate(gate.clone()));
        let mut events = handler.submit("t1", "ctx-1", Message::user("a")).unwrap();

        events.next().await;
        drop(events);
        gate.notify_one();

        while handler.is_running("t1") || !handler.store().is_finalized("t1") {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(handler.get("t1").unwrap().state(), TaskState::Canceled);
    }

    #[tokio::test]
    async fn test_distinct_tasks_do_not_block_each_other() {
        let gate = Arc::new(Notify::new());
        let blocked = handler(Gate(gate.clone()));
        let _parked = blocked.submit("slow", "ctx-1", Message::user("a")).unwrap();

        let task = tokio::time::timeout(Duration::from_secs(5), async {
            // Same store, different skill run: share the store through a second handler
            let fast = RequestHandler::new(
                blocked.store().clone(),
                TaskExecutor::new(Arc::new(Echo)),
                8,
            );
            fast.send(message("fast", "hi")).await
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(task.state(), TaskState::Completed);
        gate.notify_one();
    }
}
