//! A2A service response types

use std::{fmt, pin::Pin};

use futures::Stream;

use crate::protocol::{
    agent::AgentCard, error::A2AError, event::StreamResponse, message::Message, task::Task,
};

/// Frames of a `message/stream` response, in arrival order
pub type UpdateStream = Pin<Box<dyn Stream<Item = Result<StreamResponse, A2AError>> + Send>>;

/// Response from an A2A service operation
pub enum A2AResponse {
    /// Task response (from SendMessage, GetTask, CancelTask)
    Task(Box<Task>),

    /// Direct reply to SendMessage without a task
    Message(Box<Message>),

    /// Agent card response (from DiscoverAgent)
    AgentCard(Box<AgentCard>),

    /// Live update stream (from streaming SendMessage)
    Stream(UpdateStream),
}

impl A2AResponse {
    /// Extract a task from the response, if present
    pub fn into_task(self) -> Option<Task> {
        match self {
            A2AResponse::Task(task) => Some(*task),
            _ => None,
        }
    }

    /// Extract an agent card from the response, if present
    pub fn into_agent_card(self) -> Option<AgentCard> {
        match self {
            A2AResponse::AgentCard(card) => Some(*card),
            _ => None,
        }
    }

    /// Extract an update stream from the response, if present
    pub fn into_stream(self) -> Option<UpdateStream> {
        match self {
            A2AResponse::Stream(stream) => Some(stream),
            _ => None,
        }
    }
}

impl fmt::Debug for A2AResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            A2AResponse::Task(task) => f.debug_tuple("Task").field(task).finish(),
            A2AResponse::Message(message) => f.debug_tuple("Message").field(message).finish(),
            A2AResponse::AgentCard(card) => f.debug_tuple("AgentCard").field(card).finish(),
            A2AResponse::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}
