//! # A2A Taskflow
//!
//! Agent-to-agent task delegation over the A2A protocol.
//!
//! An agent publishes a card at `/.well-known/agent-card.json` and accepts
//! JSON-RPC 2.0 calls at its root: `message/send`, `message/stream`,
//! `tasks/get` and `tasks/cancel`. Each message starts or resumes a task
//! whose progress is reported as status and artifact updates.
//!
//! The crate has two halves built on Tower services:
//!
//! - **Client**: card discovery, a layered JSON-RPC client and the
//!   [`StreamingAggregator`](client::StreamingAggregator) that drives a remote
//!   task to completion and reduces its updates to one result
//! - **Server**: an axum router over a concurrent task store, running one
//!   [`Skill`](server::Skill) per task and streaming its updates as SSE
//!
//! The [`agents`] module wires both into a job search agent and a job apply
//! agent that delegates to it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use a2a_taskflow::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let aggregator = StreamingAggregator::new();
//!     let reply = aggregator
//!         .run("http://localhost:10001", "Find jobs at Google")
//!         .await?;
//!
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod client;
pub mod codec;
pub mod layer;
pub mod protocol;
pub mod server;
pub mod service;
pub mod transport;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        client::{A2AClientBuilder, AgentClient, ClientConfig, StreamingAggregator},
        protocol::error::A2AError,
        protocol::{
            A2AOperation, AgentCard, Message, Part, Role, Task, TaskState, TaskStatus,
        },
        server::{A2AServer, ServerConfig, Skill, SkillOutput},
    };
}
