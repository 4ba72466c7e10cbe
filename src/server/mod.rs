//! Agent-side task processing and its HTTP surface
//!
//! A [`RequestHandler`] starts one [`TaskExecutor`] run per submitted message.
//! The executor reports progress over a bounded per-task channel; the handler
//! writes each update to the [`TaskStore`] and relays it to the caller, either
//! as Server-Sent Events or by draining it into a final task snapshot.

pub mod app;
pub mod channel;
pub mod config;
pub mod executor;
pub mod handler;
pub mod store;

pub use app::{create_router, A2AServer, AppState, BoundServer};
pub use channel::{event_channel, EventReceiver, EventSender};
pub use config::ServerConfig;
pub use executor::{ExecutionContext, Skill, SkillOutput, TaskExecutor, TaskUpdater};
pub use handler::{EventStream, RequestHandler};
pub use store::{Creation, TaskStore};
