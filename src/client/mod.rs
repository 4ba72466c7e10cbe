//! High-level client API for A2A protocol

pub mod aggregator;
pub mod agent;
pub mod builder;
pub mod config;
pub mod resolver;

pub use aggregator::{AggregatedResult, ResultReducer, StreamingAggregator};
pub use agent::{AgentClient, SendMessageResponse};
pub use builder::{A2AClient, A2AClientBuilder, A2AService};
pub use config::ClientConfig;
pub use resolver::CardResolver;
