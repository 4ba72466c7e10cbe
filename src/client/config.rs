//! Client configuration

use std::time::Duration;

use crate::protocol::agent::{AGENT_CARD_PATH, LEGACY_AGENT_CARD_PATH};

/// Configuration for an A2A client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the agent
    pub agent_url: String,

    /// Bound on every discovery or message-submission call
    pub timeout: Duration,

    /// Longest wait for the next frame of an update stream
    pub idle_timeout: Duration,

    /// Enable request and response validation
    pub validate_responses: bool,

    /// Well-known card paths, tried in order
    pub discovery_paths: Vec<String>,

    /// Delay between `tasks/get` polls
    pub poll_interval: Duration,

    /// Maximum number of polls before giving up (0 = unlimited)
    pub max_poll_attempts: usize,
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(agent_url: impl Into<String>) -> Self {
        Self {
            agent_url: agent_url.into(),
            timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(30),
            validate_responses: true,
            discovery_paths: vec![
                AGENT_CARD_PATH.to_string(),
                LEGACY_AGENT_CARD_PATH.to_string(),
            ],
            poll_interval: Duration::from_millis(500),
            max_poll_attempts: 120,
        }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the stream idle timeout
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Enable or disable response validation
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_responses = enabled;
        self
    }

    /// Replace the discovery path list
    pub fn with_discovery_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.discovery_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Set the polling cadence for non-streaming tasks
    pub fn with_polling(mut self, interval: Duration, max_attempts: usize) -> Self {
        self.poll_interval = interval;
        self.max_poll_attempts = max_attempts;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("")
    }
}
