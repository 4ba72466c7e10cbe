//! Requests handled by the protocol service

use std::time::Duration;

use crate::{client::config::ClientConfig, protocol::operation::A2AOperation};

/// Sent with every outbound call
pub const USER_AGENT: &str = concat!("a2a-taskflow/", env!("CARGO_PKG_VERSION"));

/// One operation addressed to one agent
#[derive(Debug, Clone)]
pub struct A2ARequest {
    pub operation: A2AOperation,
    pub context: RequestContext,
}

impl A2ARequest {
    pub fn new(operation: A2AOperation, context: RequestContext) -> Self {
        Self { operation, context }
    }
}

/// Where a request goes and how long it may take
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Base URL of the target agent
    pub agent_url: String,

    /// Bound on the whole exchange; for streams, on receiving the response head
    pub timeout: Option<Duration>,

    /// Extra HTTP headers, sent in order
    pub headers: Vec<(String, String)>,
}

impl RequestContext {
    pub fn new(agent_url: impl Into<String>) -> Self {
        Self {
            agent_url: agent_url.into(),
            timeout: None,
            headers: vec![("User-Agent".to_string(), USER_AGENT.to_string())],
        }
    }

    /// Context for a call made under `config`
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.agent_url.clone()).with_timeout(config.timeout)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_from_config() {
        let config = ClientConfig::new("http://localhost:10001").with_timeout(Duration::from_secs(5));

        let context = RequestContext::from_config(&config).with_header("X-Trace", "abc");

        assert_eq!(context.agent_url, "http://localhost:10001");
        assert_eq!(context.timeout, Some(Duration::from_secs(5)));
        assert_eq!(context.headers[0].0, "User-Agent");
        assert!(context.headers[0].1.starts_with("a2a-taskflow/"));
        assert_eq!(context.headers[1], ("X-Trace".to_string(), "abc".to_string()));
    }

    #[test]
    fn test_bare_context_is_unbounded() {
        assert_eq!(RequestContext::new("http://localhost:10002").timeout, None);
    }
}
