//! Server configuration

use std::time::Duration;

/// Configuration for an agent server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Port to bind, `0` for an ephemeral port
    pub port: u16,

    /// URL advertised in the agent card; derived from the bound address when unset
    pub public_url: Option<String>,

    /// Buffered updates per task before the executor waits for the consumer
    pub channel_capacity: usize,

    /// Interval between SSE keep-alive comments
    pub keep_alive: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            public_url: None,
            channel_capacity: 32,
            keep_alive: Duration::from_secs(15),
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = Some(url.into());
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn with_keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = interval;
        self
    }

    /// `host:port` as passed to the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();

        assert_eq!(config.channel_capacity, 32);
        assert_eq!(config.keep_alive, Duration::from_secs(15));
        assert_eq!(config.bind_address(), "127.0.0.1:0");
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let config = ServerConfig::new("0.0.0.0", 10001).with_channel_capacity(0);

        assert_eq!(config.channel_capacity, 1);
        assert_eq!(config.bind_address(), "0.0.0.0:10001");
    }
}
