//! Client builder for constructing A2A clients with composable layers

use std::{sync::Arc, time::Duration};

use tower::{util::BoxCloneService, ServiceBuilder};
use url::Url;

use crate::{
    client::{AgentClient, ClientConfig},
    codec::{Codec, JsonRpcCodec},
    layer::A2AValidationLayer,
    protocol::A2AError,
    service::{A2AProtocolService, A2ARequest, A2AResponse},
    transport::{HttpTransport, Transport},
};

/// Type-erased service stack produced by [`A2AClientBuilder`]
pub type A2AService = BoxCloneService<A2ARequest, A2AResponse, A2AError>;

/// Client assembled by [`A2AClientBuilder`]
pub type A2AClient = AgentClient<A2AService>;

/// Builder for constructing A2A clients
///
/// This builder provides a fluent API for configuring and building an A2A client
/// with customizable transport, timeouts, discovery paths and validation.
///
/// # Example
///
/// ```rust,no_run
/// use a2a_taskflow::prelude::*;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let url = "http://localhost:10001".parse().unwrap();
/// let mut client = A2AClientBuilder::new_http(url)
///     .with_timeout(Duration::from_secs(10))
///     .build()?;
///
/// let agent_card = client.discover().await?;
/// println!("Connected to: {}", agent_card.name);
/// # Ok(())
/// # }
/// ```
///
/// # Compiler Error
/// This will fail to compile if it is not clear to the compiler which type implementing
/// `Transport` is being used as underlying transport. This is expected behaviour.
///
/// ```compile_fail
/// let client = a2a_taskflow::client::A2AClientBuilder::new("http://localhost:10001".parse().unwrap()).build();
/// ```
pub struct A2AClientBuilder<T: Transport> {
    transport: Option<T>,
    codec: Option<Arc<dyn Codec>>,
    config: ClientConfig,
}

impl<T: Transport> A2AClientBuilder<T> {
    /// Create a builder for the agent at `agent_url` without a transport
    pub fn new(agent_url: Url) -> Self {
        Self {
            transport: None,
            codec: None,
            config: ClientConfig::new(agent_url.as_str()),
        }
    }

    /// Use a custom transport
    ///
    /// # Arguments
    ///
    /// * `transport` - The transport implementation to use
    pub fn with_transport(mut self, transport: T) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom codec
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Replace the whole configuration, keeping the agent URL
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        let agent_url = std::mem::take(&mut self.config.agent_url);
        self.config = ClientConfig {
            agent_url,
            ..config
        };
        self
    }

    /// Set the request timeout
    ///
    /// # Arguments
    ///
    /// * `timeout` - The timeout duration for requests
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// Set the well-known paths tried during discovery, in order
    pub fn with_discovery_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.config = self.config.with_discovery_paths(paths);
        self
    }

    /// Enable or disable request and response validation
    ///
    /// # Arguments
    ///
    /// * `enabled` - Whether to validate (default: true)
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.config = self.config.with_validation(enabled);
        self
    }

    /// Build the A2A client
    ///
    /// This assembles the Tower stack and returns a configured client.
    ///
    /// # Errors
    ///
    /// Returns an error if no transport has been configured
    pub fn build(self) -> Result<A2AClient, A2AError> {
        let transport = self.transport.ok_or_else(|| {
            A2AError::Protocol(
                "Transport not configured. Use new_http() or with_transport()".into(),
            )
        })?;

        let codec = self.codec.unwrap_or_else(|| Arc::new(JsonRpcCodec));
        let core = A2AProtocolService::new(transport, codec);

        let service = if self.config.validate_responses {
            BoxCloneService::new(
                ServiceBuilder::new()
                    .layer(A2AValidationLayer::new())
                    .service(core),
            )
        } else {
            BoxCloneService::new(core)
        };

        Ok(AgentClient::new(service, self.config))
    }
}

impl A2AClientBuilder<HttpTransport> {
    /// Create a new client builder with HTTP transport (JSON-RPC binding)
    ///
    /// # Arguments
    ///
    /// * `agent_url` - The base URL of the agent (e.g., "<http://localhost:10001>")
    pub fn new_http(agent_url: Url) -> Self {
        let transport = HttpTransport::new(agent_url.clone());
        Self::new(agent_url)
            .with_transport(transport)
            .with_codec(Arc::new(JsonRpcCodec))
    }
}

#[cfg(test)]
mod tests {
    use crate::transport::mock::MockTransport;

    use super::*;

    fn agent_url() -> Url {
        "http://localhost:10001".parse().unwrap()
    }

    #[test]
    fn test_builder_with_http() {
        let client = A2AClientBuilder::new_http(agent_url()).build();

        assert!(client.is_ok());
    }

    #[test]
    fn test_builder_without_transport() {
        let client = A2AClientBuilder::<MockTransport>::new(agent_url()).build();

        assert!(matches!(client, Err(A2AError::Protocol(_))));
    }

    #[test]
    fn test_builder_with_mock_transport() {
        let client = A2AClientBuilder::new(agent_url())
            .with_transport(MockTransport::ok())
            .with_codec(Arc::new(JsonRpcCodec))
            .with_validation(false)
            .build()
            .unwrap();

        assert!(!client.config().validate_responses);
    }

    #[test]
    fn test_builder_all_options() {
        let client = A2AClientBuilder::new_http(agent_url())
            .with_config(ClientConfig::default().with_polling(Duration::from_secs(1), 3))
            .with_timeout(Duration::from_secs(45))
            .with_discovery_paths(["/.well-known/agent.json"])
            .with_validation(true)
            .build()
            .unwrap();

        let config = client.config();
        assert_eq!(config.agent_url, "http://localhost:10001/");
        assert_eq!(config.timeout, Duration::from_secs(45));
        assert_eq!(config.max_poll_attempts, 3);
        assert_eq!(config.discovery_paths, vec!["/.well-known/agent.json"]);
    }

    #[tokio::test]
    async fn test_validation_rejects_bad_task_id_before_sending() {
        let mut client = A2AClientBuilder::new(agent_url())
            .with_transport(MockTransport::new(|_| panic!("request must not be sent")))
            .build()
            .unwrap();

        let result = client.get_task("not a valid id").await;
        assert!(matches!(result, Err(A2AError::Validation(_))));
    }
}
