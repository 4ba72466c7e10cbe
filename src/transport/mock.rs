use std::{
    fmt,
    sync::Arc,
    task::{Context, Poll},
};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::{
    protocol::error::A2AError,
    transport::{ByteStream, Transport, TransportRequest, TransportResponse},
};

type Handler = dyn Fn(TransportRequest) -> TransportResponse + Send + Sync;

/// Mock transport for internal testing
///
/// Answers every request with the handler's response. Streaming requests
/// receive the handler's body as a single chunk.
#[derive(Clone)]
pub(crate) struct MockTransport {
    handler: Arc<Handler>,
    base_url: Url,
}

impl MockTransport {
    /// Create a new mock transport with a custom request handler
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(TransportRequest) -> TransportResponse + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            base_url: Url::parse("http://mock.agent").unwrap(),
        }
    }

    /// Create a mock transport that always returns 200 OK
    pub fn ok() -> Self {
        Self::new(|_| TransportResponse::new(200))
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), A2AError>> {
        Poll::Ready(Ok(()))
    }

    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, A2AError> {
        Ok((self.handler)(request))
    }

    async fn execute_streaming(&self, request: TransportRequest) -> Result<ByteStream, A2AError> {
        let response = (self.handler)(request);
        if !response.is_success() {
            return Err(A2AError::Transport(format!(
                "HTTP error: {}",
                response.status
            )));
        }

        let body: Bytes = response.body;
        Ok(Box::pin(futures::stream::once(async move {
            Ok::<_, A2AError>(body)
        })))
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn supports_streaming(&self) -> bool {
        true
    }
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}
