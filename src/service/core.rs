//! Core A2A protocol service implementation

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};

use tower_service::Service;
use tracing::debug;

use crate::{
    codec::{jsonrpc, Codec, SseCodec},
    protocol::{error::A2AError, operation::A2AOperation},
    service::{A2ARequest, A2AResponse},
    transport::{Transport, TransportRequest, TransportResponse},
};

/// Core A2A protocol service that wraps a transport
///
/// This service implements the Tower `Service` trait and maps A2A operations
/// onto transport requests. Every network wait is bounded by the request
/// context timeout.
pub struct A2AProtocolService<T> {
    transport: T,
    codec: Arc<dyn Codec>,
}

impl<T> A2AProtocolService<T>
where
    T: Transport,
{
    /// Create a new A2A protocol service
    ///
    /// # Arguments
    ///
    /// * `transport` - The underlying transport implementation
    /// * `codec` - The codec for serialization/deserialization
    pub fn new(transport: T, codec: Arc<dyn Codec>) -> Self {
        Self { transport, codec }
    }

    /// Build a transport request from an A2A operation
    fn build_transport_request(
        req: &A2ARequest,
        codec: &dyn Codec,
    ) -> Result<TransportRequest, A2AError> {
        let endpoint = req.operation.endpoint();
        let method = req.operation.method();

        let mut transport_req = TransportRequest::new(endpoint, method)
            .header("Accept", codec.content_type());

        for (name, value) in &req.context.headers {
            transport_req = transport_req.header(name.clone(), value.clone());
        }

        let body = codec.encode_request(&req.operation)?;
        if !body.is_empty() && method != "GET" {
            transport_req = transport_req
                .header("Content-Type", codec.content_type())
                .body(body);
        }

        Ok(transport_req)
    }

    /// Parse a transport response into an A2A response
    fn parse_transport_response(
        transport_resp: TransportResponse,
        codec: &dyn Codec,
        operation: &A2AOperation,
    ) -> Result<A2AResponse, A2AError> {
        if !transport_resp.is_success() {
            return Err(Self::handle_error_response(&transport_resp));
        }

        // A card only counts when served with 200 itself
        if matches!(operation, A2AOperation::DiscoverAgent { .. }) && transport_resp.status != 200 {
            return Err(A2AError::Transport(format!(
                "HTTP error: {}",
                transport_resp.status
            )));
        }

        codec.decode_response(&transport_resp.body, operation)
    }

    /// Handle error responses from the transport
    fn handle_error_response(transport_resp: &TransportResponse) -> A2AError {
        if let Some(err) = jsonrpc::error_from_body(&transport_resp.body) {
            return err;
        }

        match transport_resp.status {
            408 | 504 => A2AError::Timeout,
            status => A2AError::Transport(format!("HTTP error: {}", status)),
        }
    }
}

/// Await `fut`, failing with `A2AError::Timeout` once `timeout` elapses
async fn bounded<F, R>(timeout: Option<Duration>, fut: F) -> Result<R, A2AError>
where
    F: Future<Output = Result<R, A2AError>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut).await?,
        None => fut.await,
    }
}

impl<T> Service<A2ARequest> for A2AProtocolService<T>
where
    T: Transport + Clone,
{
    type Response = A2AResponse;
    type Error = A2AError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.transport.poll_ready(cx)
    }

    fn call(&mut self, req: A2ARequest) -> Self::Future {
        let transport = self.transport.clone();
        let codec = self.codec.clone();

        Box::pin(async move {
            debug!(operation = req.operation.name(), agent = %req.context.agent_url, "calling agent");
            let transport_req = Self::build_transport_request(&req, codec.as_ref())?;
            let timeout = req.context.timeout;

            if req.operation.is_streaming() {
                let bytes = bounded(timeout, transport.execute_streaming(transport_req)).await?;
                let frames = SseCodec::new().parse_stream(bytes);
                return Ok(A2AResponse::Stream(Box::pin(frames)));
            }

            let transport_resp = bounded(timeout, transport.execute(transport_req)).await?;
            Self::parse_transport_response(transport_resp, codec.as_ref(), &req.operation)
        })
    }
}

impl<T> Clone for A2AProtocolService<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            codec: self.codec.clone(),
        }
    }
}
