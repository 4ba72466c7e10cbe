//! HTTP transport implementation for A2A protocol

use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

use crate::{codec::jsonrpc, protocol::error::A2AError};

use super::{ByteStream, Transport, TransportRequest, TransportResponse};

/// HTTP transport implementation using reqwest
///
/// Implements the JSON-RPC over HTTP binding. Streaming responses are
/// returned as raw bytes and parsed as SSE by the service layer.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a new HTTP transport
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the agent (e.g., "<http://localhost:10001>")
    pub fn new(base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn build(&self, request: TransportRequest) -> Result<reqwest::RequestBuilder, A2AError> {
        let url = self.url_for(&request.endpoint);

        let mut req_builder = match request.method.as_str() {
            "POST" => self.client.post(&url),
            "GET" => self.client.get(&url),
            _ => {
                return Err(A2AError::Transport(format!(
                    "Unsupported HTTP method: {}",
                    request.method
                )))
            }
        };

        for (key, value) in request.headers {
            req_builder = req_builder.header(key, value);
        }

        if !request.body.is_empty() {
            req_builder = req_builder.body(request.body);
        }

        Ok(req_builder)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), A2AError>> {
        // HTTP client is always ready
        Poll::Ready(Ok(()))
    }

    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, A2AError> {
        debug!(method = %request.method, endpoint = %request.endpoint, "HTTP request");
        let response = self.build(request)?.send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let body = response.bytes().await?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }

    async fn execute_streaming(&self, request: TransportRequest) -> Result<ByteStream, A2AError> {
        debug!(method = %request.method, endpoint = %request.endpoint, "HTTP streaming request");
        let response = self
            .build(request)?
            .header("Accept", "text/event-stream")
            .send()
            .await?;

        let status = response.status();
        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/event-stream"));

        // Errors raised before the stream starts arrive as a plain JSON-RPC document
        if !status.is_success() || !is_event_stream {
            let body = response.bytes().await?;
            return Err(jsonrpc::error_from_body(&body).unwrap_or_else(|| {
                A2AError::Transport(format!(
                    "HTTP streaming request failed with status {}",
                    status
                ))
            }));
        }

        Ok(Box::pin(response.bytes_stream().map_err(A2AError::from)))
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn supports_streaming(&self) -> bool {
        true
    }
}
