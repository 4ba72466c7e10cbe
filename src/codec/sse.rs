//! Server-Sent Events (SSE) codec for streaming A2A responses
//!
//! Every SSE `data:` payload is a JSON-RPC 2.0 response whose result is one
//! stream frame.

use std::fmt::Display;

use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};

use crate::{
    codec::jsonrpc::JsonRpcResponse,
    protocol::{error::A2AError, event::StreamResponse},
};

/// SSE codec for parsing streaming responses
#[derive(Debug, Clone, Default)]
pub struct SseCodec;

impl SseCodec {
    /// Create a new SSE codec
    pub fn new() -> Self {
        Self
    }

    /// Decode one SSE data payload into a stream frame
    pub fn decode_frame(data: &str) -> Result<StreamResponse, A2AError> {
        let envelope: JsonRpcResponse = serde_json::from_str(data).map_err(|e| {
            A2AError::StreamProtocol(format!("Failed to parse SSE event data: {}", e))
        })?;

        let result = envelope.into_result()?;
        serde_json::from_value(result)
            .map_err(|e| A2AError::StreamProtocol(format!("Malformed stream frame: {}", e)))
    }

    /// Parse an SSE byte stream into a stream of frames
    ///
    /// Events without data (keep-alives) are skipped.
    pub fn parse_stream<S, B, E>(
        &self,
        byte_stream: S,
    ) -> impl Stream<Item = Result<StreamResponse, A2AError>> + Send + 'static
    where
        S: Stream<Item = Result<B, E>> + Send + 'static,
        B: AsRef<[u8]> + Send + 'static,
        E: Display + Send + 'static,
    {
        byte_stream.eventsource().filter_map(|result| async move {
            match result {
                Ok(event) if event.data.trim().is_empty() => None,
                Ok(event) => Some(Self::decode_frame(&event.data)),
                Err(e) => Some(Err(A2AError::Transport(format!("SSE stream error: {}", e)))),
            }
        })
    }
}
