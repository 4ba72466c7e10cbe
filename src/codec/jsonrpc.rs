//! JSON-RPC 2.0 codec for A2A protocol
//!
//! This codec wraps A2A operations in JSON-RPC 2.0 envelopes. The envelope
//! types are public because the server side of the crate speaks the same
//! binding.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    codec::Codec,
    protocol::{
        agent::AgentCard,
        error::A2AError,
        event::StreamResponse,
        operation::A2AOperation,
        task::{MessageSendParams, Task, TaskIdParams},
    },
    service::response::A2AResponse,
};

pub const JSONRPC_VERSION: &str = "2.0";

pub const METHOD_MESSAGE_SEND: &str = "message/send";
pub const METHOD_MESSAGE_STREAM: &str = "message/stream";
pub const METHOD_TASKS_GET: &str = "tasks/get";
pub const METHOD_TASKS_CANCEL: &str = "tasks/cancel";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
pub const TASK_NOT_FOUND: i64 = -32001;
pub const TASK_NOT_CANCELABLE: i64 = -32002;
pub const UNSUPPORTED_OPERATION: i64 = -32004;
pub const DUPLICATE_TASK: i64 = -32010;

/// JSON-RPC 2.0 request envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    /// Absent for notifications
    #[serde(default)]
    pub id: Value,
}

impl JsonRpcRequest {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: Value::String(Uuid::now_v7().to_string()),
        }
    }
}

/// JSON-RPC 2.0 response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    #[serde(default)]
    pub id: Value,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    /// Unwrap the result, turning an error object into an `A2AError`
    pub fn into_result(self) -> Result<Value, A2AError> {
        if let Some(error) = self.error {
            return Err(error.into_a2a());
        }

        self.result.ok_or_else(|| {
            A2AError::Protocol("JSON-RPC response missing 'result' field".to_string())
        })
    }
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    fn data_task_id(&self) -> Option<String> {
        self.data
            .as_ref()
            .and_then(|data| data.get("taskId"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Map a received error object back onto the crate taxonomy
    pub fn into_a2a(self) -> A2AError {
        match (self.code, self.data_task_id()) {
            (TASK_NOT_FOUND, Some(task_id)) => A2AError::UnknownTask { task_id },
            (TASK_NOT_CANCELABLE, Some(task_id)) => A2AError::TerminalTask { task_id },
            (INVALID_PARAMS, _) => A2AError::Validation(self.message),
            (code, _) => A2AError::Protocol(format!("JSON-RPC error {}: {}", code, self.message)),
        }
    }
}

impl From<&A2AError> for JsonRpcError {
    fn from(err: &A2AError) -> Self {
        let message = err.to_string();
        match err {
            A2AError::UnknownTask { task_id } => {
                JsonRpcError::new(TASK_NOT_FOUND, message).with_data(json!({ "taskId": task_id }))
            }
            A2AError::TerminalTask { task_id } | A2AError::TaskBusy { task_id } => {
                JsonRpcError::new(TASK_NOT_CANCELABLE, message)
                    .with_data(json!({ "taskId": task_id }))
            }
            A2AError::InvalidTransition { task_id, .. } => {
                JsonRpcError::new(TASK_NOT_CANCELABLE, message)
                    .with_data(json!({ "taskId": task_id }))
            }
            A2AError::DuplicateTask { task_id, .. } => {
                JsonRpcError::new(DUPLICATE_TASK, message).with_data(json!({ "taskId": task_id }))
            }
            A2AError::Validation(_) => JsonRpcError::new(INVALID_PARAMS, message),
            A2AError::Serialization(_) => JsonRpcError::new(PARSE_ERROR, message),
            _ => JsonRpcError::new(INTERNAL_ERROR, message),
        }
    }
}

/// Decode a non-streaming body that should carry a JSON-RPC error
///
/// Used when a streaming request is answered with a plain JSON document.
pub fn error_from_body(body: &[u8]) -> Option<A2AError> {
    let response: JsonRpcResponse = serde_json::from_slice(body).ok()?;
    response.error.map(JsonRpcError::into_a2a)
}

/// JSON-RPC 2.0 codec that wraps A2A operations
///
/// Agent discovery is not an RPC method: the card is fetched and decoded as a
/// plain JSON document.
#[derive(Debug, Clone, Default)]
pub struct JsonRpcCodec;

impl JsonRpcCodec {
    /// Create a new JSON-RPC codec
    pub fn new() -> Self {
        Self
    }

    /// Map an A2A operation to a JSON-RPC method name
    fn operation_to_method(operation: &A2AOperation) -> Option<&'static str> {
        match operation {
            A2AOperation::SendMessage { stream: false, .. } => Some(METHOD_MESSAGE_SEND),
            A2AOperation::SendMessage { stream: true, .. } => Some(METHOD_MESSAGE_STREAM),
            A2AOperation::GetTask { .. } => Some(METHOD_TASKS_GET),
            A2AOperation::CancelTask { .. } => Some(METHOD_TASKS_CANCEL),
            A2AOperation::DiscoverAgent { .. } => None,
        }
    }

    fn params(operation: &A2AOperation) -> Result<Value, A2AError> {
        let params = match operation {
            A2AOperation::SendMessage { message, .. } => {
                serde_json::to_value(MessageSendParams {
                    message: message.clone(),
                    metadata: None,
                })?
            }
            A2AOperation::GetTask { task_id } | A2AOperation::CancelTask { task_id } => {
                serde_json::to_value(TaskIdParams {
                    id: task_id.clone(),
                })?
            }
            A2AOperation::DiscoverAgent { .. } => Value::Null,
        };
        Ok(params)
    }
}

impl Codec for JsonRpcCodec {
    fn encode_request(&self, operation: &A2AOperation) -> Result<Bytes, A2AError> {
        let Some(method) = Self::operation_to_method(operation) else {
            return Ok(Bytes::new());
        };

        let request = JsonRpcRequest::new(method, Self::params(operation)?);
        let bytes = serde_json::to_vec(&request)?;
        Ok(Bytes::from(bytes))
    }

    fn decode_response(
        &self,
        body: &[u8],
        operation: &A2AOperation,
    ) -> Result<A2AResponse, A2AError> {
        if let A2AOperation::DiscoverAgent { .. } = operation {
            let card: AgentCard = serde_json::from_slice(body)?;
            return Ok(A2AResponse::AgentCard(Box::new(card)));
        }

        let envelope: JsonRpcResponse = serde_json::from_slice(body)
            .map_err(|e| A2AError::Protocol(format!("Failed to parse JSON-RPC response: {}", e)))?;
        let result = envelope.into_result()?;

        match operation {
            A2AOperation::SendMessage { .. } => match serde_json::from_value::<StreamResponse>(result)? {
                StreamResponse::Task(task) => Ok(A2AResponse::Task(Box::new(task))),
                StreamResponse::Message(message) => Ok(A2AResponse::Message(Box::new(message))),
                other => Err(A2AError::Protocol(format!(
                    "Unexpected message/send result: {:?}",
                    other
                ))),
            },
            _ => {
                let task: Task = serde_json::from_value(result)?;
                Ok(A2AResponse::Task(Box::new(task)))
            }
        }
    }

    fn content_type(&self) -> &str {
        "application/json"
    }
}
