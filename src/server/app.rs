//! HTTP surface of an agent: discovery, health and the JSON-RPC endpoint

use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::{
    codec::jsonrpc::{
        JsonRpcError, JsonRpcRequest, JsonRpcResponse, INTERNAL_ERROR, INVALID_PARAMS,
        INVALID_REQUEST, JSONRPC_VERSION, METHOD_MESSAGE_SEND, METHOD_MESSAGE_STREAM,
        METHOD_NOT_FOUND, METHOD_TASKS_CANCEL, METHOD_TASKS_GET, PARSE_ERROR,
        UNSUPPORTED_OPERATION,
    },
    protocol::{
        agent::{AGENT_CARD_PATH, LEGACY_AGENT_CARD_PATH},
        task::{MessageSendParams, TaskIdParams},
        A2AError, A2AResult, AgentCard, StreamResponse,
    },
    server::{
        config::ServerConfig,
        executor::{Skill, TaskExecutor},
        handler::{EventStream, RequestHandler},
        store::TaskStore,
    },
};

/// Shared state of the router
#[derive(Clone)]
pub struct AppState {
    handler: RequestHandler,
    card: Arc<AgentCard>,
    keep_alive: Duration,
}

impl AppState {
    pub fn new(handler: RequestHandler, card: AgentCard, keep_alive: Duration) -> Self {
        Self {
            handler,
            card: Arc::new(card),
            keep_alive,
        }
    }
}

/// Create the agent router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(AGENT_CARD_PATH, get(get_agent_card))
        .route(LEGACY_AGENT_CARD_PATH, get(get_agent_card))
        .route("/health", get(health))
        .route("/", post(handle_rpc))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

async fn get_agent_card(State(state): State<AppState>) -> Json<AgentCard> {
    Json(state.card.as_ref().clone())
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "agent": state.card.name,
        "version": state.card.version,
    }))
}

/// Dispatch one JSON-RPC request
///
/// The body is taken raw so that malformed JSON is answered with a JSON-RPC
/// parse error instead of an HTTP rejection.
async fn handle_rpc(State(state): State<AppState>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            return rpc_error(
                Value::Null,
                JsonRpcError::new(PARSE_ERROR, format!("Parse error: {}", e)),
            )
        }
    };
    let id = value.get("id").cloned().unwrap_or(Value::Null);

    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            return rpc_error(
                id,
                JsonRpcError::new(INVALID_REQUEST, format!("Invalid request: {}", e)),
            )
        }
    };
    if request.jsonrpc != JSONRPC_VERSION {
        return rpc_error(
            id,
            JsonRpcError::new(INVALID_REQUEST, "Invalid JSON-RPC version"),
        );
    }

    debug!(method = %request.method, "rpc request");
    match request.method.as_str() {
        METHOD_MESSAGE_SEND => match params::<MessageSendParams>(request.params) {
            Ok(params) => respond(
                id,
                state
                    .handler
                    .send(params.message)
                    .await
                    .map(StreamResponse::Task),
            ),
            Err(error) => rpc_error(id, error),
        },
        METHOD_MESSAGE_STREAM => handle_stream(&state, id, request.params),
        METHOD_TASKS_GET => match params::<TaskIdParams>(request.params) {
            Ok(params) => respond(id, state.handler.get(&params.id).map(StreamResponse::Task)),
            Err(error) => rpc_error(id, error),
        },
        METHOD_TASKS_CANCEL => match params::<TaskIdParams>(request.params) {
            Ok(params) => respond(
                id,
                state
                    .handler
                    .cancel(&params.id)
                    .await
                    .map(StreamResponse::Task),
            ),
            Err(error) => rpc_error(id, error),
        },
        other => rpc_error(
            id,
            JsonRpcError::new(METHOD_NOT_FOUND, format!("Method not found: {}", other)),
        ),
    }
}

/// Start a run and answer with its updates as Server-Sent Events
///
/// Failures before the run starts are answered as a plain JSON-RPC error.
fn handle_stream(state: &AppState, id: Value, raw_params: Value) -> Response {
    if !state.card.capabilities.streaming {
        return rpc_error(
            id,
            JsonRpcError::new(UNSUPPORTED_OPERATION, "Streaming is not supported by this agent"),
        );
    }

    let params = match params::<MessageSendParams>(raw_params) {
        Ok(params) => params,
        Err(error) => return rpc_error(id, error),
    };

    match state.handler.submit_message(params.message) {
        Ok((task_id, events)) => {
            info!(task_id = %task_id, "streaming task updates");
            stream_updates(id, events, state.keep_alive).into_response()
        }
        Err(e) => rpc_error(id, JsonRpcError::from(&e)),
    }
}

fn stream_updates(
    id: Value,
    events: EventStream,
    keep_alive: Duration,
) -> Sse<impl futures::Stream<Item = Result<Event, axum::Error>>> {
    let frames = events.map(move |event| {
        let frame = serde_json::to_value(StreamResponse::from(event)).map_err(axum::Error::new)?;
        Event::default().json_data(JsonRpcResponse::success(id.clone(), frame))
    });

    Sse::new(frames).keep_alive(KeepAlive::new().interval(keep_alive).text("keep-alive"))
}

fn params<T: DeserializeOwned>(raw: Value) -> Result<T, JsonRpcError> {
    serde_json::from_value(raw)
        .map_err(|e| JsonRpcError::new(INVALID_PARAMS, format!("Invalid params: {}", e)))
}

fn respond<T: Serialize>(id: Value, result: A2AResult<T>) -> Response {
    let value = result.and_then(|value| serde_json::to_value(value).map_err(A2AError::from));
    match value {
        Ok(value) => Json(JsonRpcResponse::success(id, value)).into_response(),
        Err(A2AError::Serialization(e)) => rpc_error(
            id,
            JsonRpcError::new(INTERNAL_ERROR, format!("Failed to encode result: {}", e)),
        ),
        Err(e) => rpc_error(id, JsonRpcError::from(&e)),
    }
}

fn rpc_error(id: Value, error: JsonRpcError) -> Response {
    debug!(code = error.code, message = %error.message, "rpc error");
    Json(JsonRpcResponse::failure(id, error)).into_response()
}

/// An agent server: one card, one skill
pub struct A2AServer {
    config: ServerConfig,
    card: AgentCard,
    handler: RequestHandler,
}

impl A2AServer {
    pub fn new(config: ServerConfig, card: AgentCard, skill: Arc<dyn Skill>) -> Self {
        let handler = RequestHandler::new(
            TaskStore::new(),
            TaskExecutor::new(skill),
            config.channel_capacity,
        );
        Self {
            config,
            card,
            handler,
        }
    }

    pub fn handler(&self) -> &RequestHandler {
        &self.handler
    }

    /// Router serving the card as configured, without binding
    pub fn router(&self) -> Router {
        create_router(AppState::new(
            self.handler.clone(),
            self.card.clone(),
            self.config.keep_alive,
        ))
    }

    /// Bind the listener and fix the URL advertised in the card
    ///
    /// Without a configured public URL the card points at the bound address.
    pub async fn bind(self) -> A2AResult<BoundServer> {
        let address = self.config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| A2AError::Transport(format!("Failed to bind {}: {}", address, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| A2AError::Transport(format!("Failed to read bound address: {}", e)))?;

        let url = self
            .config
            .public_url
            .clone()
            .unwrap_or_else(|| advertised_url(local_addr));
        let card = self.card.with_url(url.clone());
        info!(agent = %card.name, %local_addr, %url, "agent bound");

        let router = create_router(AppState::new(self.handler, card, self.config.keep_alive));
        Ok(BoundServer {
            listener,
            router,
            local_addr,
            url,
        })
    }
}

fn advertised_url(addr: SocketAddr) -> String {
    if addr.ip().is_unspecified() {
        format!("http://localhost:{}/", addr.port())
    } else {
        format!("http://{}/", addr)
    }
}

/// A server with its listener bound, ready to run
pub struct BoundServer {
    listener: TcpListener,
    router: Router,
    local_addr: SocketAddr,
    url: String,
}

impl BoundServer {
    /// URL advertised in the agent card
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until the process ends
    pub async fn run(self) -> A2AResult<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves, then drain open connections
    pub async fn run_until<F>(self, shutdown: F) -> A2AResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(addr = %self.local_addr, "agent listening");
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| A2AError::Transport(format!("Server error: {}", e)))
    }
}
