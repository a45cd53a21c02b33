//! MCP serving loop: method routing, per-request cancellation, framing.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use toolgate_kernel::DispatchScheduler;
use toolgate_primitives::CallContext;
use tracing::{debug, info, warn};

use crate::adapter::McpAdapter;
use crate::protocol::{
    CallToolParams, CancelledParams, Implementation, InitializeParams, InitializeResult,
    JSONRPC_VERSION, JsonRpcError, JsonRpcRequest, JsonRpcResponse, LATEST_PROTOCOL_VERSION,
    ListToolsResult, RequestId, SUPPORTED_PROTOCOL_VERSIONS, ServerCapabilities, ToolsCapability,
};
use crate::transport::{FrameReader, FrameWriter, TransportError};

/// Failures that end the serving loop.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The underlying stream failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response writer task panicked or was aborted.
    #[error("response writer task failed: {0}")]
    Writer(#[from] tokio::task::JoinError),
}

type Outbox = mpsc::UnboundedSender<JsonRpcResponse>;

enum LoopExit {
    Reader(Result<(), TransportError>),
    Writer(Result<Result<(), TransportError>, tokio::task::JoinError>),
}

/// Serves the tools published by an [`McpAdapter`] to one MCP client.
#[derive(Debug)]
pub struct McpServer {
    adapter: Arc<McpAdapter>,
    info: Implementation,
    instructions: Option<String>,
    scheduler: DispatchScheduler,
    in_flight: Mutex<HashMap<RequestId, CancellationToken>>,
    initialized: AtomicBool,
}

impl McpServer {
    /// Creates a server identifying itself as `info`.
    #[must_use]
    pub fn new(adapter: Arc<McpAdapter>, info: Implementation) -> Self {
        Self {
            adapter,
            info,
            instructions: None,
            scheduler: DispatchScheduler::default(),
            in_flight: Mutex::new(HashMap::new()),
            initialized: AtomicBool::new(false),
        }
    }

    /// Uses `scheduler` to run `tools/call` requests.
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: DispatchScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Sets the instructions returned from `initialize`.
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Returns `true` once the client sent `notifications/initialized`.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Handles one frame inline and returns the response, if one is due.
    ///
    /// `tools/call` runs on the current task here; [`McpServer::serve`] uses
    /// the scheduler instead so calls overlap.
    pub async fn handle(
        &self,
        ctx: &CallContext,
        request: JsonRpcRequest,
    ) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            self.handle_notification(&request);
            return None;
        };
        if request.jsonrpc != JSONRPC_VERSION {
            let reason = format!("unsupported jsonrpc version `{}`", request.jsonrpc);
            return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request(reason)));
        }
        if request.method == "tools/call" {
            return Some(self.handle_call(ctx, id, request.params).await);
        }
        Some(self.handle_request(id, &request))
    }

    /// Serves requests read from `reader` until EOF or `shutdown`, writing
    /// responses to `writer`. In-flight calls are drained before returning.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when reading or writing the stream fails.
    /// Malformed frames and failed tool calls are answered and do not end the
    /// loop. A write failure stops reading at once and cancels in-flight calls.
    pub async fn serve<R, W>(
        self: Arc<Self>,
        reader: R,
        writer: W,
        shutdown: CancellationToken,
    ) -> Result<(), ServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (outbox, mut pending) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let mut writer_task = tokio::spawn(async move {
            let mut writer = FrameWriter::new(writer);
            while let Some(response) = pending.recv().await {
                writer.send(&response).await?;
            }
            Ok::<(), TransportError>(())
        });

        let root = CallContext::new().with_cancellation(shutdown.child_token());
        let mut reader = FrameReader::new(reader);
        info!(server = %self.info.name, version = %self.info.version, "mcp server started");

        let exit = loop {
            let frame = tokio::select! {
                () = shutdown.cancelled() => break LoopExit::Reader(Ok(())),
                written = &mut writer_task => break LoopExit::Writer(written),
                frame = reader.next_frame() => frame,
            };
            match frame {
                Ok(Some(request)) => self.dispatch(&root, request, &outbox).await,
                Ok(None) => break LoopExit::Reader(Ok(())),
                Err(err) if err.is_recoverable() => {
                    warn!(error = %err, "rejecting malformed frame");
                    let _ = outbox.send(reject_frame(err));
                }
                Err(err) => break LoopExit::Reader(Err(err)),
            }
        };

        let result = match exit {
            LoopExit::Writer(written) => {
                // Nothing can be delivered any more.
                root.cancellation().cancel();
                warn!("response writer stopped; abandoning in-flight calls");
                match written {
                    Ok(write_result) => write_result.map_err(ServerError::from),
                    Err(err) => Err(ServerError::from(err)),
                }
            }
            LoopExit::Reader(read_result) => {
                if read_result.is_err() {
                    root.cancellation().cancel();
                }
                drop(outbox);
                // Spawned calls hold outbox clones; the writer ends once all are done.
                let write_result = writer_task.await?;
                read_result.and(write_result).map_err(ServerError::from)
            }
        };
        info!(ok = result.is_ok(), "mcp server stopped");
        result
    }

    /// Serves over the process's stdin/stdout.
    ///
    /// # Errors
    ///
    /// See [`McpServer::serve`].
    pub async fn serve_stdio(
        self: Arc<Self>,
        shutdown: CancellationToken,
    ) -> Result<(), ServerError> {
        let stdin = BufReader::new(tokio::io::stdin());
        self.serve(stdin, tokio::io::stdout(), shutdown).await
    }

    async fn dispatch(
        self: &Arc<Self>,
        root: &CallContext,
        request: JsonRpcRequest,
        outbox: &Outbox,
    ) {
        let spawn_call = request.method == "tools/call" && request.jsonrpc == JSONRPC_VERSION;
        let Some(id) = request.id.clone().filter(|_| spawn_call) else {
            if let Some(response) = self.handle(root, request).await {
                let _ = outbox.send(response);
            }
            return;
        };

        let ctx = root.child();
        if !self.track(&id, ctx.cancellation().clone()) {
            warn!(request_id = %id, "rejecting call with an id already in flight");
            let _ = outbox.send(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("duplicate request id"),
            ));
            return;
        }

        let server = Arc::clone(self);
        let task_outbox = outbox.clone();
        let task_id = id.clone();
        let spawned = self.scheduler.spawn(async move {
            let response = server.handle_call(&ctx, task_id.clone(), request.params).await;
            if server.untrack(&task_id) {
                let _ = task_outbox.send(response);
            } else {
                debug!(request_id = %task_id, "dropping response for cancelled request");
            }
        });
        if let Err(err) = spawned {
            self.untrack(&id);
            let _ = outbox.send(JsonRpcResponse::error(
                id,
                JsonRpcError::internal_error(err.to_string()),
            ));
        }
    }

    fn handle_request(&self, id: RequestId, request: &JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(id, request.params.clone()),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => {
                let result = ListToolsResult {
                    tools: self.adapter.list_tools(),
                };
                to_response(id, &result)
            }
            method => {
                debug!(%method, "unknown method");
                JsonRpcResponse::error(id, JsonRpcError::method_not_found(method))
            }
        }
    }

    fn handle_initialize(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: InitializeParams = match decode_params(params) {
            Ok(params) => params,
            Err(err) => return JsonRpcResponse::error(id, err),
        };

        let requested = params.protocol_version.as_str();
        let protocol_version = if SUPPORTED_PROTOCOL_VERSIONS.contains(&requested) {
            params.protocol_version.clone()
        } else {
            LATEST_PROTOCOL_VERSION.to_owned()
        };
        if let Some(client) = &params.client_info {
            info!(
                client = %client.name,
                client_version = %client.version,
                %protocol_version,
                "client initializing"
            );
        }

        let result = InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: self.info.clone(),
            instructions: self.instructions.clone(),
        };
        to_response(id, &result)
    }

    async fn handle_call(
        &self,
        ctx: &CallContext,
        id: RequestId,
        params: Option<Value>,
    ) -> JsonRpcResponse {
        let params: CallToolParams = match decode_params(params) {
            Ok(params) => params,
            Err(err) => return JsonRpcResponse::error(id, err),
        };
        debug!(request_id = %id, tool = %params.name, "tools/call");
        let result = self.adapter.call_tool(ctx, params).await;
        to_response(id, &result)
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => {
                self.initialized.store(true, Ordering::Release);
                debug!("client initialized");
            }
            "notifications/cancelled" => {
                match decode_params::<CancelledParams>(request.params.clone()) {
                    Ok(params) => self.cancel(&params.request_id, params.reason.as_deref()),
                    Err(err) => warn!(error = %err.message, "ignoring malformed cancellation"),
                }
            }
            method => debug!(%method, "ignoring notification"),
        }
    }

    /// Returns `false`, leaving the running call untouched, if `id` is
    /// already in flight.
    fn track(&self, id: &RequestId, token: CancellationToken) -> bool {
        match self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id.clone())
        {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(token);
                true
            }
        }
    }

    /// Returns `false` if the request was cancelled while running.
    fn untrack(&self, id: &RequestId) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    fn cancel(&self, id: &RequestId, reason: Option<&str>) {
        let token = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        match token {
            Some(token) => {
                info!(request_id = %id, reason, "cancelling request");
                token.cancel();
            }
            None => debug!(request_id = %id, "cancellation for unknown or finished request"),
        }
    }
}

fn decode_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("missing params"))?;
    serde_json::from_value(params).map_err(|err| JsonRpcError::invalid_params(err.to_string()))
}

fn to_response<T: Serialize>(id: RequestId, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(err) => JsonRpcResponse::error(id, JsonRpcError::internal_error(err.to_string())),
    }
}

fn reject_frame(err: TransportError) -> JsonRpcResponse {
    match err {
        TransportError::InvalidRequest { id, reason } => JsonRpcResponse::error(
            id.unwrap_or(RequestId::Null),
            JsonRpcError::invalid_request(reason),
        ),
        other => {
            JsonRpcResponse::error(RequestId::Null, JsonRpcError::parse_error(other.to_string()))
        }
    }
}
