/// MCP server implementation that handles JSON-RPC communication
///
/// This module implements the actual MCP server that:
/// 1. Reads JSON-RPC requests from stdin
/// 2. Processes tool calls using the recovery tracker
/// 3. Sends JSON-RPC responses to stdout

use std::time::Instant;

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::flows::FlowReply;
use crate::mcp::protocol::*;
use crate::mcp::ServerStats;
use crate::services::TrackerError;
use crate::tools::{self, ToolResponse};
use crate::{RecoveryTrackerServer, ServerError};

/// Why a tool call did not produce a normal result
enum CallError {
    Params(serde_json::Error),
    UnknownTool(String),
    Tracker(TrackerError),
    Json(serde_json::Error),
}

/// MCP server that handles communication with the client
pub struct McpServer {
    tracker: RecoveryTrackerServer,
    stats: ServerStats,
    /// Whether the client has confirmed initialization
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(tracker: RecoveryTrackerServer) -> Self {
        let stats = ServerStats::new(tracker.now());
        Self {
            tracker,
            stats,
            initialized: false,
        }
    }

    pub fn tracker(&self) -> &RecoveryTrackerServer {
        &self.tracker
    }

    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run the MCP server, handling JSON-RPC over stdin/stdout
    pub async fn run(&mut self) -> Result<(), ServerError> {
        info!("Starting MCP server, waiting for JSON-RPC requests...");

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut stdout = tokio::io::stdout();

        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("MCP server shutting down (stdin closed)");
                    break;
                }
                Ok(_) => {
                    if let Some(response) = self.process_line(&line).await {
                        let response_str = serde_json::to_string(&response)?;

                        stdout.write_all(response_str.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                        stdout.flush().await?;

                        debug!("Sent response: {}", response_str);
                    }
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Process a single line of JSON-RPC input
    ///
    /// Returns `None` for blank lines and notifications.
    pub async fn process_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Processing request: {}", line);
        let started = Instant::now();

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    json!(null),
                    error_codes::PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                    None,
                ));
            }
        };

        let response = self.handle_request(request).await;
        self.stats.record(started.elapsed());
        response
    }

    /// Handle a JSON-RPC request
    async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            self.handle_notification(&request.method);
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id, request.params),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, request.params),
            _ => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{}' not found", request.method),
                None,
            ),
        };

        Some(response)
    }

    fn handle_notification(&mut self, method: &str) {
        match method {
            "notifications/initialized" | "initialized" => {
                self.initialized = true;
                info!("MCP client finished initialization");
            }
            other => debug!("Ignoring notification '{}'", other),
        }
    }

    /// Handle MCP initialization request
    fn handle_initialize(&mut self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let client = params
            .and_then(|p| serde_json::from_value::<InitializeParams>(p).ok())
            .and_then(|p| p.client_info)
            .map(|c| c.name)
            .unwrap_or_else(|| "unknown".to_string());
        info!("MCP client connected: {}", client);

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: "Recovery Tracker MCP".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, e.to_string(), None),
        }
    }

    /// Handle tools/list request
    fn handle_tools_list(&self, id: Value) -> JsonRpcResponse {
        JsonRpcResponse::success(id, json!({ "tools": tool_definitions() }))
    }

    /// Handle tools/call request
    fn handle_tools_call(&mut self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let tool_params: ToolCallParams = match params {
            Some(params) => match serde_json::from_value(params) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        error_codes::INVALID_PARAMS,
                        format!("Invalid parameters: {}", e),
                        None,
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    "Missing parameters".to_string(),
                    None,
                );
            }
        };

        let name = tool_params.name;
        let outcome = self.call_tool(&name, tool_params.arguments);

        // After the call, so a late answer from the caller still reports the timeout
        let expired = self.tracker.sweep_expired();
        if !expired.is_empty() {
            debug!("Swept {} expired conversation(s)", expired.len());
        }

        match outcome {
            Ok(result) => match serde_json::to_value(result) {
                Ok(value) => JsonRpcResponse::success(id, value),
                Err(e) => JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, e.to_string(), None),
            },
            Err(CallError::Params(e)) => JsonRpcResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                format!("Invalid arguments for {}: {}", name, e),
                None,
            ),
            Err(CallError::UnknownTool(name)) => {
                tool_error_response(id, ToolCallResult::error(format!("Unknown tool: {}", name)))
            }
            Err(CallError::Tracker(e)) if e.is_user_facing() => {
                debug!("Tool {} refused (code {}): {}", name, tracker_error_to_json_rpc_code(&e), e);
                tool_error_response(id, ToolCallResult::error(e.to_string()))
            }
            Err(CallError::Tracker(e)) => {
                warn!("Tool {} failed: {}", name, e);
                JsonRpcResponse::error(id, tracker_error_to_json_rpc_code(&e), e.to_string(), None)
            }
            Err(CallError::Json(e)) => JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, e.to_string(), None),
        }
    }

    fn call_tool(&mut self, name: &str, args: Map<String, Value>) -> Result<ToolCallResult, CallError> {
        let tracker = &mut self.tracker;

        match name {
            "user_register" => respond(tools::user_register(tracker, parse(args)?)),
            "journey_new" => respond_flow(tools::journey_new(tracker, parse(args)?)),
            "checkin_start" => respond_flow(tools::checkin_start(tracker, parse(args)?)),
            "conversation_answer" => respond_flow(tools::conversation_answer(tracker, parse(args)?)),
            "conversation_cancel" => respond_flow(tools::conversation_cancel(tracker, parse(args)?)),
            "task_request" => respond(tools::task_request(tracker, parse(args)?)),
            "task_complete" => respond(tools::task_complete(tracker, parse(args)?)),
            "profile_view" => respond(tools::profile_view(tracker, parse(args)?)),
            "account_view" => respond(tools::account_view(tracker, parse(args)?)),
            "entries_list" => respond(tools::entries_list(tracker, parse(args)?)),
            "activity_list" => respond(tools::activity_list(tracker, parse(args)?)),
            "history_export" => respond(tools::history_export(tracker, parse(args)?)),
            "ranks_list" => respond(tools::ranks_list(tracker.ranks(), parse(args)?)),
            "tracker_stats" => respond(tools::tracker_stats(tracker, &self.stats)),
            other => Err(CallError::UnknownTool(other.to_string())),
        }
    }
}

fn parse<T: DeserializeOwned>(args: Map<String, Value>) -> Result<T, CallError> {
    serde_json::from_value(Value::Object(args)).map_err(CallError::Params)
}

fn respond<T: Serialize>(outcome: Result<ToolResponse<T>, TrackerError>) -> Result<ToolCallResult, CallError> {
    let response = outcome.map_err(CallError::Tracker)?;
    ToolCallResult::with_data(response.message, &response.data).map_err(CallError::Json)
}

fn respond_flow(outcome: Result<FlowReply, TrackerError>) -> Result<ToolCallResult, CallError> {
    let reply = outcome.map_err(CallError::Tracker)?;
    ToolCallResult::with_data(tools::render_flow_reply(&reply), &reply).map_err(CallError::Json)
}

fn tool_error_response(id: Value, result: ToolCallResult) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, e.to_string(), None),
    }
}

fn tool<T: JsonSchema>(name: &str, description: &str) -> ToolDefinition {
    let schema = serde_json::to_value(schema_for!(T)).unwrap_or_else(|_| json!({ "type": "object" }));
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: schema,
    }
}

/// Every tool this server offers
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        tool::<tools::UserRegisterParams>("user_register", "Register a user or refresh their display name"),
        tool::<tools::UserParams>(
            "journey_new",
            "Start a new journey; asks for the streak so far, then for a rank system",
        ),
        tool::<tools::UserParams>(
            "checkin_start",
            "Start the daily check-in; asks whether the user relapsed, then rating, note and privacy",
        ),
        tool::<tools::AnswerParams>("conversation_answer", "Answer the question the user's conversation is waiting on"),
        tool::<tools::UserParams>("conversation_cancel", "Cancel the user's pending conversation"),
        tool::<tools::TaskRequestParams>(
            "task_request",
            "Get a random micro-task (limited per day; returns the open task if there is one)",
        ),
        tool::<tools::UserParams>("task_complete", "Mark the user's open task as done and award its points"),
        tool::<tools::ProfileParams>("profile_view", "Show a user's score, rank and journey statistics"),
        tool::<tools::AccountParams>("account_view", "Show the caller's own score, rank and journey statistics"),
        tool::<tools::EntriesListParams>("entries_list", "Page through a user's check-in entries"),
        tool::<tools::UserParams>("activity_list", "List journeys, entries and tasks in chronological order"),
        tool::<tools::UserParams>("history_export", "Export the user's whole history as JSON"),
        tool::<tools::RanksListParams>("ranks_list", "List rank systems, or one rank system in full"),
        ToolDefinition {
            name: "tracker_stats".to_string(),
            description: "Show how many users are on a journey and server statistics".to_string(),
            input_schema: json!({ "type": "object", "properties": {} }),
        },
    ]
}
