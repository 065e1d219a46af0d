//! JSON-RPC 2.0 transport for the campaign tools.
//!
//! One request per stdin line, one response per stdout line. Notifications
//! (requests without an id) never produce output.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use super::{handle_tool_call, SharedState, MAX_TICKS_PER_CALL};
use crate::error::{McpError, McpResult};
use crate::formats::CreativeFormat;

#[cfg(test)]
#[path = "mcp_tests.rs"]
mod mcp_tests;

/// MCP protocol revision spoken by this server.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Error codes from the JSON-RPC 2.0 spec.
pub mod codes {
    /// Malformed JSON.
    pub const PARSE_ERROR: i32 = -32700;
    /// Unknown method.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Bad or missing params.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Server-side failure.
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Incoming JSON-RPC message.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol tag, "2.0".
    pub jsonrpc: String,
    /// Absent for notifications.
    pub id: Option<Value>,
    /// Method name.
    pub method: String,
    /// Method params.
    #[serde(default)]
    pub params: Option<Value>,
}

/// Outgoing JSON-RPC message. Exactly one of `result` and `error` is set.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// Protocol tag, "2.0".
    pub jsonrpc: String,
    /// Echoed request id, null when it could not be read.
    pub id: Value,
    /// Success payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    /// See [`codes`].
    pub code: i32,
    /// Description.
    pub message: String,
    /// Extra detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Server identity for the initialize handshake.
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Crate version.
    pub version: String,
}

/// Advertised capabilities.
#[derive(Debug, Serialize)]
pub struct Capabilities {
    /// Tool capabilities.
    pub tools: ToolCapabilities,
}

/// Tool capability flags.
#[derive(Debug, Serialize)]
pub struct ToolCapabilities {
    /// The tool list is fixed.
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Reply to `initialize`.
#[derive(Debug, Serialize)]
pub struct InitializeResult {
    /// See [`PROTOCOL_VERSION`].
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// Capabilities.
    pub capabilities: Capabilities,
    /// Identity.
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

/// A tool listed by `tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    /// Name used in `tools/call`.
    pub name: String,
    /// What the tool does.
    pub description: String,
    /// JSON Schema of the arguments.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Params of `tools/call`.
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    /// Tool name.
    pub name: String,
    /// Tool arguments.
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// One content block of a tool result.
#[derive(Debug, Serialize)]
pub struct ToolResultContent {
    /// Always "text".
    #[serde(rename = "type")]
    pub content_type: String,
    /// Pretty-printed JSON, or the error message.
    pub text: String,
}

/// Result of `tools/call`.
#[derive(Debug, Serialize)]
pub struct ToolCallResult {
    /// Content blocks.
    pub content: Vec<ToolResultContent>,
    /// Set when the tool failed.
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ToolCallResult {
    fn text(text: String, is_error: bool) -> Self {
        Self {
            content: vec![ToolResultContent {
                content_type: "text".to_string(),
                text,
            }],
            is_error: is_error.then_some(true),
        }
    }
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    fn from_serializable<T: Serialize>(id: Option<Value>, value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(val) => Self::success(id, val),
            Err(e) => {
                error!(error = %e, "Failed to serialize result");
                Self::error(id, codes::INTERNAL_ERROR, format!("Internal error: {}", e))
            }
        }
    }
}

/// MCP server over stdio.
pub struct McpServer {
    state: SharedState,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Serve until stdin closes.
    pub async fn run(&self) -> std::io::Result<()> {
        info!("Campaign Lab MCP server starting...");

        let mut reader = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        let mut line = String::new();

        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                info!("EOF received, shutting down");
                break;
            }

            let Some(response) = self.handle_line(&line).await else {
                continue;
            };

            let response_json = serde_json::to_string(&response)?;
            debug!(response = %response_json, "Sending response");
            stdout.write_all(response_json.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }

        Ok(())
    }

    /// Parse and dispatch one input line.
    async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        debug!(request = %trimmed, "Received request");

        match serde_json::from_str::<JsonRpcRequest>(trimmed) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                error!(error = %e, "Failed to parse request");
                Some(JsonRpcResponse::error(
                    None,
                    codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
        }
    }

    /// Dispatch a request. `None` means nothing is written back.
    async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let is_notification = request.id.is_none();

        match request.method.as_str() {
            "initialize" => Some(self.handle_initialize(request.id)),
            "initialized" | "notifications/initialized" | "notifications/cancelled" => {
                debug!(method = %request.method, "Notification received");
                None
            }
            "tools/list" => Some(JsonRpcResponse::success(
                request.id,
                json!({ "tools": all_tools() }),
            )),
            "tools/call" => Some(self.handle_tool_call(request.id, request.params).await),
            "ping" => Some(JsonRpcResponse::success(request.id, json!({}))),
            method if is_notification => {
                debug!(method = %method, "Unknown notification, ignoring");
                None
            }
            method => {
                warn!(method = %method, "Unknown method");
                Some(JsonRpcResponse::error(
                    request.id,
                    codes::METHOD_NOT_FOUND,
                    format!("Method not found: {}", method),
                ))
            }
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("Handling initialize request");
        JsonRpcResponse::from_serializable(
            id,
            InitializeResult {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: Capabilities {
                    tools: ToolCapabilities {
                        list_changed: false,
                    },
                },
                server_info: ServerInfo {
                    name: "campaign-lab".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
            },
        )
    }

    async fn handle_tool_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params = match parse_call_params(params) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Rejected tool call");
                return JsonRpcResponse::error(id, codes::INVALID_PARAMS, e.to_string());
            }
        };

        info!(tool = %params.name, "Handling tool call");

        let result = match handle_tool_call(&self.state, &params.name, params.arguments).await {
            Ok(value) => match serde_json::to_string_pretty(&value) {
                Ok(text) => ToolCallResult::text(text, false),
                Err(e) => {
                    error!(error = %e, "Failed to serialize tool result");
                    ToolCallResult::text(format!("Error: serialization failed: {}", e), true)
                }
            },
            Err(e) => {
                warn!(tool = %params.name, error = %e, "Tool call failed");
                ToolCallResult::text(format!("Error: {}", e), true)
            }
        };

        JsonRpcResponse::from_serializable(id, result)
    }
}

/// Decode `tools/call` params, which must name a tool.
fn parse_call_params(params: Option<Value>) -> McpResult<ToolCallParams> {
    let params = params.ok_or_else(|| McpError::InvalidRequest {
        message: "missing params".to_string(),
    })?;
    serde_json::from_value(params).map_err(|e| McpError::InvalidRequest {
        message: format!("bad tools/call params: {}", e),
    })
}

// ============================================================================
// Tool definitions
// ============================================================================

/// Every tool, in the order `tools/list` reports them.
pub fn all_tools() -> Vec<Tool> {
    vec![
        get_project_get_tool(),
        get_project_update_tool(),
        get_project_set_awareness_tool(),
        get_analyze_url_tool(),
        get_analyze_image_tool(),
        get_list_formats_tool(),
        get_expand_personas_tool(),
        get_expand_angles_tool(),
        get_generate_creatives_tool(),
        get_regenerate_creative_tool(),
        get_generate_script_tool(),
        get_generate_voiceover_tool(),
        get_simulate_tool(),
        get_promote_tool(),
        get_remix_tool(),
        get_view_tool(),
        get_get_node_tool(),
        get_move_node_tool(),
    ]
}

fn tool(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

fn node_only_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "node_id": { "type": "string", "description": description }
        },
        "required": ["node_id"],
        "additionalProperties": false
    })
}

fn empty_schema() -> Value {
    json!({ "type": "object", "properties": {}, "additionalProperties": false })
}

fn get_project_get_tool() -> Tool {
    tool(
        "campaign_project_get",
        "Return the project context: product, audience, country, awareness and derived funnel stage.",
        empty_schema(),
    )
}

fn get_project_update_tool() -> Tool {
    tool(
        "campaign_project_update",
        "Update project context fields. Omitted fields are left unchanged.",
        json!({
            "type": "object",
            "properties": {
                "product_name": { "type": "string" },
                "product_description": { "type": "string" },
                "target_audience": { "type": "string" },
                "target_country": { "type": "string" },
                "brand_voice": { "type": "string" },
                "offer": { "type": "string" },
                "landing_page_url": { "type": "string" },
                "market_awareness": {
                    "type": "string",
                    "enum": ["UNAWARE", "PROBLEM_AWARE", "SOLUTION_AWARE", "PRODUCT_AWARE", "MOST_AWARE"]
                },
                "copy_framework": { "type": "string", "enum": ["PAS", "AIDA", "BAB", "FAB", "STORY"] },
                "product_reference_image": {
                    "type": "string",
                    "description": "Base64 or data URL of the product photo used as a visual reference"
                }
            },
            "additionalProperties": false
        }),
    )
}

fn get_project_set_awareness_tool() -> Tool {
    tool(
        "campaign_project_set_awareness",
        "Set the market awareness level; the funnel stage follows from it.",
        json!({
            "type": "object",
            "properties": {
                "market_awareness": {
                    "type": "string",
                    "enum": ["UNAWARE", "PROBLEM_AWARE", "SOLUTION_AWARE", "PRODUCT_AWARE", "MOST_AWARE"]
                }
            },
            "required": ["market_awareness"],
            "additionalProperties": false
        }),
    )
}

fn get_analyze_url_tool() -> Tool {
    tool(
        "campaign_analyze_url",
        "Scrape a landing page and fill the project context from it.",
        json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "description": "Landing page URL" }
            },
            "required": ["url"],
            "additionalProperties": false
        }),
    )
}

fn get_analyze_image_tool() -> Tool {
    tool(
        "campaign_analyze_image",
        "Identify the product in a photo and fill the project context from it.",
        json!({
            "type": "object",
            "properties": {
                "image_base64": { "type": "string", "description": "Base64 image or data URL" }
            },
            "required": ["image_base64"],
            "additionalProperties": false
        }),
    )
}

fn get_list_formats_tool() -> Tool {
    tool(
        "campaign_list_formats",
        "List creative formats grouped by category.",
        empty_schema(),
    )
}

fn get_expand_personas_tool() -> Tool {
    tool(
        "campaign_expand_personas",
        "Generate three personas under the root node.",
        json!({
            "type": "object",
            "properties": {
                "node_id": { "type": "string", "description": "Root node id (default: root)" }
            },
            "additionalProperties": false
        }),
    )
}

fn get_expand_angles_tool() -> Tool {
    tool(
        "campaign_expand_angles",
        "Generate three marketing angles for a persona node.",
        node_only_schema("Persona node id"),
    )
}

fn get_generate_creatives_tool() -> Tool {
    let format_ids: Vec<&str> = CreativeFormat::ALL.iter().map(|f| f.as_str()).collect();
    tool(
        "campaign_generate_creatives",
        "Create one creative per format under an angle (or the root). Placeholders are returned at once; generation continues in the background unless wait is set.",
        json!({
            "type": "object",
            "properties": {
                "node_id": { "type": "string", "description": "Angle node id, or root" },
                "formats": {
                    "type": "array",
                    "minItems": 1,
                    "items": { "type": "string", "enum": format_ids },
                    "description": "Format ids (display labels are accepted too)"
                },
                "wait": {
                    "type": "boolean",
                    "description": "Block until every creative settles (default: false)"
                }
            },
            "required": ["node_id", "formats"],
            "additionalProperties": false
        }),
    )
}

fn get_regenerate_creative_tool() -> Tool {
    tool(
        "campaign_regenerate_creative",
        "Re-render a creative's image at the given aspect ratio.",
        json!({
            "type": "object",
            "properties": {
                "node_id": { "type": "string", "description": "Creative node id" },
                "aspect_ratio": {
                    "type": "string",
                    "description": "\"1:1\" (default); any other value renders 9:16"
                }
            },
            "required": ["node_id"],
            "additionalProperties": false
        }),
    )
}

fn get_generate_script_tool() -> Tool {
    tool(
        "campaign_generate_script",
        "Write a short UGC voiceover script for a creative.",
        node_only_schema("Creative node id"),
    )
}

fn get_generate_voiceover_tool() -> Tool {
    tool(
        "campaign_generate_voiceover",
        "Synthesize the creative's script with a voice matched to its persona.",
        node_only_schema("Creative node id"),
    )
}

fn get_simulate_tool() -> Tool {
    tool(
        "campaign_simulate",
        "Advance the performance simulation by one or more ticks.",
        json!({
            "type": "object",
            "properties": {
                "ticks": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_TICKS_PER_CALL,
                    "description": "Ticks to run (default: 1)"
                }
            },
            "additionalProperties": false
        }),
    )
}

fn get_promote_tool() -> Tool {
    tool(
        "campaign_promote",
        "Copy a winning creative into the Vault.",
        node_only_schema("Creative node id"),
    )
}

fn get_remix_tool() -> Tool {
    tool(
        "campaign_remix",
        "Spawn a fresh variation of a scaling creative to fight fatigue.",
        json!({
            "type": "object",
            "properties": {
                "node_id": { "type": "string", "description": "Scaling creative node id" },
                "wait": { "type": "boolean", "description": "Wait for the remix to finish (default: false)" }
            },
            "required": ["node_id"],
            "additionalProperties": false
        }),
    )
}

fn get_view_tool() -> Tool {
    tool(
        "campaign_view",
        "Return the Lab (testing graph) or Vault (promoted winners) projection.",
        json!({
            "type": "object",
            "properties": {
                "view": { "type": "string", "enum": ["lab", "vault"], "description": "Default: lab" }
            },
            "additionalProperties": false
        }),
    )
}

fn get_get_node_tool() -> Tool {
    tool(
        "campaign_get_node",
        "Fetch a single node.",
        node_only_schema("Node id"),
    )
}

fn get_move_node_tool() -> Tool {
    tool(
        "campaign_move_node",
        "Move a node on the canvas.",
        json!({
            "type": "object",
            "properties": {
                "node_id": { "type": "string" },
                "x": { "type": "number" },
                "y": { "type": "number" }
            },
            "required": ["node_id", "x", "y"],
            "additionalProperties": false
        }),
    )
}
