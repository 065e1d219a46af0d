use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::SharedState;
use crate::error::{McpError, McpResult};
use crate::formats::{format_groups, CreativeFormat};
use crate::graph::{GraphStore, Node, Position};
use crate::project::{MarketAwareness, ProjectUpdate};
use crate::providers::AspectRatio;
use crate::simulation::TickReport;
use crate::view::{self, ViewKind};

/// Upper bound on ticks per simulate call.
pub const MAX_TICKS_PER_CALL: u32 = 60;

/// Route tool calls to appropriate handlers
pub async fn handle_tool_call(
    state: &SharedState,
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<Value> {
    info!(tool = %tool_name, "Routing tool call");

    match tool_name {
        // Project context
        "campaign_project_get" => handle_project_get(state).await,
        "campaign_project_update" => handle_project_update(state, arguments).await,
        "campaign_project_set_awareness" => handle_set_awareness(state, arguments).await,
        "campaign_analyze_url" => handle_analyze_url(state, arguments).await,
        "campaign_analyze_image" => handle_analyze_image(state, arguments).await,
        // Generation
        "campaign_list_formats" => to_value(format_groups()),
        "campaign_expand_personas" => handle_expand_personas(state, arguments).await,
        "campaign_expand_angles" => handle_expand_angles(state, arguments).await,
        "campaign_generate_creatives" => handle_generate_creatives(state, arguments).await,
        "campaign_regenerate_creative" => handle_regenerate(state, arguments).await,
        "campaign_generate_script" => handle_generate_script(state, arguments).await,
        "campaign_generate_voiceover" => handle_generate_voiceover(state, arguments).await,
        // Simulation and stage
        "campaign_simulate" => handle_simulate(state, arguments).await,
        "campaign_promote" => handle_promote(state, arguments).await,
        "campaign_remix" => handle_remix(state, arguments).await,
        // Graph
        "campaign_view" => handle_view(state, arguments).await,
        "campaign_get_node" => handle_get_node(state, arguments).await,
        "campaign_move_node" => handle_move_node(state, arguments).await,
        _ => Err(McpError::UnknownTool {
            tool_name: tool_name.to_string(),
        }),
    }
}

// ============================================================================
// Parameter types
// ============================================================================

/// Parameters naming a single node.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeParams {
    /// Target node id.
    pub node_id: String,
}

/// Parameters for persona expansion.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpandPersonasParams {
    /// Root node to expand; defaults to "root".
    #[serde(default = "default_root")]
    pub node_id: String,
}

fn default_root() -> String {
    "root".to_string()
}

/// Parameters for setting market awareness.
#[derive(Debug, Clone, Deserialize)]
pub struct AwarenessParams {
    /// Awareness level, e.g. `PROBLEM_AWARE`.
    pub market_awareness: String,
}

/// Parameters for landing page analysis.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeUrlParams {
    /// Landing page URL.
    pub url: String,
}

/// Parameters for product image analysis.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeImageParams {
    /// Raw base64 or a data URL.
    pub image_base64: String,
}

/// Parameters for creative generation.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateCreativesParams {
    /// Angle or root node to generate under.
    pub node_id: String,
    /// Format identifiers or display labels.
    pub formats: Vec<String>,
    /// Wait for every node to settle before returning.
    #[serde(default)]
    pub wait: bool,
}

/// Parameters for image regeneration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegenerateParams {
    /// Creative to regenerate.
    pub node_id: String,
    /// "1:1" by default; anything else renders 9:16.
    #[serde(default)]
    pub aspect_ratio: Option<String>,
}

/// Parameters for the simulation.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulateParams {
    /// Ticks to run, 1 by default.
    #[serde(default = "default_ticks")]
    pub ticks: u32,
}

fn default_ticks() -> u32 {
    1
}

/// Parameters for remixing a vault node.
#[derive(Debug, Clone, Deserialize)]
pub struct RemixParams {
    /// Scaling node to remix.
    pub node_id: String,
    /// Wait for the remix reset before returning.
    #[serde(default)]
    pub wait: bool,
}

/// Parameters for a view projection.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewParams {
    /// `lab` or `vault`.
    #[serde(default = "default_view")]
    pub view: ViewKind,
}

fn default_view() -> ViewKind {
    ViewKind::Lab
}

/// Parameters for moving a node.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveNodeParams {
    /// Node to move.
    pub node_id: String,
    /// New x coordinate.
    pub x: f64,
    /// New y coordinate.
    pub y: f64,
}

/// Result of a creative generation request.
#[derive(Debug, Serialize)]
pub struct GenerateCreativesResult {
    /// Node the creatives hang from.
    pub parent_id: String,
    /// True when the call waited for the batch.
    pub completed: bool,
    /// Created nodes, re-read after waiting.
    pub nodes: Vec<Node>,
}

/// Result of one or more simulation ticks.
#[derive(Debug, Serialize)]
pub struct SimulateResult {
    /// One report per tick, in order.
    pub ticks: Vec<TickReport>,
}

// ============================================================================
// Project handlers
// ============================================================================

async fn handle_project_get(state: &SharedState) -> McpResult<Value> {
    to_value(state.project.get().await)
}

async fn handle_project_update(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let update: ProjectUpdate = parse_arguments("campaign_project_update", arguments)?;
    to_value(state.project.update(update).await)
}

async fn handle_set_awareness(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: AwarenessParams = parse_arguments("campaign_project_set_awareness", arguments)?;
    let awareness: MarketAwareness =
        params
            .market_awareness
            .parse()
            .map_err(|message| McpError::InvalidParameters {
                tool_name: "campaign_project_set_awareness".to_string(),
                message,
            })?;
    to_value(state.project.set_market_awareness(awareness).await)
}

async fn handle_analyze_url(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler("campaign_analyze_url", arguments, |params: AnalyzeUrlParams| async move {
        state.pipeline.analyze_url(&params.url).await
    })
    .await
}

async fn handle_analyze_image(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler(
        "campaign_analyze_image",
        arguments,
        |params: AnalyzeImageParams| async move {
            state.pipeline.analyze_image(&params.image_base64).await
        },
    )
    .await
}

// ============================================================================
// Generation handlers
// ============================================================================

async fn handle_expand_personas(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    let arguments = arguments.or_else(|| Some(Value::Object(Default::default())));
    execute_handler(
        "campaign_expand_personas",
        arguments,
        |params: ExpandPersonasParams| async move {
            state.pipeline.expand_personas(&params.node_id).await
        },
    )
    .await
}

async fn handle_expand_angles(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler("campaign_expand_angles", arguments, |params: NodeParams| async move {
        state.pipeline.expand_angles(&params.node_id).await
    })
    .await
}

async fn handle_generate_creatives(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    const TOOL: &str = "campaign_generate_creatives";
    let params: GenerateCreativesParams = parse_arguments(TOOL, arguments)?;

    let formats = params
        .formats
        .iter()
        .map(|f| f.parse::<CreativeFormat>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|message| McpError::InvalidParameters {
            tool_name: TOOL.to_string(),
            message,
        })?;

    let batch = state
        .pipeline
        .generate_creatives(&params.node_id, &formats)
        .await
        .map_err(|e| McpError::ExecutionFailed {
            message: e.to_string(),
        })?;

    let nodes = if params.wait {
        let ids: Vec<String> = batch.nodes.iter().map(|n| n.id.clone()).collect();
        batch.wait().await;
        let mut settled = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(node) = state.graph.get_node(&id).await {
                settled.push(node);
            }
        }
        settled
    } else {
        batch.nodes
    };

    to_value(GenerateCreativesResult {
        parent_id: params.node_id,
        completed: params.wait,
        nodes,
    })
}

async fn handle_regenerate(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler(
        "campaign_regenerate_creative",
        arguments,
        |params: RegenerateParams| async move {
            let aspect = params
                .aspect_ratio
                .as_deref()
                .map(AspectRatio::parse_lenient)
                .unwrap_or_default();
            state.pipeline.regenerate_image(&params.node_id, aspect).await
        },
    )
    .await
}

async fn handle_generate_script(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler("campaign_generate_script", arguments, |params: NodeParams| async move {
        state.pipeline.generate_script(&params.node_id).await
    })
    .await
}

async fn handle_generate_voiceover(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    execute_handler(
        "campaign_generate_voiceover",
        arguments,
        |params: NodeParams| async move { state.pipeline.generate_voiceover(&params.node_id).await },
    )
    .await
}

// ============================================================================
// Simulation and stage handlers
// ============================================================================

async fn handle_simulate(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let arguments = arguments.or_else(|| Some(Value::Object(Default::default())));
    let params: SimulateParams = parse_arguments("campaign_simulate", arguments)?;
    if params.ticks == 0 || params.ticks > MAX_TICKS_PER_CALL {
        return Err(McpError::InvalidParameters {
            tool_name: "campaign_simulate".to_string(),
            message: format!("ticks must be between 1 and {}", MAX_TICKS_PER_CALL),
        });
    }

    let mut ticks = Vec::with_capacity(params.ticks as usize);
    for _ in 0..params.ticks {
        ticks.push(state.simulation.tick().await);
    }
    to_value(SimulateResult { ticks })
}

async fn handle_promote(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler("campaign_promote", arguments, |params: NodeParams| async move {
        state.stage.promote(&params.node_id).await
    })
    .await
}

async fn handle_remix(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler("campaign_remix", arguments, |params: RemixParams| async move {
        let pending = state.stage.remix(&params.node_id).await?;
        if params.wait {
            pending.wait().await
        } else {
            Ok(pending.node)
        }
    })
    .await
}

// ============================================================================
// Graph handlers
// ============================================================================

async fn handle_view(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let arguments = arguments.or_else(|| Some(Value::Object(Default::default())));
    let params: ViewParams = parse_arguments("campaign_view", arguments)?;
    let (nodes, edges) = state.graph.snapshot().await;
    to_value(view::project(params.view, &nodes, &edges))
}

async fn handle_get_node(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: NodeParams = parse_arguments("campaign_get_node", arguments)?;
    match state.graph.get_node(&params.node_id).await {
        Some(node) => to_value(node),
        None => Err(McpError::ExecutionFailed {
            message: format!("Node not found: {}", params.node_id),
        }),
    }
}

async fn handle_move_node(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler("campaign_move_node", arguments, |params: MoveNodeParams| async move {
        state
            .graph
            .move_node(&params.node_id, Position::new(params.x, params.y))
            .await
    })
    .await
}

// ============================================================================
// Helpers
// ============================================================================

fn to_value<T: Serialize>(value: T) -> McpResult<Value> {
    serde_json::to_value(value).map_err(McpError::Json)
}

fn parse_arguments<T: serde::de::DeserializeOwned>(
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<T> {
    match arguments {
        Some(args) => serde_json::from_value(args).map_err(|e| McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: e.to_string(),
        }),
        None => Err(McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: "Missing arguments".to_string(),
        }),
    }
}

/// Generic handler: parse typed arguments, run the operation, serialize the result.
///
/// Operation errors become `ExecutionFailed` carrying the error's display text.
async fn execute_handler<P, R, E, F, Fut>(
    tool_name: &str,
    arguments: Option<Value>,
    operation: F,
) -> McpResult<Value>
where
    P: serde::de::DeserializeOwned,
    R: Serialize,
    E: std::fmt::Display,
    F: FnOnce(P) -> Fut,
    Fut: std::future::Future<Output = Result<R, E>>,
{
    let params: P = parse_arguments(tool_name, arguments)?;

    let result = operation(params)
        .await
        .map_err(|e| McpError::ExecutionFailed {
            message: e.to_string(),
        })?;

    to_value(result)
}
