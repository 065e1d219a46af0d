//! Campaign graph model and store.
//!
//! Nodes form a tree rooted at the product node (personas, then angles, then
//! creatives). Vault clones are the only parentless non-root nodes. All
//! mutation is whole-node replace-by-id; the store keeps no history.

mod memory;


pub use memory::MemoryGraph;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GraphResult;
use crate::formats::CreativeFormat;

/// Node type, fixed at creation by the payload variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Root,
    Persona,
    Angle,
    Creative,
}

impl NodeKind {
    /// Id prefix for generated children of this kind.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Persona => "persona",
            NodeKind::Angle => "angle",
            NodeKind::Creative => "creative",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Root => write!(f, "ROOT"),
            NodeKind::Persona => write!(f, "PERSONA"),
            NodeKind::Angle => write!(f, "ANGLE"),
            NodeKind::Creative => write!(f, "CREATIVE"),
        }
    }
}

/// Campaign lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStage {
    /// High-volume testing in the Lab.
    Testing,
    /// Promoted winner in the Vault.
    Scaling,
}

impl std::fmt::Display for CampaignStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignStage::Testing => write!(f, "TESTING"),
            CampaignStage::Scaling => write!(f, "SCALING"),
        }
    }
}

/// Canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Token usage and estimated cost, accumulated per node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub estimated_cost: f64,
}

impl Usage {
    pub fn new(input_tokens: u64, output_tokens: u64, estimated_cost: f64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            estimated_cost,
        }
    }

    /// Add another usage record. Totals never decrease.
    pub fn accumulate(&mut self, other: Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.estimated_cost += other.estimated_cost.max(0.0);
    }
}

/// Synthetic performance metrics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub age_hours: u32,
    pub spend: f64,
    pub cpa: f64,
    pub roas: f64,
    pub impressions: f64,
    /// Thumbstop rate.
    pub ctr: f64,
}

/// Time-bounded simulation regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisPhase {
    /// Launch & learning (0-72h).
    Phase1,
    /// Health check (day 4-7).
    Phase2,
    /// Performance evaluation (day 8-14).
    Phase3,
    /// Scaling decision (day 15+).
    Phase4,
}

impl AnalysisPhase {
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisPhase::Phase1 => "PHASE 1: Launch & Learning (0-72h)",
            AnalysisPhase::Phase2 => "PHASE 2: Health Check (Day 4-7)",
            AnalysisPhase::Phase3 => "PHASE 3: Performance Eval (Day 8-14)",
            AnalysisPhase::Phase4 => "PHASE 4: Scaling Decision (Day 15+)",
        }
    }
}

/// Performance payload, present only after the first simulation tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub metrics: Metrics,
    pub analysis_phase: AnalysisPhase,
    pub is_winning: bool,
    pub is_losing: bool,
    pub ai_insight: String,
}

/// Andromeda testing tier assigned to an angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestingTier {
    #[serde(rename = "TIER_1")]
    Tier1,
    #[serde(rename = "TIER_2")]
    Tier2,
    #[serde(rename = "TIER_3")]
    Tier3,
}

impl TestingTier {
    pub fn label(&self) -> &'static str {
        match self {
            TestingTier::Tier1 => "TIER 1: Concept Isolation (High Budget)",
            TestingTier::Tier2 => "TIER 2: Persona Isolation (Mid Budget)",
            TestingTier::Tier3 => "TIER 3: Sprint Isolation (Low Budget)",
        }
    }

    /// Lenient parse of model output such as "TIER 2" or "Tier 2: Persona".
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .to_uppercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        if normalized.starts_with("TIER1") {
            Some(TestingTier::Tier1)
        } else if normalized.starts_with("TIER2") {
            Some(TestingTier::Tier2)
        } else if normalized.starts_with("TIER3") {
            Some(TestingTier::Tier3)
        } else {
            None
        }
    }
}

/// Psychological profile of a persona.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersonaProfile {
    pub name: String,
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub motivation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_fear: Option<String>,
}

/// A message angle derived from a persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleBrief {
    pub headline: String,
    pub pain_point: String,
    pub psychological_trigger: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testing_tier: Option<TestingTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook: Option<String>,
    /// The persona this angle was generated for.
    pub persona: PersonaProfile,
}

/// Visual concept fields kept for image regeneration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VisualBrief {
    #[serde(default)]
    pub visual_scene: String,
    #[serde(default)]
    pub visual_style: String,
    #[serde(default)]
    pub technical_prompt: String,
    /// Legacy single-field scene description, read only when `visual_scene` is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_context: Option<String>,
}

impl VisualBrief {
    /// Scene description with the legacy fallback applied.
    pub fn scene(&self) -> &str {
        if !self.visual_scene.is_empty() {
            return &self.visual_scene;
        }
        self.style_context.as_deref().unwrap_or("")
    }
}

/// Ad copy produced by the copywriter stage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdCopy {
    pub primary_text: String,
    pub headline: String,
    pub cta: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance_notes: Option<String>,
}

impl AdCopy {
    /// First 100 characters of the primary text followed by an ellipsis.
    pub fn preview(&self) -> String {
        let head: String = self.primary_text.chars().take(100).collect();
        format!("{}...", head)
    }
}

/// Generated creative asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativeAsset {
    pub format: CreativeFormat,
    /// Headline of the angle this creative was generated for.
    pub angle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<PersonaProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief: Option<VisualBrief>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub carousel_images: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub carousel_captions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_copy: Option<AdCopy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<String>,
    /// The variable this creative isolates (concept rationale).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_isolated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub congruence_rationale: Option<String>,
}

impl CreativeAsset {
    pub fn new(format: CreativeFormat, angle: impl Into<String>) -> Self {
        Self {
            format,
            angle: angle.into(),
            persona: None,
            brief: None,
            image_url: None,
            carousel_images: Vec::new(),
            carousel_captions: Vec::new(),
            ad_copy: None,
            audio_script: None,
            audio_base64: None,
            variable_isolated: None,
            congruence_rationale: None,
        }
    }

    pub fn with_persona(mut self, persona: PersonaProfile) -> Self {
        self.persona = Some(persona);
        self
    }

    /// Persona display name, "User" when unknown.
    pub fn persona_name(&self) -> &str {
        self.persona
            .as_ref()
            .map(|p| p.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("User")
    }
}

/// Type-specific node content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodePayload {
    Root,
    Persona(PersonaProfile),
    Angle(AngleBrief),
    Creative(Box<CreativeAsset>),
}

impl NodePayload {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodePayload::Root => NodeKind::Root,
            NodePayload::Persona(_) => NodeKind::Persona,
            NodePayload::Angle(_) => NodeKind::Angle,
            NodePayload::Creative(_) => NodeKind::Creative,
        }
    }
}

/// A vertex in the campaign graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub stage: CampaignStage,
    #[serde(default)]
    pub is_ghost: bool,
    #[serde(default)]
    pub is_loading: bool,
    pub position: Position,
    pub payload: NodePayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<Performance>,
    #[serde(default)]
    pub usage: Usage,
    pub created_at: DateTime<Utc>,
}

impl Node {
    /// Create a Testing-stage node.
    pub fn new(id: impl Into<String>, title: impl Into<String>, payload: NodePayload) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            title: title.into(),
            description: String::new(),
            stage: CampaignStage::Testing,
            is_ghost: false,
            is_loading: false,
            position: Position::ORIGIN,
            payload,
            performance: None,
            usage: Usage::default(),
            created_at: Utc::now(),
        }
    }

    /// The product root node.
    pub fn root(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new("root", title, NodePayload::Root).with_description(description)
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_loading(mut self, loading: bool) -> Self {
        self.is_loading = loading;
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }

    pub fn creative(&self) -> Option<&CreativeAsset> {
        match &self.payload {
            NodePayload::Creative(asset) => Some(asset),
            _ => None,
        }
    }

    pub fn creative_mut(&mut self) -> Option<&mut CreativeAsset> {
        match &mut self.payload {
            NodePayload::Creative(asset) => Some(asset),
            _ => None,
        }
    }

    pub fn metrics(&self) -> Option<&Metrics> {
        self.performance.as_ref().map(|p| &p.metrics)
    }
}

/// Directed parent → child link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("{}-{}", source, target),
            source,
            target,
        }
    }
}

/// In-place node mutation applied atomically by the store.
pub type NodeMutation = Box<dyn FnOnce(&mut Node) + Send>;

/// Graph store operations.
///
/// Mutations replace the whole node by id (last writer wins). A node's id
/// and type never change once created.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Insert a node.
    async fn create_node(&self, node: Node) -> GraphResult<()>;

    /// Get a node by id.
    async fn get_node(&self, id: &str) -> Option<Node>;

    /// Replace a node by id.
    async fn update_node(&self, node: Node) -> GraphResult<()>;

    /// Apply a mutation under the store's write lock and return the result.
    async fn modify_node(&self, id: &str, mutation: NodeMutation) -> GraphResult<Node>;

    /// All nodes in insertion order.
    async fn list_nodes(&self) -> Vec<Node>;

    /// Insert an edge.
    async fn create_edge(&self, edge: Edge) -> GraphResult<()>;

    /// All edges in insertion order.
    async fn list_edges(&self) -> Vec<Edge>;

    /// Consistent snapshot of nodes and edges.
    async fn snapshot(&self) -> (Vec<Node>, Vec<Edge>);
}
