//! Lab and Vault projections of the graph.
//!
//! Both are pure filters recomputed from a snapshot on every request.

use serde::{Deserialize, Serialize};

use crate::graph::{CampaignStage, Edge, Node};
use crate::stage::is_fatigued;

/// Which projection to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    /// Testing graph, ghosts included.
    Lab,
    /// Promoted winners, no edges.
    Vault,
}

impl std::str::FromStr for ViewKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lab" => Ok(ViewKind::Lab),
            "vault" => Ok(ViewKind::Vault),
            _ => Err(format!("Unknown view: {}", s)),
        }
    }
}

/// A projected subset of the graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphView {
    /// Which projection this is.
    pub view: ViewKind,
    /// Visible nodes.
    pub nodes: Vec<Node>,
    /// Edges whose ends are both visible.
    pub edges: Vec<Edge>,
    /// Ids of fatigued Vault nodes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fatigued: Vec<String>,
}

/// Lab membership: Testing or ghosted.
pub fn in_lab(node: &Node) -> bool {
    node.stage == CampaignStage::Testing || node.is_ghost
}

/// Vault membership: Scaling.
pub fn in_vault(node: &Node) -> bool {
    node.stage == CampaignStage::Scaling
}

/// Lab nodes plus the edges whose endpoints are both in the Lab.
pub fn lab_view(nodes: &[Node], edges: &[Edge]) -> GraphView {
    let lab: Vec<Node> = nodes.iter().filter(|n| in_lab(n)).cloned().collect();
    let edges = edges
        .iter()
        .filter(|e| {
            lab.iter().any(|n| n.id == e.source) && lab.iter().any(|n| n.id == e.target)
        })
        .cloned()
        .collect();

    GraphView {
        view: ViewKind::Lab,
        nodes: lab,
        edges,
        fatigued: Vec::new(),
    }
}

/// Vault nodes; the Vault never shows edges.
pub fn vault_view(nodes: &[Node]) -> GraphView {
    let vault: Vec<Node> = nodes.iter().filter(|n| in_vault(n)).cloned().collect();
    let fatigued = vault
        .iter()
        .filter(|n| is_fatigued(n))
        .map(|n| n.id.clone())
        .collect();

    GraphView {
        view: ViewKind::Vault,
        nodes: vault,
        edges: Vec::new(),
        fatigued,
    }
}

/// Compute the requested projection.
pub fn project(kind: ViewKind, nodes: &[Node], edges: &[Edge]) -> GraphView {
    match kind {
        ViewKind::Lab => lab_view(nodes, edges),
        ViewKind::Vault => vault_view(nodes),
    }
}
