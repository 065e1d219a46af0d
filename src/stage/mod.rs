//! Promotion to the Vault, fatigue recovery and fatigue status.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{GraphError, GraphResult};
use crate::graph::{
    AnalysisPhase, CampaignStage, GraphStore, MemoryGraph, Metrics, Node, NodeKind, Performance,
    Position,
};

/// ROAS below which a Scaling creative counts as fatigued.
pub const FATIGUE_ROAS_THRESHOLD: f64 = 1.5;

/// CTR a remixed creative restarts from.
pub const REMIX_CTR: f64 = 2.5;
/// CPA a remixed creative restarts from.
pub const REMIX_CPA: f64 = 15.0;
/// ROAS a remixed creative restarts from.
pub const REMIX_ROAS: f64 = 3.2;

/// Derived status: a Scaling node whose ROAS has dropped below 1.5.
pub fn is_fatigued(node: &Node) -> bool {
    node.stage == CampaignStage::Scaling
        && node
            .metrics()
            .map(|m| m.roas < FATIGUE_ROAS_THRESHOLD)
            .unwrap_or(false)
}

/// Fresh performance after a remix.
///
/// Everything not named in the baseline (spend, impressions) is kept from the
/// previous metrics.
pub fn remixed_performance(previous: Option<&Performance>) -> Performance {
    let metrics = previous.map(|p| p.metrics).unwrap_or_default();
    Performance {
        metrics: Metrics {
            ctr: REMIX_CTR,
            cpa: REMIX_CPA,
            roas: REMIX_ROAS,
            age_hours: 0,
            ..metrics
        },
        analysis_phase: previous
            .map(|p| p.analysis_phase)
            .unwrap_or(AnalysisPhase::Phase1),
        is_winning: true,
        is_losing: false,
        ai_insight: previous.map(|p| p.ai_insight.clone()).unwrap_or_default(),
    }
}

fn invalid(action: &str, node_id: &str, reason: impl Into<String>) -> GraphError {
    GraphError::InvalidAction {
        action: action.to_string(),
        node_id: node_id.to_string(),
        reason: reason.into(),
    }
}

/// A remix whose delayed completion is still running.
pub struct PendingRemix {
    /// The node as marked loading.
    pub node: Node,
    handle: JoinHandle<GraphResult<Node>>,
}

impl PendingRemix {
    /// Wait for the remix to land and return the updated node.
    pub async fn wait(self) -> GraphResult<Node> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, node_id = %self.node.id, "Remix task aborted");
                Err(GraphError::NodeNotFound {
                    node_id: self.node.id,
                })
            }
        }
    }
}

/// Stage transitions over the shared graph.
#[derive(Clone)]
pub struct StageManager {
    graph: MemoryGraph,
    remix_delay: Duration,
}

impl StageManager {
    /// Manager over `graph`; remixes settle after `remix_delay`.
    pub fn new(graph: MemoryGraph, remix_delay: Duration) -> Self {
        Self { graph, remix_delay }
    }

    /// Clone a Testing creative into the Vault and ghost the original.
    ///
    /// Each call produces a fresh clone; the source stays ghosted.
    pub async fn promote(&self, node_id: &str) -> GraphResult<Node> {
        let source = self
            .graph
            .get_node(node_id)
            .await
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: node_id.to_string(),
            })?;

        if source.kind() != NodeKind::Creative {
            return Err(invalid(
                "promote",
                node_id,
                format!("only creatives can be promoted, found {}", source.kind()),
            ));
        }
        if source.stage != CampaignStage::Testing {
            return Err(invalid("promote", node_id, "node is already in the Vault"));
        }

        let mut clone = source.clone();
        clone.id = format!("{}-vault-{}", source.id, self.graph.stamp());
        clone.stage = CampaignStage::Scaling;
        clone.parent_id = None;
        clone.position = Position::ORIGIN;
        clone.is_ghost = false;
        clone.is_loading = false;

        self.graph.create_node(clone.clone()).await?;
        self.graph.modify(node_id, |node| node.is_ghost = true).await?;

        info!(node_id = %node_id, clone_id = %clone.id, "Creative promoted to vault");
        Ok(clone)
    }

    /// Mark a Scaling node loading and reset its metrics after the remix delay.
    pub async fn remix(&self, node_id: &str) -> GraphResult<PendingRemix> {
        let node = self
            .graph
            .get_node(node_id)
            .await
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: node_id.to_string(),
            })?;
        if node.stage != CampaignStage::Scaling {
            return Err(invalid(
                "remix",
                node_id,
                "only Vault creatives can be remixed",
            ));
        }

        let node = self.graph.modify(node_id, |n| n.is_loading = true).await?;
        debug!(node_id = %node_id, delay_ms = self.remix_delay.as_millis() as u64, "Remix started");

        let graph = self.graph.clone();
        let delay = self.remix_delay;
        let id = node_id.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let result = graph
                .modify(&id, |n| {
                    n.performance = Some(remixed_performance(n.performance.as_ref()));
                    n.is_loading = false;
                })
                .await;
            match &result {
                Ok(_) => info!(node_id = %id, "Remix applied"),
                Err(e) => warn!(node_id = %id, error = %e, "Remix target disappeared"),
            }
            result
        });

        Ok(PendingRemix { node, handle })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::CreativeFormat;
    use crate::graph::{CreativeAsset, Edge, NodePayload, PersonaProfile};
    use pretty_assertions::assert_eq;

    fn creative(id: &str) -> Node {
        Node::new(
            id,
            "Big Font",
            NodePayload::Creative(Box::new(CreativeAsset::new(CreativeFormat::BigFont, "angle"))),
        )
        .with_parent("angle-1")
        .with_position(Position::new(1650.0, -550.0))
    }

    fn performance(roas: f64) -> Performance {
        Performance {
            metrics: Metrics {
                age_hours: 240,
                spend: 900.0,
                cpa: 40.0,
                roas,
                impressions: 36000.0,
                ctr: 1.1,
            },
            analysis_phase: AnalysisPhase::Phase3,
            is_winning: false,
            is_losing: true,
            ai_insight: "x".to_string(),
        }
    }

    async fn setup() -> (MemoryGraph, StageManager) {
        let graph = MemoryGraph::with_root(Node::root("Zenith", "Gummies"));
        graph
            .create_node(
                Node::new("angle-1", "Angle", NodePayload::Persona(PersonaProfile::default()))
                    .with_parent("root"),
            )
            .await
            .unwrap();
        graph.create_node(creative("c1")).await.unwrap();
        graph.create_edge(Edge::new("angle-1", "c1")).await.unwrap();
        let manager = StageManager::new(graph.clone(), Duration::from_millis(10));
        (graph, manager)
    }

    #[tokio::test]
    async fn test_promote_clones_and_ghosts() {
        let (graph, manager) = setup().await;

        let clone = manager.promote("c1").await.unwrap();
        assert_ne!(clone.id, "c1");
        assert!(clone.id.starts_with("c1-vault-"));
        assert_eq!(clone.stage, CampaignStage::Scaling);
        assert_eq!(clone.parent_id, None);
        assert_eq!(clone.position, Position::ORIGIN);
        assert!(!clone.is_ghost);
        assert_eq!(clone.payload, creative("c1").payload);

        let source = graph.get_node("c1").await.unwrap();
        assert!(source.is_ghost);
        assert_eq!(source.stage, CampaignStage::Testing);
    }

    #[tokio::test]
    async fn test_promote_twice_makes_two_clones() {
        let (graph, manager) = setup().await;

        let first = manager.promote("c1").await.unwrap();
        let second = manager.promote("c1").await.unwrap();
        assert_ne!(first.id, second.id);
        assert!(graph.get_node("c1").await.unwrap().is_ghost);

        let vault: Vec<_> = graph
            .list_nodes()
            .await
            .into_iter()
            .filter(|n| n.stage == CampaignStage::Scaling)
            .collect();
        assert_eq!(vault.len(), 2);
    }

    #[tokio::test]
    async fn test_promote_rejects_non_creative_and_scaling() {
        let (_graph, manager) = setup().await;
        assert!(matches!(
            manager.promote("root").await,
            Err(GraphError::InvalidAction { .. })
        ));

        let clone = manager.promote("c1").await.unwrap();
        assert!(matches!(
            manager.promote(&clone.id).await,
            Err(GraphError::InvalidAction { .. })
        ));
        assert!(matches!(
            manager.promote("missing").await,
            Err(GraphError::NodeNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_remix_resets_metrics_after_delay() {
        let (graph, manager) = setup().await;
        let clone = manager.promote("c1").await.unwrap();
        graph
            .modify(&clone.id, |n| n.performance = Some(performance(0.9)))
            .await
            .unwrap();

        let pending = manager.remix(&clone.id).await.unwrap();
        assert!(pending.node.is_loading);

        let node = pending.wait().await.unwrap();
        assert!(!node.is_loading);
        let perf = node.performance.unwrap();
        assert_eq!(perf.metrics.ctr, 2.5);
        assert_eq!(perf.metrics.cpa, 15.0);
        assert_eq!(perf.metrics.roas, 3.2);
        assert_eq!(perf.metrics.age_hours, 0);
        assert_eq!(perf.metrics.spend, 900.0);
        assert!(perf.is_winning);
        assert!(!perf.is_losing);
        assert_eq!(node.stage, CampaignStage::Scaling);
    }

    #[tokio::test]
    async fn test_remix_requires_scaling() {
        let (_graph, manager) = setup().await;
        assert!(matches!(
            manager.remix("c1").await,
            Err(GraphError::InvalidAction { .. })
        ));
    }

    #[tokio::test]
    async fn test_remix_without_metrics_starts_from_zero() {
        let (_graph, manager) = setup().await;
        let clone = manager.promote("c1").await.unwrap();
        let node = manager.remix(&clone.id).await.unwrap().wait().await.unwrap();
        let metrics = node.performance.unwrap().metrics;
        assert_eq!(metrics.spend, 0.0);
        assert_eq!(metrics.roas, 3.2);
    }

    #[test]
    fn test_fatigue_is_derived() {
        let mut node = creative("c1");
        node.performance = Some(performance(1.2));
        assert!(!is_fatigued(&node), "testing nodes never fatigue");

        node.stage = CampaignStage::Scaling;
        assert!(is_fatigued(&node));

        node.performance = Some(performance(1.5));
        assert!(!is_fatigued(&node));

        node.performance = None;
        assert!(!is_fatigued(&node));
    }
}
