//! Simulation, promotion and view projection over a shared graph.

use std::time::Duration;

use pretty_assertions::assert_eq;

use campaign_lab::config::SimulationConfig;
use campaign_lab::formats::CreativeFormat;
use campaign_lab::graph::{
    AnalysisPhase, CampaignStage, CreativeAsset, Edge, GraphStore, MemoryGraph, Node, NodePayload,
};
use campaign_lab::simulation::{SimulationEngine, INSIGHT_LEARNING, TICK_HOURS};
use campaign_lab::stage::{StageManager, REMIX_ROAS};
use campaign_lab::view::{project, ViewKind};

fn seeded(seed: u64) -> SimulationConfig {
    SimulationConfig {
        seed: Some(seed),
        busy_ms: 0,
    }
}

async fn graph_with_creatives(count: usize) -> MemoryGraph {
    let graph = MemoryGraph::with_root(Node::root("Zenith", "Gummies"));
    for i in 0..count {
        let id = format!("creative-{}", i);
        graph
            .create_node(
                Node::new(
                    id.as_str(),
                    "Meme",
                    NodePayload::Creative(Box::new(CreativeAsset::new(
                        CreativeFormat::Meme,
                        "3pm crash",
                    ))),
                )
                .with_parent("root"),
            )
            .await
            .unwrap();
        graph.create_edge(Edge::new("root", id)).await.unwrap();
    }
    graph
}

#[tokio::test]
async fn test_ticks_advance_age_and_phase() {
    let graph = graph_with_creatives(2).await;
    let engine = SimulationEngine::new(graph.clone(), &seeded(11));

    let first = engine.tick().await;
    assert_eq!(first.advanced.len(), 2);
    for tick in &first.advanced {
        assert_eq!(tick.performance.metrics.age_hours, TICK_HOURS);
        assert_eq!(tick.performance.analysis_phase, AnalysisPhase::Phase1);
        assert_eq!(tick.performance.ai_insight, INSIGHT_LEARNING);
        assert_eq!(tick.performance.metrics.roas, 0.0);
    }

    for _ in 0..3 {
        engine.tick().await;
    }
    let node = graph.get_node("creative-0").await.unwrap();
    let performance = node.performance.unwrap();
    assert_eq!(performance.metrics.age_hours, 4 * TICK_HOURS);
    assert_eq!(performance.analysis_phase, AnalysisPhase::Phase2);
    assert_eq!(
        performance.metrics.impressions,
        performance.metrics.spend * 40.0
    );
}

#[tokio::test]
async fn test_spend_never_decreases() {
    let graph = graph_with_creatives(1).await;
    let engine = SimulationEngine::new(graph.clone(), &seeded(3));

    let mut last_spend = 0.0;
    for _ in 0..20 {
        let report = engine.tick().await;
        let spend = report.advanced[0].performance.metrics.spend;
        assert!(spend > last_spend);
        last_spend = spend;
    }
    let node = graph.get_node("creative-0").await.unwrap();
    assert_eq!(
        node.performance.unwrap().analysis_phase,
        AnalysisPhase::Phase4
    );
}

#[tokio::test]
async fn test_same_seed_same_metrics() {
    let a = graph_with_creatives(3).await;
    let b = graph_with_creatives(3).await;
    let engine_a = SimulationEngine::new(a, &seeded(99));
    let engine_b = SimulationEngine::new(b, &seeded(99));

    for _ in 0..9 {
        let left = engine_a.tick().await;
        let right = engine_b.tick().await;
        let left: Vec<_> = left.advanced.iter().map(|t| t.performance.metrics).collect();
        let right: Vec<_> = right.advanced.iter().map(|t| t.performance.metrics).collect();
        assert_eq!(left, right);
    }
}

#[tokio::test]
async fn test_root_and_ghosts_are_skipped() {
    let graph = graph_with_creatives(2).await;
    let stage = StageManager::new(graph.clone(), Duration::ZERO);
    let engine = SimulationEngine::new(graph.clone(), &seeded(5));

    engine.tick().await;
    let clone = stage.promote("creative-1").await.unwrap();
    let clone_metrics = clone.performance.clone().unwrap().metrics;

    let report = engine.tick().await;
    let ids: Vec<_> = report.advanced.iter().map(|t| t.node_id.as_str()).collect();
    assert_eq!(ids, vec!["creative-0"]);

    let ghost = graph.get_node("creative-1").await.unwrap();
    assert!(ghost.is_ghost);
    assert_eq!(ghost.performance.unwrap().metrics.age_hours, TICK_HOURS);

    let vaulted = graph.get_node(&clone.id).await.unwrap();
    assert_eq!(vaulted.stage, CampaignStage::Scaling);
    assert_eq!(vaulted.performance.unwrap().metrics, clone_metrics);
}

#[tokio::test]
async fn test_views_after_promotion() {
    let graph = graph_with_creatives(2).await;
    let stage = StageManager::new(graph.clone(), Duration::ZERO);

    let clone = stage.promote("creative-0").await.unwrap();
    assert!(clone.id.starts_with("creative-0-vault-"));
    assert!(clone.parent_id.is_none());

    let (nodes, edges) = graph.snapshot().await;
    let lab = project(ViewKind::Lab, &nodes, &edges);
    assert_eq!(lab.nodes.len(), 3);
    assert_eq!(lab.edges.len(), 2);
    assert!(lab.nodes.iter().any(|n| n.id == "creative-0" && n.is_ghost));

    let vault = project(ViewKind::Vault, &nodes, &edges);
    assert_eq!(vault.nodes.len(), 1);
    assert_eq!(vault.nodes[0].id, clone.id);
    assert!(vault.edges.is_empty());
    assert!(vault.fatigued.is_empty());

    // Promoting the same source again yields a second, distinct clone.
    let again = stage.promote("creative-0").await.unwrap();
    assert_ne!(again.id, clone.id);
    assert!(stage.promote(&clone.id).await.is_err());
}

#[tokio::test]
async fn test_remix_resets_fatigued_vault_node() {
    let graph = graph_with_creatives(1).await;
    let stage = StageManager::new(graph.clone(), Duration::from_millis(5));
    let engine = SimulationEngine::new(graph.clone(), &seeded(21));
    for _ in 0..10 {
        engine.tick().await;
    }

    let clone = stage.promote("creative-0").await.unwrap();
    let pending = stage.remix(&clone.id).await.unwrap();
    assert!(pending.node.is_loading);

    let remixed = pending.wait().await.unwrap();
    assert!(!remixed.is_loading);
    let performance = remixed.performance.unwrap();
    assert_eq!(performance.metrics.roas, REMIX_ROAS);
    assert_eq!(performance.metrics.age_hours, 0);
    assert!(performance.is_winning);

    assert!(stage.remix("creative-0").await.is_err());
}
