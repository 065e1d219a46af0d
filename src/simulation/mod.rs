//! Phased performance simulation.
//!
//! Each tick advances every eligible creative (Testing stage, not ghosted)
//! by 24 simulated hours and recomputes its metrics from scratch. Only
//! `spend` and `age_hours` carry over between ticks.
//!
//! Randomness comes from a single seedable [`StdRng`]; [`advance`] itself is
//! a pure function of the previous metrics and a [`Draw`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::SimulationConfig;
use crate::graph::{
    AnalysisPhase, CampaignStage, GraphStore, MemoryGraph, Metrics, Node, NodeKind, Performance,
};

/// Simulated hours added per tick.
pub const TICK_HOURS: u32 = 24;

/// Impressions per unit of spend.
pub const IMPRESSIONS_PER_SPEND: f64 = 40.0;

/// Phase 1 insight.
pub const INSIGHT_LEARNING: &str =
    "PHASE 1 (Learning): Volatility detected. Do not touch. 72-hour rule active.";
/// Phase 2 insight when CTR is below 1%.
pub const INSIGHT_KILL: &str = "PHASE 2 (Health): Thumbstop Rate < 1%. Kill immediately.";
/// Phase 2 insight otherwise.
pub const INSIGHT_HEALTHY: &str = "PHASE 2 (Health): Thumbstop healthy. Monitoring conversion.";
/// Phase 3 insight above 2.0 ROAS.
pub const INSIGHT_WINNER: &str =
    "PHASE 3 (Eval): Winner detected (ROAS > 2.0). Prepare to scale.";
/// Phase 3 insight below 1.0 ROAS.
pub const INSIGHT_BURNER: &str = "PHASE 3 (Eval): Burner (ROAS < 1.0). Turn off.";
/// Phase 3 insight in between.
pub const INSIGHT_MEDIOCRE: &str = "PHASE 3 (Eval): Mediocre. Iterate hook.";
/// Phase 4 insight.
pub const INSIGHT_SCALE: &str = "PHASE 4 (Scale): Horizontal scaling recommended.";

/// One node's random inputs for a tick, each in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Draw {
    /// Underlying creative quality for this tick.
    pub base: f64,
    /// Selects the spend increment within the phase's range.
    pub spend_roll: f64,
    /// Phase 1 CTR noise.
    pub volatility: f64,
}

impl Draw {
    /// Draw the three values in field order.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            base: rng.gen::<f64>(),
            spend_roll: rng.gen::<f64>(),
            volatility: rng.gen::<f64>(),
        }
    }
}

/// Phase for a cumulative age.
pub fn phase_for_age(age_hours: u32) -> AnalysisPhase {
    match age_hours {
        0..=72 => AnalysisPhase::Phase1,
        73..=168 => AnalysisPhase::Phase2,
        169..=336 => AnalysisPhase::Phase3,
        _ => AnalysisPhase::Phase4,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Spend increment for a phase: `floor(roll * width) + floor_value`.
fn spend_increment(phase: AnalysisPhase, roll: f64) -> f64 {
    let (width, minimum) = match phase {
        AnalysisPhase::Phase1 => (50.0, 20.0),
        AnalysisPhase::Phase2 => (100.0, 50.0),
        AnalysisPhase::Phase3 => (200.0, 100.0),
        AnalysisPhase::Phase4 => (500.0, 200.0),
    };
    (roll * width).floor() + minimum
}

/// Compute the next performance snapshot from the previous metrics.
pub fn advance(previous: Option<&Metrics>, draw: Draw) -> Performance {
    let age_hours = previous.map(|m| m.age_hours).unwrap_or(0) + TICK_HOURS;
    let phase = phase_for_age(age_hours);
    let spend = previous.map(|m| m.spend).unwrap_or(0.0) + spend_increment(phase, draw.spend_roll);

    let stable_ctr = round2(draw.base * 3.0 + 0.5);
    let roas = round2(draw.base * 5.0);
    let cpa = (20.0 / draw.base.max(0.01)).floor() + 5.0;

    let (ctr, roas, cpa, is_winning, is_losing, insight) = match phase {
        AnalysisPhase::Phase1 => (
            round2(draw.volatility * 4.0),
            0.0,
            0.0,
            false,
            false,
            INSIGHT_LEARNING,
        ),
        AnalysisPhase::Phase2 => {
            let losing = stable_ctr < 0.8;
            let insight = if losing { INSIGHT_KILL } else { INSIGHT_HEALTHY };
            (stable_ctr, 0.0, 0.0, false, losing, insight)
        }
        AnalysisPhase::Phase3 => {
            if roas > 2.0 {
                (stable_ctr, roas, cpa, true, false, INSIGHT_WINNER)
            } else if roas < 1.0 {
                (stable_ctr, roas, cpa, false, true, INSIGHT_BURNER)
            } else {
                (stable_ctr, roas, cpa, false, false, INSIGHT_MEDIOCRE)
            }
        }
        AnalysisPhase::Phase4 => (stable_ctr, roas, cpa, roas > 2.0, false, INSIGHT_SCALE),
    };

    Performance {
        metrics: Metrics {
            age_hours,
            spend,
            cpa,
            roas,
            impressions: spend * IMPRESSIONS_PER_SPEND,
            ctr,
        },
        analysis_phase: phase,
        is_winning,
        is_losing,
        ai_insight: insight.to_string(),
    }
}

/// Whether a node takes part in simulation ticks.
pub fn is_eligible(node: &Node) -> bool {
    node.kind() == NodeKind::Creative && node.stage == CampaignStage::Testing && !node.is_ghost
}

/// Result for one node in a tick.
#[derive(Debug, Clone, Serialize)]
pub struct NodeTick {
    /// Advanced node.
    pub node_id: String,
    /// Performance after the tick.
    pub performance: Performance,
}

/// Summary of one tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    /// Nodes that advanced, in graph order.
    pub advanced: Vec<NodeTick>,
    /// Busy flag right after the tick.
    pub busy: bool,
}

/// Drives simulation ticks over the graph.
#[derive(Clone)]
pub struct SimulationEngine {
    graph: MemoryGraph,
    rng: Arc<Mutex<StdRng>>,
    busy: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    busy_duration: Duration,
}

impl SimulationEngine {
    /// Create an engine; a configured seed makes every tick reproducible.
    pub fn new(graph: MemoryGraph, config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => {
                info!(seed, "Simulation seeded");
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };
        Self::with_rng(graph, rng, Duration::from_millis(config.busy_ms))
    }

    /// Create an engine with an explicit generator.
    pub fn with_rng(graph: MemoryGraph, rng: StdRng, busy_duration: Duration) -> Self {
        Self {
            graph,
            rng: Arc::new(Mutex::new(rng)),
            busy: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            busy_duration,
        }
    }

    /// Cosmetic busy flag, true for a short window after each tick.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Advance every eligible node by one tick.
    pub async fn tick(&self) -> TickReport {
        let nodes = self.graph.list_nodes().await;
        let eligible: Vec<String> = nodes
            .iter()
            .filter(|n| is_eligible(n))
            .map(|n| n.id.clone())
            .collect();

        let draws: Vec<Draw> = {
            let mut rng = self.rng.lock().await;
            eligible.iter().map(|_| Draw::sample(&mut *rng)).collect()
        };

        let mut advanced = Vec::with_capacity(eligible.len());
        for (node_id, draw) in eligible.into_iter().zip(draws) {
            let result = self
                .graph
                .modify(&node_id, move |node| {
                    // Recheck: the node may have been promoted since the listing.
                    if is_eligible(node) {
                        let next = advance(node.metrics(), draw);
                        node.performance = Some(next);
                    }
                })
                .await;

            match result {
                Ok(node) if is_eligible(&node) => {
                    if let Some(performance) = node.performance {
                        debug!(
                            node_id = %node_id,
                            age_hours = performance.metrics.age_hours,
                            phase = ?performance.analysis_phase,
                            "Node advanced"
                        );
                        advanced.push(NodeTick {
                            node_id,
                            performance,
                        });
                    }
                }
                Ok(_) => debug!(node_id = %node_id, "Node left testing during tick"),
                Err(e) => debug!(node_id = %node_id, error = %e, "Node vanished during tick"),
            }
        }

        info!(nodes = advanced.len(), "Simulation tick complete");
        self.mark_busy();

        TickReport {
            advanced,
            busy: self.is_busy(),
        }
    }

    fn mark_busy(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.busy.store(true, Ordering::SeqCst);

        let busy = Arc::clone(&self.busy);
        let current = Arc::clone(&self.generation);
        let duration = self.busy_duration;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            // A later tick owns the flag now.
            if current.load(Ordering::SeqCst) == generation {
                busy.store(false, Ordering::SeqCst);
            }
        });
    }
}
