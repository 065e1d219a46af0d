//! Server module for MCP protocol handling.
//!
//! This module provides:
//! - MCP server implementation over stdio
//! - Tool call handlers and routing
//! - Shared application state wiring graph, project, pipeline,
//!   simulation and stage manager together

mod handlers;
mod mcp;

pub use handlers::*;
pub use mcp::*;

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::graph::{MemoryGraph, Node};
use crate::pipeline::{CostMeter, PipelineCore, Providers};
use crate::project::{ProjectContext, ProjectStore};
use crate::simulation::SimulationEngine;
use crate::stage::StageManager;

/// Application state shared across handlers.
///
/// Every component holds a handle to the same graph and project store.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// The campaign graph.
    pub graph: MemoryGraph,
    /// The single project context.
    pub project: ProjectStore,
    /// Generation pipeline.
    pub pipeline: PipelineCore,
    /// Performance simulation.
    pub simulation: SimulationEngine,
    /// Promotion and remix.
    pub stage: StageManager,
}

impl AppState {
    /// Create state around a fresh graph holding the project's root node.
    pub fn new(config: Config, providers: Providers, project: ProjectContext) -> Self {
        let graph = MemoryGraph::with_root(Node::root(
            project.product_name.as_str(),
            project.product_description.as_str(),
        ));
        let project = ProjectStore::new(project);

        tracing::info!(
            text_model = %config.models.text,
            image_model = %config.models.image,
            stagger_ms = config.pipeline.stagger_ms,
            concurrency = config.pipeline.max_concurrency,
            "AppState initializing"
        );

        let pipeline = PipelineCore::new(
            providers,
            graph.clone(),
            project.clone(),
            CostMeter::new(config.pricing.clone()),
            &config.pipeline,
        );
        let simulation = SimulationEngine::new(graph.clone(), &config.simulation);
        let stage = StageManager::new(
            graph.clone(),
            Duration::from_millis(config.pipeline.remix_delay_ms),
        );

        Self {
            config,
            graph,
            project,
            pipeline,
            simulation,
            stage,
        }
    }
}

/// Shared application state handle
pub type SharedState = Arc<AppState>;
