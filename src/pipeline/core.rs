use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use super::CostMeter;
use crate::config::PipelineConfig;
use crate::error::{GraphError, GraphResult};
use crate::graph::{GraphStore, MemoryGraph, Node};
use crate::project::ProjectStore;
use crate::prompts::VISUAL_STYLES;
use crate::providers::{ImageProvider, PageScraper, SpeechProvider, TextProvider};

/// Providers used by the pipeline, bundled for construction.
#[derive(Clone)]
pub struct Providers {
    /// Text and structured output.
    pub text: Arc<dyn TextProvider>,
    /// Image generation.
    pub image: Arc<dyn ImageProvider>,
    /// Text to speech.
    pub speech: Arc<dyn SpeechProvider>,
    /// Landing page scraping.
    pub scraper: Arc<dyn PageScraper>,
}

/// Shared state for every pipeline entry point.
///
/// Cheap to clone; background creative runs hold their own clone.
#[derive(Clone)]
pub struct PipelineCore {
    providers: Providers,
    graph: MemoryGraph,
    project: ProjectStore,
    meter: CostMeter,
    stagger: Duration,
    permits: Arc<Semaphore>,
}

impl PipelineCore {
    /// Build the core; concurrency is floored at one.
    pub fn new(
        providers: Providers,
        graph: MemoryGraph,
        project: ProjectStore,
        meter: CostMeter,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            providers,
            graph,
            project,
            meter,
            stagger: Duration::from_millis(config.stagger_ms),
            permits: Arc::new(Semaphore::new(config.max_concurrency.max(1))),
        }
    }

    /// Text provider.
    pub fn text(&self) -> &dyn TextProvider {
        self.providers.text.as_ref()
    }

    /// Image provider.
    pub fn image(&self) -> &dyn ImageProvider {
        self.providers.image.as_ref()
    }

    /// Speech provider.
    pub fn speech(&self) -> &dyn SpeechProvider {
        self.providers.speech.as_ref()
    }

    /// Scrape provider.
    pub fn scraper(&self) -> &dyn PageScraper {
        self.providers.scraper.as_ref()
    }

    /// Shared graph.
    pub fn graph(&self) -> &MemoryGraph {
        &self.graph
    }

    /// Shared project context.
    pub fn project(&self) -> &ProjectStore {
        &self.project
    }

    /// Cost meter.
    pub fn meter(&self) -> &CostMeter {
        &self.meter
    }

    pub(crate) fn stagger(&self) -> Duration {
        self.stagger
    }

    pub(crate) fn permits(&self) -> Arc<Semaphore> {
        Arc::clone(&self.permits)
    }

    /// Fetch a node or fail with `NodeNotFound`.
    pub(crate) async fn require_node(&self, id: &str) -> GraphResult<Node> {
        self.graph
            .get_node(id)
            .await
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: id.to_string(),
            })
    }

    /// Set or clear a node's loading flag.
    pub(crate) async fn set_loading(&self, id: &str, loading: bool) -> GraphResult<Node> {
        self.graph
            .modify(id, move |node| node.is_loading = loading)
            .await
    }
}

/// Style used when a concept names none.
pub(crate) fn random_visual_style() -> &'static str {
    VISUAL_STYLES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(VISUAL_STYLES[0])
}

pub(crate) fn invalid_action(action: &str, node_id: &str, reason: impl Into<String>) -> GraphError {
    GraphError::InvalidAction {
        action: action.to_string(),
        node_id: node_id.to_string(),
        reason: reason.into(),
    }
}
