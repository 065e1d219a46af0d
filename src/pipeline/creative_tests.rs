//! Tests for the creative pipeline.

use super::*;
use crate::config::PipelineConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::graph::{AngleBrief, MemoryGraph, Position};
use crate::pipeline::{CostMeter, Providers};
use crate::project::{ProjectContext, ProjectStore};
use crate::providers::{
    Generated, ImageProvider, ImageRequest, MockImageProvider, MockPageScraper,
    MockSpeechProvider, MockTextProvider, TextProvider, TextRequest,
};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const CONCEPT: &str = r#"{"visualScene":"Student asleep on keyboard","visualStyle":"Flash photo","technicalPrompt":"Harsh flash photo of a student asleep on a laptop keyboard at 3pm","copyAngle":"Call out the crash","rationale":"Tests the afternoon-crash hook","congruenceRationale":"Headline promises no crash, image shows the crash"}"#;
const COPY: &str = r#"{"primaryText":"Your 3pm slump is not a personality trait.","headline":"Bye-Bye Brain Fog","cta":"Shop Now"}"#;

fn scripted_text(fail_copy: bool) -> MockTextProvider {
    let mut mock = MockTextProvider::new();
    mock.expect_generate_text().returning(move |req: TextRequest| {
        let prompt = req.prompt_text();
        if prompt.contains("Creative Director") {
            Ok(Generated::new(CONCEPT.to_string(), 1000, 200))
        } else if prompt.contains("Copywriter") {
            if fail_copy {
                Err(ProviderError::Api {
                    status: 429,
                    message: "quota".into(),
                })
            } else {
                Ok(Generated::new(COPY.to_string(), 500, 100))
            }
        } else if prompt.contains("Check this Ad Copy") {
            Ok(Generated::new("SAFE".to_string(), 50, 1))
        } else {
            Ok(Generated::new("{}".to_string(), 10, 10))
        }
    });
    mock
}

fn image_ok() -> MockImageProvider {
    let mut mock = MockImageProvider::new();
    mock.expect_generate_image()
        .returning(|_| Ok(Generated::new(Some("data:image/png;base64,aW1n".into()), 20, 0)));
    mock
}

fn core_with(text: MockTextProvider, image: MockImageProvider, graph: MemoryGraph) -> PipelineCore {
    core_configured(Arc::new(text), Arc::new(image), graph, 0, 2)
}

fn core_configured(
    text: Arc<dyn TextProvider>,
    image: Arc<dyn ImageProvider>,
    graph: MemoryGraph,
    stagger_ms: u64,
    max_concurrency: usize,
) -> PipelineCore {
    PipelineCore::new(
        Providers {
            text,
            image,
            speech: Arc::new(MockSpeechProvider::new()),
            scraper: Arc::new(MockPageScraper::new()),
        },
        graph,
        ProjectStore::new(ProjectContext::default()),
        CostMeter::default(),
        &PipelineConfig {
            stagger_ms,
            max_concurrency,
            remix_delay_ms: 0,
        },
    )
}

fn scripted_reply(prompt: &str) -> ProviderResult<Generated<String>> {
    if prompt.contains("Creative Director") {
        Ok(Generated::new(CONCEPT.to_string(), 1000, 200))
    } else if prompt.contains("Copywriter") {
        Ok(Generated::new(COPY.to_string(), 500, 100))
    } else if prompt.contains("Check this Ad Copy") {
        Ok(Generated::new("SAFE".to_string(), 50, 1))
    } else {
        Ok(Generated::new("{}".to_string(), 10, 10))
    }
}

/// Records the creative's description each time a provider is called.
struct StatusRecorder {
    graph: MemoryGraph,
    seen: Mutex<Vec<String>>,
}

impl StatusRecorder {
    async fn record(&self) {
        let nodes = self.graph.list_nodes().await;
        if let Some(node) = nodes.iter().find(|n| n.kind() == NodeKind::Creative) {
            self.seen.lock().unwrap().push(node.description.clone());
        }
    }
}

#[async_trait]
impl TextProvider for StatusRecorder {
    async fn generate_text(&self, request: TextRequest) -> ProviderResult<Generated<String>> {
        self.record().await;
        scripted_reply(&request.prompt_text())
    }
}

#[async_trait]
impl ImageProvider for StatusRecorder {
    async fn generate_image(
        &self,
        _request: ImageRequest,
    ) -> ProviderResult<Generated<Option<String>>> {
        self.record().await;
        Ok(Generated::new(Some("data:image/png;base64,aW1n".into()), 20, 0))
    }
}

async fn graph_with_angle() -> MemoryGraph {
    let graph = MemoryGraph::with_root(Node::root("Zenith", "Gummies"));
    let brief = AngleBrief {
        headline: "3pm crash".into(),
        pain_point: "fog".into(),
        psychological_trigger: "Loss".into(),
        testing_tier: None,
        hook: None,
        persona: PersonaProfile {
            name: "The Skeptic".into(),
            ..Default::default()
        },
    };
    graph
        .create_node(
            Node::new("angle-1", "3pm crash", NodePayload::Angle(brief))
                .with_parent("root")
                .with_position(Position::new(1200.0, 0.0)),
        )
        .await
        .unwrap();
    graph
}

#[tokio::test]
async fn test_placeholders_are_created_immediately() {
    let graph = graph_with_angle().await;
    let core = core_with(scripted_text(false), image_ok(), graph.clone());

    let batch = core
        .generate_creatives("angle-1", &[CreativeFormat::BigFont, CreativeFormat::Meme])
        .await
        .unwrap();

    assert_eq!(batch.nodes.len(), 2);
    let first = &batch.nodes[0];
    assert!(first.is_loading);
    assert_eq!(first.description, STATUS_INITIALIZING);
    assert_eq!(first.title, CreativeFormat::BigFont.label());
    assert_eq!(first.position, Position::new(1750.0, 0.0));
    assert_eq!(first.creative().unwrap().persona_name(), "The Skeptic");
    assert_eq!(first.creative().unwrap().angle, "3pm crash");
    assert_eq!(graph.list_edges().await.len(), 2);

    batch.wait().await;
}

#[tokio::test]
async fn test_completed_creative_carries_every_stage() {
    let graph = graph_with_angle().await;
    let core = core_with(scripted_text(false), image_ok(), graph.clone());

    let batch = core
        .generate_creatives("angle-1", &[CreativeFormat::BigFont])
        .await
        .unwrap();
    let id = batch.nodes[0].id.clone();
    batch.wait().await;

    let node = graph.get_node(&id).await.unwrap();
    assert!(!node.is_loading);
    assert_eq!(
        node.description,
        "Your 3pm slump is not a personality trait...."
    );

    let asset = node.creative().unwrap();
    assert_eq!(asset.image_url.as_deref(), Some("data:image/png;base64,aW1n"));
    let copy = asset.ad_copy.as_ref().unwrap();
    assert_eq!(copy.headline, "Bye-Bye Brain Fog");
    assert_eq!(copy.compliance_notes.as_deref(), Some("SAFE"));
    assert_eq!(
        asset.variable_isolated.as_deref(),
        Some("Tests the afternoon-crash hook")
    );
    assert_eq!(asset.brief.as_ref().unwrap().visual_style, "Flash photo");
    assert!(asset.carousel_images.is_empty());

    // concept + copy + compliance + image
    assert_eq!(node.usage.input_tokens, 1000 + 500 + 50 + 20);
    assert_eq!(node.usage.output_tokens, 200 + 100 + 1);
    let expected = CostMeter::default().estimate(Tally {
        input_tokens: 1570,
        output_tokens: 301,
        images: 1,
    });
    assert!((node.usage.estimated_cost - expected).abs() < 1e-12);

    assert!(!graph.get_node("angle-1").await.unwrap().is_loading);
}

#[tokio::test]
async fn test_carousel_adds_slides() {
    let graph = graph_with_angle().await;
    let core = core_with(scripted_text(false), image_ok(), graph.clone());

    let batch = core
        .generate_creatives("angle-1", &[CreativeFormat::CarouselPhotoDump])
        .await
        .unwrap();
    let id = batch.nodes[0].id.clone();
    batch.wait().await;

    let node = graph.get_node(&id).await.unwrap();
    let asset = node.creative().unwrap();
    assert_eq!(asset.carousel_images.len(), 3);
    assert!(asset.carousel_captions.is_empty());
    assert!(asset.image_url.is_some());
}

#[tokio::test]
async fn test_failure_is_isolated_per_node() {
    let graph = graph_with_angle().await;
    let core = core_with(scripted_text(true), image_ok(), graph.clone());

    let batch = core
        .generate_creatives("angle-1", &[CreativeFormat::BigFont, CreativeFormat::Meme])
        .await
        .unwrap();
    let ids: Vec<String> = batch.nodes.iter().map(|n| n.id.clone()).collect();
    batch.wait().await;

    for id in ids {
        let node = graph.get_node(&id).await.unwrap();
        assert!(!node.is_loading);
        assert_eq!(node.description, failure_description(GenerationStage::Copy));
        assert!(node.creative().unwrap().ad_copy.is_none());
    }
    assert!(!graph.get_node("angle-1").await.unwrap().is_loading);
}

#[tokio::test]
async fn test_siblings_finish_after_one_node_fails() {
    let graph = graph_with_angle().await;
    let copy_calls = Arc::new(AtomicUsize::new(0));
    let counter = copy_calls.clone();
    let mut text = MockTextProvider::new();
    text.expect_generate_text().returning(move |req: TextRequest| {
        let prompt = req.prompt_text();
        if prompt.contains("Copywriter") && counter.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(ProviderError::Api {
                status: 500,
                message: "overloaded".into(),
            });
        }
        scripted_reply(&prompt)
    });
    let core = core_configured(Arc::new(text), Arc::new(image_ok()), graph.clone(), 0, 1);

    let batch = core
        .generate_creatives(
            "angle-1",
            &[
                CreativeFormat::BigFont,
                CreativeFormat::Meme,
                CreativeFormat::UsVsThem,
            ],
        )
        .await
        .unwrap();
    let ids: Vec<String> = batch.nodes.iter().map(|n| n.id.clone()).collect();
    batch.wait().await;

    let failed = graph.get_node(&ids[0]).await.unwrap();
    assert!(!failed.is_loading);
    assert_eq!(failed.description, failure_description(GenerationStage::Copy));
    assert!(failed.creative().unwrap().ad_copy.is_none());

    for id in &ids[1..] {
        let node = graph.get_node(id).await.unwrap();
        assert!(!node.is_loading);
        assert_eq!(
            node.creative().unwrap().ad_copy.as_ref().unwrap().headline,
            "Bye-Bye Brain Fog"
        );
        assert!(node.creative().unwrap().image_url.is_some());
    }
    assert_eq!(copy_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_node_starts_are_staggered() {
    let graph = graph_with_angle().await;
    let starts = Arc::new(Mutex::new(Vec::new()));
    let recorded = starts.clone();
    let mut text = MockTextProvider::new();
    text.expect_generate_text().returning(move |req: TextRequest| {
        let prompt = req.prompt_text();
        if prompt.contains("Creative Director") {
            recorded.lock().unwrap().push(Instant::now());
        }
        scripted_reply(&prompt)
    });
    let core = core_configured(Arc::new(text), Arc::new(image_ok()), graph, 300, 1);

    let batch = core
        .generate_creatives(
            "angle-1",
            &[
                CreativeFormat::BigFont,
                CreativeFormat::Meme,
                CreativeFormat::UsVsThem,
            ],
        )
        .await
        .unwrap();
    batch.wait().await;

    let starts = starts.lock().unwrap();
    assert_eq!(starts.len(), 3);
    for pair in starts.windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= Duration::from_millis(300));
    }
}

#[tokio::test]
async fn test_status_labels_follow_stage_order() {
    let graph = graph_with_angle().await;
    let recorder = Arc::new(StatusRecorder {
        graph: graph.clone(),
        seen: Mutex::new(Vec::new()),
    });
    let core = core_configured(recorder.clone(), recorder.clone(), graph.clone(), 0, 1);

    let batch = core
        .generate_creatives("angle-1", &[CreativeFormat::BigFont])
        .await
        .unwrap();
    let id = batch.nodes[0].id.clone();
    batch.wait().await;

    let mut seen = recorder.seen.lock().unwrap().clone();
    seen.dedup();
    assert_eq!(seen, vec![STATUS_CONCEPT, STATUS_COPY, STATUS_VISUAL]);
    assert_eq!(
        graph.get_node(&id).await.unwrap().description,
        "Your 3pm slump is not a personality trait...."
    );
}

#[tokio::test]
async fn test_missing_image_still_completes() {
    let graph = graph_with_angle().await;
    let mut image = MockImageProvider::new();
    image
        .expect_generate_image()
        .returning(|_| Ok(Generated::new(None, 5, 0)));
    let core = core_with(scripted_text(false), image, graph.clone());

    let batch = core
        .generate_creatives("angle-1", &[CreativeFormat::BigFont])
        .await
        .unwrap();
    let id = batch.nodes[0].id.clone();
    batch.wait().await;

    let node = graph.get_node(&id).await.unwrap();
    assert!(!node.is_loading);
    assert!(node.creative().unwrap().image_url.is_none());
    assert!(node.creative().unwrap().ad_copy.is_some());
}

#[tokio::test]
async fn test_generate_rejects_bad_parent_and_empty_formats() {
    let graph = graph_with_angle().await;
    graph
        .create_node(Node::new(
            "persona-1",
            "P",
            NodePayload::Persona(PersonaProfile::default()),
        ))
        .await
        .unwrap();
    let core = core_with(MockTextProvider::new(), MockImageProvider::new(), graph);

    assert!(core.generate_creatives("angle-1", &[]).await.is_err());
    assert!(core
        .generate_creatives("persona-1", &[CreativeFormat::Meme])
        .await
        .is_err());
    assert!(core
        .generate_creatives("missing", &[CreativeFormat::Meme])
        .await
        .is_err());
}

#[tokio::test]
async fn test_root_parent_defaults_persona_to_user() {
    let graph = MemoryGraph::with_root(Node::root("Zenith", "Gummies"));
    let core = core_with(scripted_text(false), image_ok(), graph);

    let batch = core
        .generate_creatives("root", &[CreativeFormat::Meme])
        .await
        .unwrap();
    assert_eq!(batch.nodes[0].creative().unwrap().persona_name(), "User");
    assert_eq!(batch.nodes[0].creative().unwrap().angle, "Zenith");
    batch.wait().await;
}

async fn finished_creative(graph: &MemoryGraph) -> String {
    let core = core_with(scripted_text(false), image_ok(), graph.clone());
    let batch = core
        .generate_creatives("angle-1", &[CreativeFormat::BigFont])
        .await
        .unwrap();
    let id = batch.nodes[0].id.clone();
    batch.wait().await;
    id
}

#[tokio::test]
async fn test_regenerate_replaces_image() {
    let graph = graph_with_angle().await;
    let id = finished_creative(&graph).await;
    let before = graph.get_node(&id).await.unwrap().usage;

    let mut image = MockImageProvider::new();
    image
        .expect_generate_image()
        .withf(|req| req.aspect_ratio == AspectRatio::Portrait)
        .returning(|_| Ok(Generated::new(Some("data:image/png;base64,bmV3".into()), 20, 0)));
    let core = core_with(MockTextProvider::new(), image, graph.clone());

    let node = core
        .regenerate_image(&id, AspectRatio::Portrait)
        .await
        .unwrap();
    assert!(!node.is_loading);
    assert_eq!(
        node.creative().unwrap().image_url.as_deref(),
        Some("data:image/png;base64,bmV3")
    );
    assert!(node.description.starts_with("Your 3pm slump"));
    assert!(node.usage.estimated_cost > before.estimated_cost);
}

#[tokio::test]
async fn test_regenerate_failures_set_description() {
    let graph = graph_with_angle().await;
    let id = finished_creative(&graph).await;

    let mut empty = MockImageProvider::new();
    empty
        .expect_generate_image()
        .returning(|_| Ok(Generated::new(None, 0, 0)));
    let core = core_with(MockTextProvider::new(), empty, graph.clone());
    let node = core.regenerate_image(&id, AspectRatio::Square).await.unwrap();
    assert_eq!(node.description, REGENERATION_FAILED);
    assert!(!node.is_loading);
    assert!(node.creative().unwrap().image_url.is_some());

    let mut failing = MockImageProvider::new();
    failing.expect_generate_image().returning(|_| {
        Err(ProviderError::Timeout { timeout_ms: 10 })
    });
    let core = core_with(MockTextProvider::new(), failing, graph.clone());
    let node = core.regenerate_image(&id, AspectRatio::Square).await.unwrap();
    assert_eq!(node.description, REGENERATION_ERROR);
}

#[tokio::test]
async fn test_regenerate_rejects_non_creative() {
    let graph = graph_with_angle().await;
    let core = core_with(MockTextProvider::new(), MockImageProvider::new(), graph);
    assert!(core
        .regenerate_image("angle-1", AspectRatio::Square)
        .await
        .is_err());
}
