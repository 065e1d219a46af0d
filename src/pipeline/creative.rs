//! Creative batch generation and image regeneration.

use std::fmt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::core::{invalid_action, random_visual_style};
use super::{
    check_compliance, generate_concept, generate_copy, render_carousel, render_image,
    request_image, serialize_for_log, PipelineCore, Tally,
};
use crate::error::{AppResult, ToolError};
use crate::formats::CreativeFormat;
use crate::graph::{
    CreativeAsset, Edge, GraphStore, Node, NodeKind, NodePayload, PersonaProfile,
};
use crate::layout::CREATIVE_GRID;
use crate::prompts::{ImagePromptInput, COMPLIANCE_SAFE};
use crate::providers::AspectRatio;

/// Placeholder description before the first stage.
pub const STATUS_INITIALIZING: &str = "Initializing Generation...";
/// Shown while the concept is generated.
pub const STATUS_CONCEPT: &str = "Art Director: Defining visual style...";
/// Shown during copy and compliance.
pub const STATUS_COPY: &str = "Copywriter: Drafting...";
/// Shown while images render.
pub const STATUS_VISUAL: &str = "Visualizer: Rendering...";
/// Shown during regeneration.
pub const STATUS_REGENERATING: &str = "Regenerating visual...";
/// Regeneration returned no image.
pub const REGENERATION_FAILED: &str = "Regeneration failed.";
/// Regeneration call errored.
pub const REGENERATION_ERROR: &str = "Error during regeneration";
/// Compliance note stored when the policy check itself could not run.
pub const COMPLIANCE_UNAVAILABLE: &str = "Compliance check unavailable";

/// Stage of a creative run that can abort it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
    /// Concept agent call.
    Concept,
    /// Copywriter call.
    Copy,
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationStage::Concept => write!(f, "concept"),
            GenerationStage::Copy => write!(f, "copy"),
        }
    }
}

/// Description shown on a creative whose run aborted.
pub fn failure_description(stage: GenerationStage) -> String {
    format!("Generation failed at {} stage", stage)
}

/// Placeholders for a creative batch plus the background run filling them.
pub struct CreativeBatch {
    /// Placeholders as created, still loading.
    pub nodes: Vec<Node>,
    handle: JoinHandle<()>,
}

impl CreativeBatch {
    /// Wait for every node in the batch to settle.
    pub async fn wait(self) {
        if let Err(e) = self.handle.await {
            error!(error = %e, "Creative batch task panicked");
        }
    }
}

/// Inputs shared by every node in a batch.
#[derive(Clone)]
struct BatchContext {
    parent_id: String,
    angle: String,
    persona: Option<PersonaProfile>,
}

impl BatchContext {
    fn persona_name(&self) -> &str {
        self.persona
            .as_ref()
            .map(|p| p.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("User")
    }
}

impl PipelineCore {
    /// Create one placeholder per format under `parent_id` and start generating.
    ///
    /// Returns as soon as the placeholders exist; each node then moves through
    /// concept, copy, compliance, image and (for carousels) slide stages.
    pub async fn generate_creatives(
        &self,
        parent_id: &str,
        formats: &[CreativeFormat],
    ) -> AppResult<CreativeBatch> {
        if formats.is_empty() {
            return Err(ToolError::Validation {
                field: "formats".to_string(),
                reason: "at least one format is required".to_string(),
            }
            .into());
        }

        let parent = self.require_node(parent_id).await?;
        let persona = match &parent.payload {
            NodePayload::Angle(brief) => Some(brief.persona.clone()),
            NodePayload::Root => None,
            _ => {
                return Err(invalid_action(
                    "generate_creatives",
                    parent_id,
                    format!("creatives need an angle or root parent, not a {} node", parent.kind()),
                )
                .into())
            }
        };
        let batch = BatchContext {
            parent_id: parent_id.to_string(),
            angle: parent.title.clone(),
            persona,
        };

        self.set_loading(parent_id, true).await?;
        let stamp = self.graph().stamp();
        let positions = CREATIVE_GRID.place(parent.position, formats.len());

        let mut nodes = Vec::with_capacity(formats.len());
        for (i, (&format, position)) in formats.iter().zip(positions).enumerate() {
            let mut asset = CreativeAsset::new(format, batch.angle.as_str());
            asset.persona = batch.persona.clone();
            let node = Node::new(
                format!("{}-{}-{}", NodeKind::Creative.id_prefix(), stamp, i),
                format.label(),
                NodePayload::Creative(Box::new(asset)),
            )
            .with_parent(parent_id)
            .with_description(STATUS_INITIALIZING)
            .with_position(position)
            .with_loading(true);

            self.graph().create_node(node.clone()).await?;
            self.graph()
                .create_edge(Edge::new(parent_id, node.id.as_str()))
                .await?;
            nodes.push(node);
        }

        info!(
            parent_id = %parent_id,
            count = nodes.len(),
            angle = %batch.angle,
            "Creative batch started"
        );

        let ids: Vec<(String, CreativeFormat)> =
            nodes.iter().map(|n| n.id.clone()).zip(formats.iter().copied()).collect();
        let core = self.clone();
        let handle = tokio::spawn(async move { core.run_batch(batch, ids).await });

        Ok(CreativeBatch { nodes, handle })
    }

    async fn run_batch(self, batch: BatchContext, ids: Vec<(String, CreativeFormat)>) {
        let mut tasks = Vec::with_capacity(ids.len());
        for (i, (node_id, format)) in ids.into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.stagger()).await;
            }
            let permit = match self.permits().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!(error = %e, "Generation semaphore closed");
                    break;
                }
            };
            let core = self.clone();
            let batch = batch.clone();
            tasks.push(tokio::spawn(async move {
                core.generate_one(&batch, &node_id, format).await;
                drop(permit);
            }));
        }

        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Creative task panicked");
            }
        }

        if let Err(e) = self.set_loading(&batch.parent_id, false).await {
            warn!(parent_id = %batch.parent_id, error = %e, "Could not clear parent loading flag");
        }
        info!(parent_id = %batch.parent_id, "Creative batch finished");
    }

    /// Run every stage for one node. Failures land on the node, never propagate.
    async fn generate_one(&self, batch: &BatchContext, node_id: &str, format: CreativeFormat) {
        match self.run_stages(batch, node_id, format).await {
            Ok(()) => {}
            Err(stage) => {
                let description = failure_description(stage);
                let result = self
                    .graph()
                    .modify(node_id, move |node| {
                        node.is_loading = false;
                        node.description = description;
                    })
                    .await;
                if let Err(e) = result {
                    warn!(node_id = %node_id, error = %e, "Could not record generation failure");
                }
            }
        }
    }

    async fn run_stages(
        &self,
        batch: &BatchContext,
        node_id: &str,
        format: CreativeFormat,
    ) -> Result<(), GenerationStage> {
        let project = self.project().get().await;
        let persona_name = batch.persona_name();
        let mut tally = Tally::default();

        self.set_status(node_id, STATUS_CONCEPT).await;
        let concept = generate_concept(self.text(), &project, persona_name, &batch.angle, format)
            .await
            .map_err(|e| {
                error!(node_id = %node_id, error = %e, "Concept stage failed");
                GenerationStage::Concept
            })?;
        tally.record(&concept);
        let concept = concept.value;
        debug!(
            node_id = %node_id,
            concept = %serialize_for_log(&concept, "concept"),
            "Concept ready"
        );

        self.set_status(node_id, STATUS_COPY).await;
        let copy = generate_copy(self.text(), &project, persona_name, &concept)
            .await
            .map_err(|e| {
                error!(node_id = %node_id, error = %e, "Copy stage failed");
                GenerationStage::Copy
            })?;
        tally.record(&copy);
        let mut ad_copy = copy.value;

        ad_copy.compliance_notes = Some(match check_compliance(self.text(), &ad_copy).await {
            Ok(verdict) => {
                tally.record(&verdict);
                verdict.value
            }
            Err(e) => {
                warn!(node_id = %node_id, error = %e, "Compliance check failed");
                COMPLIANCE_UNAVAILABLE.to_string()
            }
        });
        debug!(
            node_id = %node_id,
            safe = ad_copy.compliance_notes.as_deref() == Some(COMPLIANCE_SAFE),
            "Compliance checked"
        );

        self.set_status(node_id, STATUS_VISUAL).await;
        let fallback_style = random_visual_style();
        let input = ImagePromptInput {
            angle: &batch.angle,
            format,
            visual_scene: &concept.visual_scene,
            visual_style: &concept.visual_style,
            technical_prompt: &concept.technical_prompt,
        };
        let image = render_image(
            self.image(),
            &project,
            &input,
            AspectRatio::Square,
            fallback_style,
        )
        .await;
        tally.record_image(&image);

        let slides = match format.carousel_kind() {
            Some(kind) => {
                let (slides, slide_tally) = render_carousel(
                    self.text(),
                    self.image(),
                    &project,
                    kind,
                    &input,
                    fallback_style,
                )
                .await;
                tally.merge(slide_tally);
                Some(slides)
            }
            None => None,
        };

        let usage = self.meter().usage(tally);
        let image_url = image.value;
        let brief = concept.visual_brief();
        let rationale = concept.rationale.clone();
        let congruence = concept.congruence_rationale.clone();

        let result = self
            .graph()
            .modify(node_id, move |node| {
                node.is_loading = false;
                node.description = ad_copy.preview();
                node.usage.accumulate(usage);
                if let Some(asset) = node.creative_mut() {
                    asset.image_url = image_url;
                    if let Some(slides) = slides {
                        asset.carousel_images = slides.images;
                        asset.carousel_captions = slides.captions;
                    }
                    asset.ad_copy = Some(ad_copy);
                    asset.brief = Some(brief);
                    asset.variable_isolated = Some(rationale).filter(|r| !r.is_empty());
                    asset.congruence_rationale = Some(congruence).filter(|r| !r.is_empty());
                }
            })
            .await;

        match result {
            Ok(node) => info!(
                node_id = %node_id,
                format = %format.as_str(),
                input_tokens = tally.input_tokens,
                output_tokens = tally.output_tokens,
                images = tally.images,
                cost = node.usage.estimated_cost,
                "Creative generated"
            ),
            Err(e) => warn!(node_id = %node_id, error = %e, "Creative removed before completion"),
        }
        Ok(())
    }

    async fn set_status(&self, node_id: &str, status: &'static str) {
        if let Err(e) = self
            .graph()
            .modify(node_id, move |node| node.description = status.to_string())
            .await
        {
            warn!(node_id = %node_id, error = %e, "Could not update status");
        }
    }

    /// Re-render a creative's image from its stored concept.
    pub async fn regenerate_image(
        &self,
        node_id: &str,
        aspect_ratio: AspectRatio,
    ) -> AppResult<Node> {
        let node = self.require_node(node_id).await?;
        let asset = node.creative().cloned().ok_or_else(|| {
            invalid_action(
                "regenerate",
                node_id,
                format!("only creatives have images, not a {} node", node.kind()),
            )
        })?;

        self.graph()
            .modify(node_id, |node| {
                node.is_loading = true;
                node.description = STATUS_REGENERATING.to_string();
            })
            .await?;

        let project = self.project().get().await;
        let angle = if asset.angle.is_empty() {
            node.title.clone()
        } else {
            asset.angle.clone()
        };
        let brief = asset.brief.clone().unwrap_or_default();
        let input = ImagePromptInput {
            angle: &angle,
            format: asset.format,
            visual_scene: brief.scene(),
            visual_style: &brief.visual_style,
            technical_prompt: &brief.technical_prompt,
        };
        debug!(
            node_id = %node_id,
            persona = %asset.persona_name(),
            aspect_ratio = %aspect_ratio,
            "Regenerating image"
        );

        let outcome = request_image(
            self.image(),
            &project,
            &input,
            aspect_ratio,
            random_visual_style(),
        )
        .await;

        let updated = match outcome {
            Ok(generated) => {
                let mut tally = Tally::default();
                tally.record_image(&generated);
                let usage = self.meter().usage(tally);
                match generated.value {
                    Some(url) => {
                        info!(node_id = %node_id, "Image regenerated");
                        self.graph()
                            .modify(node_id, move |node| {
                                node.is_loading = false;
                                node.usage.accumulate(usage);
                                if let Some(preview) = node
                                    .creative()
                                    .and_then(|a| a.ad_copy.as_ref())
                                    .map(|c| c.preview())
                                {
                                    node.description = preview;
                                }
                                if let Some(asset) = node.creative_mut() {
                                    asset.image_url = Some(url);
                                }
                            })
                            .await?
                    }
                    None => {
                        warn!(node_id = %node_id, "Regeneration returned no image");
                        self.finish_with(node_id, REGENERATION_FAILED).await?
                    }
                }
            }
            Err(e) => {
                error!(node_id = %node_id, error = %e, "Regeneration failed");
                self.finish_with(node_id, REGENERATION_ERROR).await?
            }
        };
        Ok(updated)
    }

    async fn finish_with(&self, node_id: &str, description: &'static str) -> AppResult<Node> {
        Ok(self
            .graph()
            .modify(node_id, move |node| {
                node.is_loading = false;
                node.description = description.to_string();
            })
            .await?)
    }
}

#[cfg(test)]
#[path = "creative_tests.rs"]
mod creative_tests;
