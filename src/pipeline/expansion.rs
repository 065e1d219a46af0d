//! Single-call expansion: root → personas, persona → angles.

use tracing::{info, warn};

use super::core::invalid_action;
use super::{generate_angles, generate_personas, PipelineCore, Tally};
use crate::error::{AppResult, ToolError};
use crate::graph::{Edge, GraphStore, Node, NodeKind, NodePayload, Usage};
use crate::layout::{ANGLE_COLUMN, PERSONA_COLUMN};

/// User-facing message when an expansion call fails.
pub const EXPANSION_FAILED: &str = "Quota exceeded.";

impl PipelineCore {
    /// Generate persona children under the root node.
    pub async fn expand_personas(&self, parent_id: &str) -> AppResult<Vec<Node>> {
        let parent = self.require_node(parent_id).await?;
        if parent.kind() != NodeKind::Root {
            return Err(invalid_action(
                "expand_personas",
                parent_id,
                format!("personas expand from the root, not a {} node", parent.kind()),
            )
            .into());
        }

        self.set_loading(parent_id, true).await?;
        let project = self.project().get().await;
        let generated = match generate_personas(self.text(), &project).await {
            Ok(generated) => generated,
            Err(e) => {
                warn!(parent_id = %parent_id, error = %e, "Persona expansion failed");
                self.set_loading(parent_id, false).await?;
                return Err(ToolError::Expansion {
                    message: EXPANSION_FAILED.to_string(),
                }
                .into());
            }
        };

        let mut tally = Tally::default();
        tally.record(&generated);
        let stamp = self.graph().stamp();
        let positions = PERSONA_COLUMN.place(parent.position, generated.value.len());
        let usages = self.meter().split(tally, generated.value.len());

        let children = generated
            .value
            .into_iter()
            .zip(positions)
            .zip(usages)
            .enumerate()
            .map(|(i, ((draft, position), usage))| {
                let description = if draft.profile.is_empty() {
                    draft.motivation.clone()
                } else {
                    draft.profile.clone()
                };
                Node::new(
                    format!("{}-{}-{}", NodeKind::Persona.id_prefix(), stamp, i),
                    draft.name.clone(),
                    NodePayload::Persona(draft.into()),
                )
                .with_parent(parent_id)
                .with_description(description)
                .with_position(position)
                .with_usage(usage)
            })
            .collect::<Vec<_>>();

        self.attach(parent_id, &children).await?;
        info!(
            parent_id = %parent_id,
            count = children.len(),
            input_tokens = tally.input_tokens,
            output_tokens = tally.output_tokens,
            "Personas expanded"
        );
        Ok(children)
    }

    /// Generate angle children under a persona node.
    pub async fn expand_angles(&self, persona_id: &str) -> AppResult<Vec<Node>> {
        let parent = self.require_node(persona_id).await?;
        let persona = match &parent.payload {
            NodePayload::Persona(profile) => profile.clone(),
            _ => {
                return Err(invalid_action(
                    "expand_angles",
                    persona_id,
                    format!("angles expand from a persona, not a {} node", parent.kind()),
                )
                .into())
            }
        };

        self.set_loading(persona_id, true).await?;
        let project = self.project().get().await;
        let generated = match generate_angles(self.text(), &project, &persona).await {
            Ok(generated) => generated,
            Err(e) => {
                warn!(persona_id = %persona_id, error = %e, "Angle expansion failed");
                self.set_loading(persona_id, false).await?;
                return Err(ToolError::Expansion {
                    message: EXPANSION_FAILED.to_string(),
                }
                .into());
            }
        };

        let mut tally = Tally::default();
        tally.record(&generated);
        let stamp = self.graph().stamp();
        let positions = ANGLE_COLUMN.place(parent.position, generated.value.len());
        let usages: Vec<Usage> = self.meter().split(tally, generated.value.len());

        let children = generated
            .value
            .into_iter()
            .zip(positions)
            .zip(usages)
            .enumerate()
            .map(|(i, ((draft, position), usage))| {
                let brief = draft.into_brief(persona.clone());
                Node::new(
                    format!("{}-{}-{}", NodeKind::Angle.id_prefix(), stamp, i),
                    brief.headline.clone(),
                    NodePayload::Angle(brief.clone()),
                )
                .with_parent(persona_id)
                .with_description(format!("Hook: {}", brief.pain_point))
                .with_position(position)
                .with_usage(usage)
            })
            .collect::<Vec<_>>();

        self.attach(persona_id, &children).await?;
        info!(
            persona_id = %persona_id,
            persona = %persona.name,
            count = children.len(),
            "Angles expanded"
        );
        Ok(children)
    }

    /// Insert children with their edges, then clear the parent's loading flag.
    async fn attach(&self, parent_id: &str, children: &[Node]) -> AppResult<()> {
        for child in children {
            self.graph().create_node(child.clone()).await?;
            self.graph()
                .create_edge(Edge::new(parent_id, child.id.as_str()))
                .await?;
        }
        self.set_loading(parent_id, false).await?;
        Ok(())
    }
}
