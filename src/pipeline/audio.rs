//! Ad script and voiceover generation for creatives.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use tracing::{info, warn};

use super::core::invalid_action;
use super::PipelineCore;
use crate::error::{AppResult, ToolError};
use crate::graph::{CreativeAsset, Node};
use crate::prompts;
use crate::providers::TextRequest;

/// Stored as the script when generation fails.
pub const SCRIPT_FAILED: &str = "Script generation failed.";

/// Synthesized audio is 16-bit mono PCM at this rate.
pub const PCM_SAMPLE_RATE: u32 = 24_000;

/// Prebuilt voice for a persona name.
///
/// "skeptic"/"man" pick Fenrir, "status"/"woman" pick Kore; the second rule
/// is checked last so "woman" wins over the "man" it contains.
pub fn voice_for_persona(persona_name: &str) -> &'static str {
    let name = persona_name.to_lowercase();
    let mut voice = "Zephyr";
    if name.contains("skeptic") || name.contains("man") {
        voice = "Fenrir";
    }
    if name.contains("status") || name.contains("woman") {
        voice = "Kore";
    }
    voice
}

/// Remove bracketed stage directions such as `[pause]` and trim.
pub fn strip_stage_directions(script: &str) -> String {
    let mut spoken = String::with_capacity(script.len());
    let mut rest = script;
    while let Some(open) = rest.find('[') {
        match rest[open..].find(']') {
            Some(close) => {
                spoken.push_str(&rest[..open]);
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    spoken.push_str(rest);
    spoken.trim().to_string()
}

/// Outcome of a voiceover request.
#[derive(Debug, Clone, Serialize)]
pub struct Voiceover {
    /// Creative after the update.
    pub node: Node,
    /// Voice used.
    pub voice: &'static str,
    /// False when synthesis failed; the node keeps any earlier audio.
    pub generated: bool,
    /// Audio length, when the payload decodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

fn pcm_duration_secs(audio_base64: &str) -> Option<f64> {
    let bytes = STANDARD.decode(audio_base64).ok()?;
    Some(bytes.len() as f64 / (PCM_SAMPLE_RATE as f64 * 2.0))
}

impl PipelineCore {
    async fn require_creative(&self, node_id: &str, action: &str) -> AppResult<CreativeAsset> {
        let node = self.require_node(node_id).await?;
        let asset = node.creative().cloned().ok_or_else(|| {
            invalid_action(
                action,
                node_id,
                format!("audio belongs to creatives, not a {} node", node.kind()),
            )
        })?;
        Ok(asset)
    }

    /// Write a short UGC script for a creative and store it on the node.
    pub async fn generate_script(&self, node_id: &str) -> AppResult<Node> {
        let asset = self.require_creative(node_id, "generate_script").await?;
        let project = self.project().get().await;

        let request = TextRequest::new(prompts::script_prompt(&project, &asset.angle));
        let script = match self.text().generate_text(request).await {
            Ok(generated) if !generated.value.trim().is_empty() => {
                let mut tally = super::Tally::default();
                tally.record(&generated);
                Some((generated.value, self.meter().usage(tally)))
            }
            Ok(_) => None,
            Err(e) => {
                warn!(node_id = %node_id, error = %e, "Script generation failed");
                None
            }
        };

        let node = self
            .graph()
            .modify(node_id, move |node| {
                let (text, usage) = match script {
                    Some((text, usage)) => (text, Some(usage)),
                    None => (SCRIPT_FAILED.to_string(), None),
                };
                if let Some(usage) = usage {
                    node.usage.accumulate(usage);
                }
                if let Some(asset) = node.creative_mut() {
                    asset.audio_script = Some(text);
                }
            })
            .await?;
        info!(node_id = %node_id, "Ad script stored");
        Ok(node)
    }

    /// Synthesize the stored script with a persona-matched voice.
    pub async fn generate_voiceover(&self, node_id: &str) -> AppResult<Voiceover> {
        let asset = self.require_creative(node_id, "generate_voiceover").await?;
        let script = asset
            .audio_script
            .as_deref()
            .filter(|s| !s.trim().is_empty() && *s != SCRIPT_FAILED)
            .ok_or_else(|| ToolError::Validation {
                field: "audio_script".to_string(),
                reason: "generate a script before the voiceover".to_string(),
            })?;

        let voice = voice_for_persona(asset.persona_name());
        let spoken = strip_stage_directions(script);

        match self.speech().synthesize(&spoken, voice).await {
            Ok(audio) => {
                let duration_secs = pcm_duration_secs(&audio);
                let node = self
                    .graph()
                    .modify(node_id, move |node| {
                        if let Some(asset) = node.creative_mut() {
                            asset.audio_base64 = Some(audio);
                        }
                    })
                    .await?;
                info!(node_id = %node_id, voice = %voice, duration_secs = ?duration_secs, "Voiceover stored");
                Ok(Voiceover {
                    node,
                    voice,
                    generated: true,
                    duration_secs,
                })
            }
            Err(e) => {
                warn!(node_id = %node_id, voice = %voice, error = %e, "Voiceover failed");
                Ok(Voiceover {
                    node: self.require_node(node_id).await?,
                    voice,
                    generated: false,
                    duration_secs: None,
                })
            }
        }
    }
}
