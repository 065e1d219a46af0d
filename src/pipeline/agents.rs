//! Typed agent calls: one prompt in, one parsed structure out.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::parse_completion;
use crate::error::ProviderResult;
use crate::formats::{CarouselKind, CreativeFormat};
use crate::graph::{AdCopy, AngleBrief, PersonaProfile, TestingTier, VisualBrief};
use crate::project::ProjectContext;
use crate::prompts;
use crate::providers::{
    AspectRatio, Generated, ImageProvider, ImageRequest, InlineImage, PromptPart, TextProvider,
    TextRequest,
};

use super::Tally;

/// Persona as returned by the psychologist agent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaDraft {
    /// Short persona label, e.g. "The Skeptic".
    pub name: String,
    /// Who they are.
    #[serde(default)]
    pub profile: String,
    /// What they want.
    #[serde(default)]
    pub motivation: String,
    /// Underlying fear, when the model offers one.
    #[serde(default)]
    pub deep_fear: Option<String>,
}

impl From<PersonaDraft> for PersonaProfile {
    fn from(draft: PersonaDraft) -> Self {
        PersonaProfile {
            name: draft.name,
            profile: draft.profile,
            motivation: draft.motivation,
            deep_fear: draft.deep_fear.filter(|f| !f.is_empty()),
        }
    }
}

/// Angle as returned by the strategist agent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AngleDraft {
    /// Angle headline; becomes the node title.
    pub headline: String,
    /// Pain the angle targets.
    #[serde(default)]
    pub pain_point: String,
    /// Trigger the angle pulls.
    #[serde(default)]
    pub psychological_trigger: String,
    /// Raw tier text, parsed leniently.
    #[serde(default)]
    pub testing_tier: Option<String>,
    /// Opening hook line.
    #[serde(default)]
    pub hook: Option<String>,
}

impl AngleDraft {
    /// Attach the persona the angle was generated for.
    pub fn into_brief(self, persona: PersonaProfile) -> AngleBrief {
        AngleBrief {
            headline: self.headline,
            pain_point: self.pain_point,
            psychological_trigger: self.psychological_trigger,
            testing_tier: self
                .testing_tier
                .as_deref()
                .and_then(TestingTier::parse_lenient),
            hook: self.hook.filter(|h| !h.is_empty()),
            persona,
        }
    }
}

/// The creative director's concept, shared by copy and image stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    /// What the image shows.
    #[serde(default)]
    pub visual_scene: String,
    /// Photographic or graphic style.
    #[serde(default)]
    pub visual_style: String,
    /// Prompt written for the image model.
    #[serde(default)]
    pub technical_prompt: String,
    /// Direction handed to the copywriter.
    #[serde(default)]
    pub copy_angle: String,
    /// Variable this creative isolates.
    #[serde(default)]
    pub rationale: String,
    /// How headline and image support each other.
    #[serde(default)]
    pub congruence_rationale: String,
    /// Hook part of the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_component: Option<String>,
    /// Body part of the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_component: Option<String>,
    /// Call-to-action part of the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_component: Option<String>,
}

impl Concept {
    /// The fields regeneration needs later.
    pub fn visual_brief(&self) -> VisualBrief {
        VisualBrief {
            visual_scene: self.visual_scene.clone(),
            visual_style: self.visual_style.clone(),
            technical_prompt: self.technical_prompt.clone(),
            style_context: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CopyDraft {
    #[serde(default)]
    primary_text: String,
    #[serde(default)]
    headline: String,
    #[serde(default)]
    cta: String,
}

/// Project fields extracted from a landing page or product image.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextExtraction {
    /// Product name.
    #[serde(default)]
    pub product_name: Option<String>,
    /// One-paragraph description.
    #[serde(default)]
    pub product_description: Option<String>,
    /// Who the product is for.
    #[serde(default)]
    pub target_audience: Option<String>,
    /// Market, only when evident.
    #[serde(default)]
    pub target_country: Option<String>,
    /// Tone of the brand.
    #[serde(default)]
    pub brand_voice: Option<String>,
    /// Current offer.
    #[serde(default)]
    pub offer: Option<String>,
}

/// Five planned slides for a Real Story carousel.
#[derive(Debug, Clone, Default)]
pub struct CarouselPlan {
    entries: Map<String, Value>,
}

impl CarouselPlan {
    fn entry(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Image description for slide `slide` (1-based), if planned.
    pub fn image(&self, slide: usize) -> Option<&str> {
        self.entry(&format!("image{}", slide))
    }

    /// Caption for slide `slide` (1-based), empty when missing.
    pub fn caption(&self, slide: usize) -> &str {
        self.entry(&format!("caption{}", slide)).unwrap_or("")
    }

    /// One-line story idea.
    pub fn idea(&self) -> Option<&str> {
        self.entry("idea")
    }
}

// ============================================================================
// Agent calls
// ============================================================================

/// Ask the psychologist agent for three personas.
pub async fn generate_personas(
    text: &dyn TextProvider,
    project: &ProjectContext,
) -> ProviderResult<Generated<Vec<PersonaDraft>>> {
    let request =
        TextRequest::new(prompts::persona_prompt(project)).with_schema(prompts::persona_schema());
    let generated = text.generate_text(request).await?;
    let personas: Vec<PersonaDraft> = parse_completion(&generated.value, "personas")?;
    debug!(count = personas.len(), "Personas generated");
    Ok(generated.map(|_| personas))
}

/// Ask the strategist agent for three angles for a persona.
pub async fn generate_angles(
    text: &dyn TextProvider,
    project: &ProjectContext,
    persona: &PersonaProfile,
) -> ProviderResult<Generated<Vec<AngleDraft>>> {
    let request = TextRequest::new(prompts::angle_prompt(
        project,
        &persona.name,
        &persona.motivation,
    ))
    .with_schema(prompts::angle_schema());
    let generated = text.generate_text(request).await?;
    let angles: Vec<AngleDraft> = parse_completion(&generated.value, "angles")?;
    debug!(count = angles.len(), persona = %persona.name, "Angles generated");
    Ok(generated.map(|_| angles))
}

/// Creative director concept for one format.
pub async fn generate_concept(
    text: &dyn TextProvider,
    project: &ProjectContext,
    persona_name: &str,
    angle: &str,
    format: CreativeFormat,
) -> ProviderResult<Generated<Concept>> {
    let request = TextRequest::new(prompts::concept_prompt(project, persona_name, angle, format))
        .with_schema(prompts::concept_schema());
    let generated = text.generate_text(request).await?;
    let concept: Concept = parse_completion(&generated.value, "concept")?;
    Ok(generated.map(|_| concept))
}

/// Copy anchored on the concept's scene.
pub async fn generate_copy(
    text: &dyn TextProvider,
    project: &ProjectContext,
    persona_name: &str,
    concept: &Concept,
) -> ProviderResult<Generated<AdCopy>> {
    let request = TextRequest::new(prompts::copy_prompt(
        project,
        persona_name,
        &concept.visual_scene,
        &concept.congruence_rationale,
        &concept.copy_angle,
    ))
    .with_schema(prompts::copy_schema());
    let generated = text.generate_text(request).await?;
    let draft: CopyDraft = parse_completion(&generated.value, "ad copy")?;
    Ok(generated.map(|_| AdCopy {
        primary_text: draft.primary_text,
        headline: draft.headline,
        cta: draft.cta,
        compliance_notes: None,
    }))
}

/// Policy check; an empty verdict reads as "SAFE".
pub async fn check_compliance(
    text: &dyn TextProvider,
    copy: &AdCopy,
) -> ProviderResult<Generated<String>> {
    let request = TextRequest::new(prompts::compliance_prompt(&copy.headline, &copy.primary_text));
    let generated = text.generate_text(request).await?;
    Ok(generated.map(|verdict| {
        let verdict = verdict.trim();
        if verdict.is_empty() {
            prompts::COMPLIANCE_SAFE.to_string()
        } else {
            verdict.to_string()
        }
    }))
}

/// Plan the five Real Story slides.
pub async fn plan_carousel(
    text: &dyn TextProvider,
    project: &ProjectContext,
    angle: &str,
) -> ProviderResult<Generated<CarouselPlan>> {
    let request = TextRequest::new(prompts::carousel_plan_prompt(project, angle))
        .with_schema(serde_json::json!({ "type": "OBJECT" }));
    let generated = text.generate_text(request).await?;
    let entries: Map<String, Value> = parse_completion(&generated.value, "carousel plan")?;
    Ok(generated.map(|_| CarouselPlan { entries }))
}

/// Extract project fields from page text or an image.
pub async fn extract_context(
    text: &dyn TextProvider,
    request: TextRequest,
) -> ProviderResult<Generated<ContextExtraction>> {
    let generated = text.generate_text(request).await?;
    let extraction: ContextExtraction = parse_completion(&generated.value, "context")?;
    Ok(generated.map(|_| extraction))
}

// ============================================================================
// Visualizer
// ============================================================================

/// Request one image, surfacing provider errors.
pub async fn request_image(
    image: &dyn ImageProvider,
    project: &ProjectContext,
    input: &prompts::ImagePromptInput<'_>,
    aspect_ratio: AspectRatio,
    fallback_style: &str,
) -> ProviderResult<Generated<Option<String>>> {
    let mut parts = vec![PromptPart::Text(prompts::image_prompt(
        project,
        input,
        fallback_style,
    ))];
    if let Some(reference) = project.product_reference_image.as_deref() {
        parts.insert(
            0,
            PromptPart::Image(InlineImage::from_base64("image/png", reference)),
        );
        parts.push(PromptPart::Text(prompts::BRAND_REFERENCE_DIRECTIVE.to_string()));
    }

    image
        .generate_image(ImageRequest {
            parts,
            aspect_ratio,
        })
        .await
}

/// Render one image. Provider failures come back as no image and no tokens.
pub async fn render_image(
    image: &dyn ImageProvider,
    project: &ProjectContext,
    input: &prompts::ImagePromptInput<'_>,
    aspect_ratio: AspectRatio,
    fallback_style: &str,
) -> Generated<Option<String>> {
    match request_image(image, project, input, aspect_ratio, fallback_style).await {
        Ok(generated) => generated,
        Err(e) => {
            warn!(error = %e, format = %input.format.as_str(), "Image generation failed");
            Generated::new(None, 0, 0)
        }
    }
}

/// Rendered carousel slides. Captions are empty unless a plan produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarouselSlides {
    /// Slide images as data URLs.
    pub images: Vec<String>,
    /// Per-slide captions.
    pub captions: Vec<String>,
}

/// Render a carousel. Real Story formats plan five captioned slides first and
/// fall back to the unplanned flow when planning fails.
pub async fn render_carousel(
    text: &dyn TextProvider,
    image: &dyn ImageProvider,
    project: &ProjectContext,
    kind: CarouselKind,
    base: &prompts::ImagePromptInput<'_>,
    fallback_style: &str,
) -> (CarouselSlides, Tally) {
    let mut slides = CarouselSlides::default();
    let mut tally = Tally::default();

    if kind == CarouselKind::RealStory {
        match plan_carousel(text, project, base.angle).await {
            Ok(plan) => {
                tally.record(&plan);
                let count = prompts::carousel_slide_count(kind);
                for slide in 1..=count {
                    let description = plan
                        .value
                        .image(slide)
                        .map(str::to_string)
                        .unwrap_or_else(|| {
                            prompts::real_story_fallback_slide(base.technical_prompt, slide)
                        });
                    slides.captions.push(plan.value.caption(slide).to_string());

                    let input = prompts::ImagePromptInput {
                        technical_prompt: &description,
                        ..*base
                    };
                    let rendered = render_image(
                        image,
                        project,
                        &input,
                        AspectRatio::Square,
                        fallback_style,
                    )
                    .await;
                    tally.record_image(&rendered);
                    slides.images.extend(rendered.value);
                }
                return (slides, tally);
            }
            Err(e) => {
                warn!(error = %e, "Carousel planning failed, using standard slides");
            }
        }
    }

    for slide in 1..=prompts::carousel_slide_count(kind) {
        let prompt =
            prompts::carousel_slide_prompt(kind, slide, base.angle, base.technical_prompt);
        let input = prompts::ImagePromptInput {
            technical_prompt: &prompt,
            ..*base
        };
        let rendered =
            render_image(image, project, &input, AspectRatio::Square, fallback_style).await;
        tally.record_image(&rendered);
        slides.images.extend(rendered.value);
    }
    (slides, tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{MockImageProvider, MockTextProvider};
    use pretty_assertions::assert_eq;

    fn respond(body: &'static str) -> MockTextProvider {
        let mut mock = MockTextProvider::new();
        mock.expect_generate_text()
            .returning(move |_| Ok(Generated::new(body.to_string(), 100, 20)));
        mock
    }

    #[tokio::test]
    async fn test_generate_personas_parses_camel_case() {
        let mock = respond(
            r#"[{"name":"The Skeptic","profile":"Engineer, 29","motivation":"Wants proof","deepFear":"Being fooled"}]"#,
        );
        let result = generate_personas(&mock, &ProjectContext::default())
            .await
            .unwrap();
        assert_eq!(result.input_tokens, 100);
        let profile: PersonaProfile = result.value[0].clone().into();
        assert_eq!(profile.deep_fear.as_deref(), Some("Being fooled"));
    }

    #[tokio::test]
    async fn test_generate_angles_parses_tier() {
        let mock = respond(
            r#"```json
[{"headline":"3pm crash","painPoint":"Afternoon fog","psychologicalTrigger":"Loss Aversion","testingTier":"TIER 2"}]
```"#,
        );
        let persona = PersonaProfile {
            name: "The Skeptic".into(),
            ..Default::default()
        };
        let result = generate_angles(&mock, &ProjectContext::default(), &persona)
            .await
            .unwrap();
        let brief = result.value[0].clone().into_brief(persona);
        assert_eq!(brief.testing_tier, Some(TestingTier::Tier2));
        assert_eq!(brief.persona.name, "The Skeptic");
    }

    #[tokio::test]
    async fn test_generate_personas_rejects_non_array() {
        let mock = respond(r#"{"error":"quota"}"#);
        assert!(generate_personas(&mock, &ProjectContext::default())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_compliance_empty_is_safe() {
        let mock = respond("   ");
        let verdict = check_compliance(&mock, &AdCopy::default()).await.unwrap();
        assert_eq!(verdict.value, "SAFE");
    }

    fn input(format: CreativeFormat) -> prompts::ImagePromptInput<'static> {
        prompts::ImagePromptInput {
            angle: "3pm crash",
            format,
            visual_scene: "Desk at dusk",
            visual_style: "Cinematic",
            technical_prompt: "Tired student slumped over a laptop, warm lamp light",
        }
    }

    #[tokio::test]
    async fn test_render_image_failure_is_empty() {
        let mut image = MockImageProvider::new();
        image.expect_generate_image().returning(|_| {
            Err(crate::error::ProviderError::Api {
                status: 429,
                message: "quota".into(),
            })
        });
        let rendered = render_image(
            &image,
            &ProjectContext::default(),
            &input(CreativeFormat::PovHands),
            AspectRatio::Square,
            "Minimalist",
        )
        .await;
        assert_eq!(rendered, Generated::new(None, 0, 0));
    }

    #[tokio::test]
    async fn test_render_image_puts_reference_first() {
        let mut image = MockImageProvider::new();
        image
            .expect_generate_image()
            .withf(|req| {
                matches!(&req.parts[0], PromptPart::Image(img) if img.data == "QUJD" && img.mime_type == "image/png")
                    && req.parts.len() == 3
                    && req.aspect_ratio == AspectRatio::Portrait
            })
            .returning(|_| Ok(Generated::new(Some("data:image/png;base64,eA==".into()), 5, 1)));
        let project = ProjectContext::default().with_reference_image("data:image/jpeg;base64,QUJD");
        let rendered = render_image(
            &image,
            &project,
            &input(CreativeFormat::PovHands),
            AspectRatio::Portrait,
            "Minimalist",
        )
        .await;
        assert!(rendered.value.is_some());
    }

    #[tokio::test]
    async fn test_real_story_falls_back_to_five_unplanned_slides() {
        let text = respond("not json at all");
        let mut image = MockImageProvider::new();
        image
            .expect_generate_image()
            .times(5)
            .returning(|_| Ok(Generated::new(Some("data:image/png;base64,eA==".into()), 10, 2)));

        let (slides, tally) = render_carousel(
            &text,
            &image,
            &ProjectContext::default(),
            CarouselKind::RealStory,
            &input(CreativeFormat::CarouselRealStory),
            "Minimalist",
        )
        .await;
        assert_eq!(slides.images.len(), 5);
        assert!(slides.captions.is_empty());
        assert_eq!(tally.images, 5);
        assert_eq!(tally.input_tokens, 50);
    }

    #[tokio::test]
    async fn test_real_story_plan_drives_slides() {
        let text = respond(r#"{"image1":"mirror selfie","caption1":"day one","caption3":"still going"}"#);
        let mut image = MockImageProvider::new();
        image
            .expect_generate_image()
            .times(5)
            .returning(|req| {
                let prompt = req.prompt_text();
                let url = prompt.contains("mirror selfie").then(|| "data:image/png;base64,eA==".to_string());
                Ok(Generated::new(url, 1, 1))
            });

        let (slides, tally) = render_carousel(
            &text,
            &image,
            &ProjectContext::default(),
            CarouselKind::RealStory,
            &input(CreativeFormat::CarouselRealStory),
            "Minimalist",
        )
        .await;
        assert_eq!(slides.images.len(), 1);
        assert_eq!(slides.captions, vec!["day one", "", "still going", "", ""]);
        // plan tokens (100/20) plus five renders
        assert_eq!(tally.input_tokens, 105);
        assert_eq!(tally.output_tokens, 25);
        assert_eq!(tally.images, 1);
    }

    #[tokio::test]
    async fn test_educational_carousel_renders_three() {
        let text = MockTextProvider::new();
        let mut image = MockImageProvider::new();
        image
            .expect_generate_image()
            .times(3)
            .returning(|_| Ok(Generated::new(Some("data:image/png;base64,eA==".into()), 0, 0)));

        let (slides, _) = render_carousel(
            &text,
            &image,
            &ProjectContext::default(),
            CarouselKind::Educational,
            &input(CreativeFormat::CarouselEducational),
            "Minimalist",
        )
        .await;
        assert_eq!(slides.images.len(), 3);
    }

    #[tokio::test]
    async fn test_carousel_plan_lookup() {
        let mock = respond(r#"{"idea":"cozy","image1":"mirror selfie","caption1":"day one","image2":""}"#);
        let plan = plan_carousel(&mock, &ProjectContext::default(), "focus")
            .await
            .unwrap()
            .value;
        assert_eq!(plan.image(1), Some("mirror selfie"));
        assert_eq!(plan.image(2), None);
        assert_eq!(plan.caption(1), "day one");
        assert_eq!(plan.caption(5), "");
        assert_eq!(plan.idea(), Some("cozy"));
    }
}
