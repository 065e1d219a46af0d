//! Centralized prompt definitions for the generation agents
//!
//! Every agent prompt and response schema lives here so the pipeline only
//! wires inputs to outputs. Schemas use the Gemini `responseSchema` dialect
//! (upper-case type names).

use serde_json::{json, Value};

use crate::formats::{CarouselKind, CreativeFormat};
use crate::project::{MarketAwareness, ProjectContext};

// ============================================================================
// Shared fragments
// ============================================================================

/// Fallback photographic styles, picked at random when a concept has none.
pub const VISUAL_STYLES: [&str; 5] = [
    "Shot on 35mm film, Fujifilm Pro 400H, grainy texture, nostalgic",
    "High-end studio photography, softbox lighting, sharp focus, 8k resolution",
    "Gen-Z aesthetic, flash photography, direct flash, high contrast, candid",
    "Cinematic lighting, golden hour, shallow depth of field, bokeh background",
    "Clean minimalist product photography, bright airy lighting, pastel tones",
];

/// Appended to every image prompt.
pub const VISUAL_ENHANCERS: &str =
    "Photorealistic, 8k resolution, highly detailed, shot on 35mm lens, depth of field, natural lighting.";

/// Sent after the prompt when a product reference image is attached.
pub const BRAND_REFERENCE_DIRECTIVE: &str = "Use the product/subject in the provided image as the reference. Maintain brand colors and visual identity.";

const INDONESIA_CULTURE: &str = " Indonesian aesthetic, Asian features, localized environment.";

const INDONESIA_GRADUATION: &str = " Young Indonesian university student wearing a black graduation toga with university sash/selempang (Indonesian style), holding a tube or bouquet. Authentic Indonesian look (hijab optional but common).";

const SERVICE_KEYWORDS: [&str; 5] = ["studio", "service", "jasa", "photography", "clinic"];

/// Compliance verdict meaning "no issues".
pub const COMPLIANCE_SAFE: &str = "SAFE";

/// Persona name used for Real Story carousel slides.
pub const REAL_STORY_PERSONA: &str = "Gen Z Creator";

/// Maximum landing-page characters sent to the analyst.
pub const LANDING_PAGE_LIMIT: usize = 30_000;

// ============================================================================
// Expansion prompts
// ============================================================================

/// Consumer psychologist prompt producing three identity-driven personas.
pub fn persona_prompt(project: &ProjectContext) -> String {
    let market = if project.target_country.trim().is_empty() {
        "the target market"
    } else {
        project.target_country.as_str()
    };

    format!(
        r#"You are a Consumer Psychologist specializing in {market}.

PRODUCT CONTEXT:
Product: {product}
Details: {details}

TASK:
Define 3 distinct "Avatars" based on their IDENTITY and DEEP PSYCHOLOGICAL NEEDS.
Do not just list demographics. List who they *are* vs who they *want to be* (The Gap).

We are looking for:
1. The Skeptic / Logic Buyer (Identity: "I am smart, I research, I don't get fooled.")
2. The Status / Aspirer (Identity: "I want to be admired/successful/beautiful.")
3. The Anxious / Urgent Solver (Identity: "I need safety/certainty/speed.")

*Cultural nuance mandatory for {country}. If Indonesia, mention specific local behaviors (e.g., 'Kaum Mendang-Mending', 'Social Climber').*"#,
        market = market,
        product = project.product_name,
        details = project.product_description,
        country = project.target_country,
    )
}

/// Schema: array of personas.
pub fn persona_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING" },
                "profile": { "type": "STRING", "description": "Demographics + Identity Statement" },
                "motivation": { "type": "STRING", "description": "The 'Gap' between current self and desired self." },
                "deepFear": { "type": "STRING", "description": "What are they afraid of losing?" }
            },
            "required": ["name", "profile", "motivation"]
        }
    })
}

/// Andromeda-playbook strategist prompt producing three tiered angles.
pub fn angle_prompt(project: &ProjectContext, persona_name: &str, motivation: &str) -> String {
    format!(
        r#"You are a Direct Response Strategist applying the "Andromeda Testing Playbook".

CONTEXT:
Product: {product}
Persona: {persona}
Deep Motivation: {motivation}
Target Country: {country}

TASK:
1. "Gather Data": Brainstorm 10 raw angles/hooks.
2. "Prioritize": Rank by Market Size, Urgency, Differentiation.
3. "Assign Tier": Assign a Testing Tier to each angle based on its nature:
   - TIER 1 (Concept Isolation): Big, bold, new ideas. High risk/reward.
   - TIER 2 (Persona Isolation): Specifically tailored to this persona's fear/desire.
   - TIER 3 (Sprint Isolation): A simple iteration or direct offer.

OUTPUT:
Return ONLY the Top 3 High-Potential Insights.

*For {country}: Ensure the angles fit the local culture.*"#,
        product = project.product_name,
        persona = persona_name,
        motivation = motivation,
        country = project.target_country,
    )
}

/// Schema: array of angles.
pub fn angle_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "headline": { "type": "STRING", "description": "The core Hook/Angle name" },
                "painPoint": { "type": "STRING", "description": "The specific problem or insight" },
                "psychologicalTrigger": { "type": "STRING", "description": "The principle used (e.g. Loss Aversion)" },
                "testingTier": { "type": "STRING", "description": "TIER 1, TIER 2, or TIER 3" },
                "hook": { "type": "STRING", "description": "The opening line or concept" }
            },
            "required": ["headline", "painPoint", "psychologicalTrigger", "testingTier"]
        }
    })
}

// ============================================================================
// Creative agents
// ============================================================================

/// Awareness-specific focus for the creative director.
pub fn awareness_instruction(awareness: MarketAwareness) -> &'static str {
    match awareness {
        MarketAwareness::Unaware | MarketAwareness::ProblemAware => {
            "AWARENESS: LOW. Focus on SYMPTOM. Use Pattern Interrupt."
        }
        MarketAwareness::SolutionAware => {
            "AWARENESS: MEDIUM. Focus on MECHANISM and SOCIAL PROOF."
        }
        MarketAwareness::ProductAware | MarketAwareness::MostAware => {
            "AWARENESS: HIGH. Focus on URGENCY and OFFER."
        }
    }
}

fn format_definitions() -> String {
    CreativeFormat::ALL
        .iter()
        .filter_map(|f| f.definition().map(|d| format!("- {}: {}", f.label(), d)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Creative director prompt: the concept every later stage builds on.
pub fn concept_prompt(
    project: &ProjectContext,
    persona_name: &str,
    angle: &str,
    format: CreativeFormat,
) -> String {
    format!(
        r#"# Role: Creative Director (Focus: Message & Imagery Congruency)

**THE GOLDEN RULE OF CONGRUENCE:**
Ads fail when the image matches the *product* but ignores the *message*.

*   **Bad Example:** Headline: "Stretchiest Jeans ever" -> Image: Sexy model standing still (Fail).
*   **Good Example:** Headline: "Stretchiest Jeans ever" -> Image: Close up of fabric stretching 2x wide (Pass).

**FORMAT DEFINITIONS (Use this to guide the Technical Prompt):**
{definitions}

**INPUTS:**
Product: {product}
Winning Insight (The Message): {angle}
Persona: {persona}
Format: {format}
Context: {country}
{awareness}

**TASK:**
Create a concept where the VISUAL **proves** the HEADLINE.

**OUTPUT REQUIREMENTS (JSON):**

**1. Congruence Rationale:**
Explain WHY this image matches this specific headline. "The headline promises X, so the image shows X happening."

**2. TECHNICAL PROMPT (technicalPrompt):**
A STRICT prompt for the Image Generator.
*   If format is text-heavy (e.g. Twitter, Notes), describe the BACKGROUND VIBE and UI details.
*   If format is visual (e.g. Photography), the SUBJECT ACTION must match the HOOK.

**3. SCRIPT DIRECTION (copyAngle):**
Instructions for the copywriter."#,
        definitions = format_definitions(),
        product = project.product_name,
        angle = angle,
        persona = persona_name,
        format = format.label(),
        country = project.target_country,
        awareness = awareness_instruction(project.market_awareness()),
    )
}

/// Schema: one concept.
pub fn concept_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "visualScene": { "type": "STRING", "description": "Director's Note" },
            "visualStyle": { "type": "STRING", "description": "Aesthetic vibe" },
            "technicalPrompt": { "type": "STRING", "description": "Strict prompt for Image Gen" },
            "copyAngle": { "type": "STRING", "description": "Strategy for the copywriter" },
            "rationale": { "type": "STRING", "description": "Strategic Hypothesis" },
            "congruenceRationale": { "type": "STRING", "description": "Why the Image proves the Text (The Jeans Rule)" },
            "hookComponent": { "type": "STRING", "description": "The Visual Hook element" },
            "bodyComponent": { "type": "STRING", "description": "The Core Argument element" },
            "ctaComponent": { "type": "STRING", "description": "The Call to Action element" }
        },
        "required": ["visualScene", "visualStyle", "technicalPrompt", "copyAngle", "rationale", "congruenceRationale"]
    })
}

fn copy_language(project: &ProjectContext) -> &'static str {
    if project.targets_indonesia() {
        "Write in Bahasa Indonesia. Use 'Bahasa Marketing' (mix of persuasive & conversational). Use local power words (e.g., 'Slot Terbatas', 'Best Seller', 'Gak Nyesel')."
    } else {
        "Write in English (or native language). Use persuasive Direct Response copy."
    }
}

/// Copywriter prompt, anchored on the concept's visual scene.
pub fn copy_prompt(
    project: &ProjectContext,
    persona_name: &str,
    visual_scene: &str,
    congruence_rationale: &str,
    copy_angle: &str,
) -> String {
    format!(
        r#"# Role: Senior Direct Response Copywriter (Static Ad Specialist)

**MANDATORY INSTRUCTION:**
{language}

**THE HEADLINE CONTEXT LIBRARY (RULES):**
1.  **Assume No One Knows You:** Treat the audience as COLD. Do not be vague. "I feel new" (BAD) vs "Bye-Bye Bloating" (GOOD).
2.  **Clear > Clever:** Clarity drives conversions. No puns. No jargon. If they have to think, you lose.
3.  **The "So That" Test (Transformation > Feature):**
    *   Feature: "1000mAh Battery" (Boring).
    *   Transformation: "Listen to music for 48 hours straight" (Winner).
    *   *Rule:* Sell the AFTER state.
4.  **Call Out the Audience/Pain:** Flag down the user immediately.
    *   "For Busy Moms..."
    *   "Knee Pain keeping you up?"
    *   "The last backpack a Digital Nomad will need."
5.  **Scannability:** Under 7 words. High contrast thought.
6.  **Visual Hierarchy:** The headline MUST match the image scene described below.

**STRATEGY CONTEXT:**
Product: {product}
Offer: {offer}
Target: {persona}
Brand Voice: {voice}
Framework: {framework}
Direction: {direction}

**CONGRUENCE CONTEXT (IMAGE SCENE):**
Visual Scene: "{scene}"
Rationale: "{rationale}"

**TASK:**
Write the ad copy applying the rules above.

**OUTPUT:**
1. Primary Text: The main caption. Match the tone to the identity of the persona.
2. Headline: Apply the "So That" test. Max 7 words. MUST be congruent with the Visual Scene.
3. CTA: Clear instruction."#,
        language = copy_language(project),
        product = project.product_name,
        offer = project.offer,
        persona = persona_name,
        voice = project.brand_voice,
        framework = project.copy_framework.label(),
        direction = copy_angle,
        scene = visual_scene,
        rationale = congruence_rationale,
    )
}

/// Schema: primary text, headline and CTA.
pub fn copy_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "primaryText": { "type": "STRING" },
            "headline": { "type": "STRING" },
            "cta": { "type": "STRING" }
        },
        "required": ["primaryText", "headline", "cta"]
    })
}

/// Policy check on finished copy; the model answers "SAFE" when clean.
pub fn compliance_prompt(headline: &str, primary_text: &str) -> String {
    format!(
        "Check this Ad Copy for policy violations. If safe, return \"{}\".\nHeadline: {}\nText: {}",
        COMPLIANCE_SAFE, headline, primary_text
    )
}

// ============================================================================
// Visualizer
// ============================================================================

/// Everything the visualizer prompt depends on.
#[derive(Debug, Clone, Copy)]
pub struct ImagePromptInput<'a> {
    /// Angle headline.
    pub angle: &'a str,
    /// Creative format.
    pub format: CreativeFormat,
    /// Scene from the concept.
    pub visual_scene: &'a str,
    /// Style from the concept; empty means pick one.
    pub visual_style: &'a str,
    /// Technical prompt from the concept.
    pub technical_prompt: &'a str,
}

/// Culture directive for Indonesian targeting, empty otherwise.
pub fn culture_directive(project: &ProjectContext) -> String {
    if !project.targets_indonesia() {
        return String::new();
    }
    let description = project.product_description.to_lowercase();
    let mut directive = INDONESIA_CULTURE.to_string();
    if description.contains("graduation") || description.contains("wisuda") {
        directive.push_str(INDONESIA_GRADUATION);
    }
    directive
}

/// Whether the product reads as a service rather than a physical good.
pub fn is_service(project: &ProjectContext) -> bool {
    let description = project.product_description.to_lowercase();
    SERVICE_KEYWORDS.iter().any(|k| description.contains(k))
}

fn has_technical_prompt(technical_prompt: &str) -> bool {
    technical_prompt.chars().count() > 20
}

/// Assemble the image prompt.
///
/// `fallback_style` is used only when the concept carries no visual style.
pub fn image_prompt(
    project: &ProjectContext,
    input: &ImagePromptInput<'_>,
    fallback_style: &str,
) -> String {
    let culture = culture_directive(project);
    let context = format!(
        "(Context: The image must match this headline: \"{}\").",
        input.angle
    );

    if let Some(template) = input.format.layout_template() {
        let scene = if has_technical_prompt(input.technical_prompt) {
            input.technical_prompt
        } else {
            input.visual_scene
        };
        let filled = template
            .replace("{{angle}}", input.angle)
            .replace("{{productName}}", &project.product_name)
            .replace("{{visualScene}}", scene);
        return format!("{} {} {}", filled, VISUAL_ENHANCERS, culture);
    }

    if input.format.passes_prompt_through() {
        return format!("{}. {} {}", input.technical_prompt, VISUAL_ENHANCERS, culture);
    }

    if has_technical_prompt(input.technical_prompt) {
        format!(
            "{} {}. {} {}",
            context, input.technical_prompt, VISUAL_ENHANCERS, culture
        )
    } else if is_service(project) {
        format!(
            "{} {}. (Show the person experiencing the result/service). {} {}.",
            context, input.visual_scene, culture, VISUAL_ENHANCERS
        )
    } else {
        let style = if input.visual_style.is_empty() {
            fallback_style
        } else {
            input.visual_style
        };
        format!(
            "{} {}. Style: {}. {} {}",
            context, input.visual_scene, style, VISUAL_ENHANCERS, culture
        )
    }
}

/// Number of slides a carousel renders without a plan.
pub fn carousel_slide_count(kind: CarouselKind) -> usize {
    match kind {
        CarouselKind::RealStory => 5,
        CarouselKind::Educational | CarouselKind::Standard => 3,
    }
}

/// Slide prompt for the unplanned carousel flow (1-based `slide`).
pub fn carousel_slide_prompt(
    kind: CarouselKind,
    slide: usize,
    angle: &str,
    technical_prompt: &str,
) -> String {
    match (kind, slide) {
        (CarouselKind::Educational, 1) => format!(
            "Slide 1 (Title Card): Minimalist background with plenty of negative space for text. Visual icon representing the topic: {}.",
            angle
        ),
        (CarouselKind::Educational, 2) => {
            "Slide 2 (The Method): A diagram or clear photo demonstrating the 'How To' aspect of the solution.".to_string()
        }
        (CarouselKind::Educational, 3) => {
            "Slide 3 (Summary): A checklist visual or a final result shot showing success.".to_string()
        }
        (_, 1) => format!(
            "{}. Slide 1: The Hook/Problem. High tension visual.",
            technical_prompt
        ),
        (_, 2) => format!(
            "{}. Slide 2: The Solution/Process. Detailed macro shot.",
            technical_prompt
        ),
        (_, 3) => format!(
            "{}. Slide 3: The Result/CTA. Happy resolution.",
            technical_prompt
        ),
        (_, n) => real_story_fallback_slide(technical_prompt, n),
    }
}

/// Slide description used when a Real Story plan lacks an entry.
pub fn real_story_fallback_slide(technical_prompt: &str, slide: usize) -> String {
    format!("{} - part {}", technical_prompt, slide)
}

/// UGC carousel planner: five image descriptions and captions in one call.
pub fn carousel_plan_prompt(project: &ProjectContext, angle: &str) -> String {
    format!(
        r#"## Role
You are a **UGC Carousel Concept, Caption, and Visual Shot Generator**.
Your responsibility is to create creator-style, Gen-Z-inspired carousels made of **5 cohesive images**, each with a matching caption. Everything should feel cozy, authentic, aesthetic, and subtly tied to the product in a natural way.

## Task Requirements
Inputs:
* Product Name: {product}
* Product Description: {description}
* Key Theme/Angle: {angle}

## Creative Framework (Gen Z Style)
*   **IMAGE 1 (Hook/Face):** Creator moment, 0.5x wide selfie/mirror. Low-res, warm. Caption 1: Hook, personal insight.
*   **IMAGES 2-4 (POV B-roll):** POV/Lifestyle shots (No face). Props: laptop, candle, coffee. Image 4 must have product. Captions 2-4: Relatable thoughts.
*   **IMAGE 5 (Closer):** Soft, comforting aesthetic (No face). Caption 5: Affirming message.

## Caption Style Rules
*   Write all captions in **lowercase**, except Product Name.
*   Tone: casual, friendly, warm, lightly introspective.

## Output Format
Return a **single JSON object**:
{{
  "idea": "Theme description",
  "image1": "Description for image 1",
  "image2": "Description for image 2",
  "image3": "Description for image 3",
  "image4": "Description for image 4",
  "image5": "Description for image 5",
  "caption1": "Caption text for slide 1",
  "caption2": "Caption text for slide 2",
  "caption3": "Caption text for slide 3",
  "caption4": "Caption text for slide 4",
  "caption5": "Caption text for slide 5"
}}"#,
        product = project.product_name,
        description = project.product_description,
        angle = angle,
    )
}

// ============================================================================
// Context analysis
// ============================================================================

/// Data-analyst prompt over scraped landing-page markdown.
pub fn landing_page_prompt(markdown: &str) -> String {
    let raw: String = markdown.chars().take(LANDING_PAGE_LIMIT).collect();
    format!(
        r#"You are a Data Analyst for a Direct Response Agency.
Analyze the following raw data (Landing Page Content) to extract the foundational truths.

RAW DATA:
{}"#,
        raw
    )
}

/// Schema: fields extracted from a landing page.
pub fn landing_page_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "productName": { "type": "STRING" },
            "productDescription": { "type": "STRING", "description": "A punchy, benefit-driven 1-sentence value prop." },
            "targetAudience": { "type": "STRING", "description": "Specific demographics and psychographics." },
            "targetCountry": { "type": "STRING" },
            "brandVoice": { "type": "STRING" },
            "offer": { "type": "STRING", "description": "The primary hook or deal found on the page." }
        },
        "required": ["productName", "productDescription", "targetAudience"]
    })
}

/// Prompt sent with a product image.
pub const IMAGE_ANALYSIS_PROMPT: &str = "Analyze this product image. Extract the Product Name (if visible, otherwise guess), a compelling Description, and the likely Target Audience.";

/// Schema: fields extracted from a product image.
pub fn image_analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "productName": { "type": "STRING" },
            "productDescription": { "type": "STRING" },
            "targetAudience": { "type": "STRING" },
            "targetCountry": { "type": "STRING" }
        },
        "required": ["productName", "productDescription"]
    })
}

// ============================================================================
// Audio
// ============================================================================

/// 15-second UGC script prompt.
pub fn script_prompt(project: &ProjectContext, angle: &str) -> String {
    let language = if project.targets_indonesia() {
        "Bahasa Indonesia (Colloquial/Gaul)"
    } else {
        "English"
    };
    format!(
        "Write a 15-second TikTok/Reels UGC script for: {}. Language: {}. Angle: {}. Keep it under 40 words. Hook the viewer instantly.",
        project.product_name, language, angle
    )
}
