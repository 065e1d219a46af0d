//! Product and strategy context shared by every generation call.
//!
//! There is exactly one [`ProjectContext`] per process. It is held behind a
//! [`ProjectStore`] handle and mutated only through [`ProjectUpdate`] patches
//! or [`ProjectStore::set_market_awareness`], which keeps the funnel stage a
//! pure function of the market-awareness level.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

/// Eugene Schwartz market-awareness levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketAwareness {
    /// No knowledge of the problem.
    Unaware,
    /// Knows the problem, seeks a solution.
    ProblemAware,
    /// Knows solutions, comparing options.
    SolutionAware,
    /// Knows the product, needs a deal.
    ProductAware,
    /// Ready to buy, needs urgency.
    MostAware,
}

impl MarketAwareness {
    /// All levels in ascending order of awareness.
    pub const ALL: [MarketAwareness; 5] = [
        MarketAwareness::Unaware,
        MarketAwareness::ProblemAware,
        MarketAwareness::SolutionAware,
        MarketAwareness::ProductAware,
        MarketAwareness::MostAware,
    ];

    /// Get the awareness level as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketAwareness::Unaware => "UNAWARE",
            MarketAwareness::ProblemAware => "PROBLEM_AWARE",
            MarketAwareness::SolutionAware => "SOLUTION_AWARE",
            MarketAwareness::ProductAware => "PRODUCT_AWARE",
            MarketAwareness::MostAware => "MOST_AWARE",
        }
    }

    /// Human-readable label used in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            MarketAwareness::Unaware => "Unaware (No knowledge of problem)",
            MarketAwareness::ProblemAware => "Problem Aware (Knows problem, seeks solution)",
            MarketAwareness::SolutionAware => "Solution Aware (Knows solutions, comparing options)",
            MarketAwareness::ProductAware => "Product Aware (Knows you, needs a deal)",
            MarketAwareness::MostAware => "Most Aware (Ready to buy, needs urgency)",
        }
    }

    /// The funnel stage implied by this awareness level.
    pub fn funnel_stage(&self) -> FunnelStage {
        match self {
            MarketAwareness::Unaware | MarketAwareness::ProblemAware => FunnelStage::Tof,
            MarketAwareness::SolutionAware => FunnelStage::Mof,
            MarketAwareness::ProductAware | MarketAwareness::MostAware => FunnelStage::Bof,
        }
    }
}

impl std::fmt::Display for MarketAwareness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MarketAwareness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace([' ', '-'], "_").as_str() {
            "UNAWARE" => Ok(MarketAwareness::Unaware),
            "PROBLEM_AWARE" => Ok(MarketAwareness::ProblemAware),
            "SOLUTION_AWARE" => Ok(MarketAwareness::SolutionAware),
            "PRODUCT_AWARE" => Ok(MarketAwareness::ProductAware),
            "MOST_AWARE" => Ok(MarketAwareness::MostAware),
            _ => Err(format!("Unknown market awareness: {}", s)),
        }
    }
}

/// Marketing funnel stage, always derived from [`MarketAwareness`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FunnelStage {
    /// Top of funnel (cold awareness).
    Tof,
    /// Middle of funnel (consideration).
    Mof,
    /// Bottom of funnel (retargeting/conversion).
    Bof,
}

impl FunnelStage {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            FunnelStage::Tof => "Top of Funnel (Cold Awareness)",
            FunnelStage::Mof => "Middle of Funnel (Consideration)",
            FunnelStage::Bof => "Bottom of Funnel (Retargeting/Conversion)",
        }
    }
}

/// Direct-response copy frameworks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CopyFramework {
    /// Problem, agitation, solution.
    Pas,
    /// Attention, interest, desire, action.
    Aida,
    /// Before, after, bridge.
    Bab,
    /// Features, advantages, benefits.
    Fab,
    /// Storytelling.
    Story,
}

impl CopyFramework {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            CopyFramework::Pas => "PAS (Problem, Agitation, Solution)",
            CopyFramework::Aida => "AIDA (Attention, Interest, Desire, Action)",
            CopyFramework::Bab => "BAB (Before, After, Bridge)",
            CopyFramework::Fab => "FAB (Features, Advantages, Benefits)",
            CopyFramework::Story => "Storytelling / Hero's Journey",
        }
    }
}

/// Product and strategy description driving every prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectContext {
    /// Product name.
    pub product_name: String,
    /// What the product is and does.
    pub product_description: String,
    /// Who it is for.
    pub target_audience: String,
    /// Landing page the context was read from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landing_page_url: Option<String>,
    /// Base64 image (raw or data URL) used as a visual reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_reference_image: Option<String>,
    /// Market; Indonesia switches language and culture directives.
    pub target_country: String,
    /// Tone for copy.
    pub brand_voice: String,
    /// Current offer or promotion.
    pub offer: String,
    /// Framework the copywriter follows.
    pub copy_framework: CopyFramework,
    market_awareness: MarketAwareness,
    funnel_stage: FunnelStage,
}

impl Default for ProjectContext {
    fn default() -> Self {
        Self::new(
            "Zenith Focus Gummies",
            "Nootropic gummies for focus and memory without the caffeine crash.",
            "Students, Programmers, and Creatives.",
        )
        .with_country("USA")
        .with_brand_voice("Witty, Smart, but Approachable")
        .with_offer("Buy 2 Get 1 Free")
    }
}

impl ProjectContext {
    /// Create a context with problem-aware, top-of-funnel defaults.
    pub fn new(
        product_name: impl Into<String>,
        product_description: impl Into<String>,
        target_audience: impl Into<String>,
    ) -> Self {
        let awareness = MarketAwareness::ProblemAware;
        Self {
            product_name: product_name.into(),
            product_description: product_description.into(),
            target_audience: target_audience.into(),
            landing_page_url: None,
            product_reference_image: None,
            target_country: "USA".to_string(),
            brand_voice: "Professional".to_string(),
            offer: "Shop Now".to_string(),
            copy_framework: CopyFramework::Pas,
            market_awareness: awareness,
            funnel_stage: awareness.funnel_stage(),
        }
    }

    /// Set the target country
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.target_country = country.into();
        self
    }

    /// Set the brand voice
    pub fn with_brand_voice(mut self, voice: impl Into<String>) -> Self {
        self.brand_voice = voice.into();
        self
    }

    /// Set the offer
    pub fn with_offer(mut self, offer: impl Into<String>) -> Self {
        self.offer = offer.into();
        self
    }

    /// Set the reference image
    pub fn with_reference_image(mut self, image: impl Into<String>) -> Self {
        self.product_reference_image = Some(image.into());
        self
    }

    /// Set the market awareness (funnel stage follows)
    pub fn with_awareness(mut self, awareness: MarketAwareness) -> Self {
        self.set_market_awareness(awareness);
        self
    }

    /// Current awareness level.
    pub fn market_awareness(&self) -> MarketAwareness {
        self.market_awareness
    }

    /// Funnel stage derived from awareness.
    pub fn funnel_stage(&self) -> FunnelStage {
        self.funnel_stage
    }

    /// Change the awareness level and re-derive the funnel stage.
    pub fn set_market_awareness(&mut self, awareness: MarketAwareness) {
        self.market_awareness = awareness;
        self.funnel_stage = awareness.funnel_stage();
    }

    /// True when copy and imagery should be localised for Indonesia.
    pub fn targets_indonesia(&self) -> bool {
        self.target_country.to_lowercase().contains("indonesia")
    }

    /// Apply a partial update. Empty strings are ignored.
    pub fn apply(&mut self, update: ProjectUpdate) {
        fn set(field: &mut String, value: Option<String>) {
            if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
                *field = v;
            }
        }

        set(&mut self.product_name, update.product_name);
        set(&mut self.product_description, update.product_description);
        set(&mut self.target_audience, update.target_audience);
        set(&mut self.target_country, update.target_country);
        set(&mut self.brand_voice, update.brand_voice);
        set(&mut self.offer, update.offer);

        if let Some(url) = update.landing_page_url {
            self.landing_page_url = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(image) = update.product_reference_image {
            self.product_reference_image = Some(image).filter(|i| !i.is_empty());
        }
        if let Some(framework) = update.copy_framework {
            self.copy_framework = framework;
        }
        if let Some(awareness) = update.market_awareness {
            self.set_market_awareness(awareness);
        }
    }
}

/// Partial update of a [`ProjectContext`].
///
/// Has no funnel-stage field: the funnel stage only
/// moves through `market_awareness`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectUpdate {
    /// New product name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_description: Option<String>,
    /// New audience.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
    /// New market.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_country: Option<String>,
    /// New brand voice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_voice: Option<String>,
    /// New offer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer: Option<String>,
    /// New landing page; empty clears it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landing_page_url: Option<String>,
    /// New reference image; empty clears it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_reference_image: Option<String>,
    /// New awareness; moves the funnel stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_awareness: Option<MarketAwareness>,
    /// New copy framework.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy_framework: Option<CopyFramework>,
}

/// Shared handle to the single project context.
#[derive(Clone, Default)]
pub struct ProjectStore {
    inner: Arc<RwLock<ProjectContext>>,
}

impl ProjectStore {
    /// Wrap an initial context.
    pub fn new(project: ProjectContext) -> Self {
        Self {
            inner: Arc::new(RwLock::new(project)),
        }
    }

    /// Snapshot of the current context.
    pub async fn get(&self) -> ProjectContext {
        self.inner.read().await.clone()
    }

    /// Apply a patch and return the resulting context.
    pub async fn update(&self, update: ProjectUpdate) -> ProjectContext {
        let mut project = self.inner.write().await;
        project.apply(update);
        debug!(product = %project.product_name, "Project context updated");
        project.clone()
    }

    /// Set the awareness level, re-deriving the funnel stage.
    pub async fn set_market_awareness(&self, awareness: MarketAwareness) -> ProjectContext {
        let mut project = self.inner.write().await;
        project.set_market_awareness(awareness);
        debug!(
            awareness = %awareness,
            funnel = ?project.funnel_stage(),
            "Market awareness changed"
        );
        project.clone()
    }
}
