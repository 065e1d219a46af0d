//! Project context extraction from a landing page or a product photo.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{extract_context, serialize_for_log, ContextExtraction, PipelineCore};
use crate::error::{AppResult, ToolError};
use crate::graph::{GraphStore, NodeKind};
use crate::project::{ProjectContext, ProjectUpdate};
use crate::prompts;
use crate::providers::{InlineImage, TextRequest};

/// Shown when the page could not be scraped.
pub const SCRAPE_FAILED: &str = "Failed to read the website. Please enter details manually.";
/// Shown when the scraped page could not be analyzed.
pub const URL_ANALYSIS_FAILED: &str = "Analysis failed. Please check the URL and try again.";
/// Shown when image analysis fails.
pub const IMAGE_ANALYSIS_FAILED: &str = "Could not analyze image. Try a clearer product shot.";

/// Fallbacks for fields the model left out.
struct Defaults {
    product_name: &'static str,
    product_description: &'static str,
    target_audience: &'static str,
}

const LANDING_PAGE_DEFAULTS: Defaults = Defaults {
    product_name: "Unknown Product",
    product_description: "",
    target_audience: "General Audience",
};

const IMAGE_DEFAULTS: Defaults = Defaults {
    product_name: "Analyzed Product",
    product_description: "A revolutionary product.",
    target_audience: "General Audience",
};

/// Extracted fields with defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedContext {
    /// Product name, "Unknown Product" when missing.
    pub product_name: String,
    /// Description.
    pub product_description: String,
    /// Audience, "General Audience" when missing.
    pub target_audience: String,
    /// Applied to the project only when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_country: Option<String>,
    /// Reported, not applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_voice: Option<String>,
    /// Reported, not applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer: Option<String>,
}

impl ExtractedContext {
    fn resolve(raw: ContextExtraction, defaults: &Defaults) -> Self {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }
        Self {
            product_name: present(raw.product_name)
                .unwrap_or_else(|| defaults.product_name.to_string()),
            product_description: present(raw.product_description)
                .unwrap_or_else(|| defaults.product_description.to_string()),
            target_audience: present(raw.target_audience)
                .unwrap_or_else(|| defaults.target_audience.to_string()),
            target_country: present(raw.target_country),
            brand_voice: present(raw.brand_voice),
            offer: present(raw.offer),
        }
    }

    fn to_update(&self) -> ProjectUpdate {
        ProjectUpdate {
            product_name: Some(self.product_name.clone()),
            product_description: Some(self.product_description.clone()),
            target_audience: Some(self.target_audience.clone()),
            target_country: self.target_country.clone(),
            ..Default::default()
        }
    }
}

/// Result of an analysis flow.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// What the model extracted.
    pub extracted: ExtractedContext,
    /// Project after the update.
    pub project: ProjectContext,
}

impl PipelineCore {
    /// Scrape a landing page and derive the project context from it.
    pub async fn analyze_url(&self, url: &str) -> AppResult<AnalysisReport> {
        let markdown = self.scraper().scrape(url).await.map_err(|e| {
            warn!(url = %url, error = %e, "Landing page scrape failed");
            ToolError::Analysis {
                message: SCRAPE_FAILED.to_string(),
            }
        })?;

        let request = TextRequest::new(prompts::landing_page_prompt(&markdown))
            .with_schema(prompts::landing_page_schema());
        let raw = extract_context(self.text(), request).await.map_err(|e| {
            warn!(url = %url, error = %e, "Landing page analysis failed");
            ToolError::Analysis {
                message: URL_ANALYSIS_FAILED.to_string(),
            }
        })?;

        let extracted = ExtractedContext::resolve(raw.value, &LANDING_PAGE_DEFAULTS);
        let mut update = extracted.to_update();
        update.landing_page_url = Some(url.to_string());

        let project = self.apply_analysis(&extracted, update).await?;
        info!(url = %url, product = %extracted.product_name, "Landing page analyzed");
        Ok(AnalysisReport { extracted, project })
    }

    /// Derive the project context from a product photo (bare base64 or data URL).
    pub async fn analyze_image(&self, image_base64: &str) -> AppResult<AnalysisReport> {
        let request = TextRequest::new(prompts::IMAGE_ANALYSIS_PROMPT)
            .with_image(InlineImage::from_base64("image/jpeg", image_base64))
            .with_schema(prompts::image_analysis_schema());
        let raw = extract_context(self.text(), request).await.map_err(|e| {
            warn!(error = %e, "Image analysis failed");
            ToolError::Analysis {
                message: IMAGE_ANALYSIS_FAILED.to_string(),
            }
        })?;

        let extracted = ExtractedContext::resolve(raw.value, &IMAGE_DEFAULTS);
        let project = self.apply_analysis(&extracted, extracted.to_update()).await?;
        info!(product = %extracted.product_name, "Product image analyzed");
        Ok(AnalysisReport { extracted, project })
    }

    /// Update the project and mirror name/description onto the root node.
    async fn apply_analysis(
        &self,
        extracted: &ExtractedContext,
        update: ProjectUpdate,
    ) -> AppResult<ProjectContext> {
        debug!(
            extracted = %serialize_for_log(extracted, "extracted context"),
            "Applying analysis to project"
        );
        let project = self.project().update(update).await;

        let roots: Vec<String> = self
            .graph()
            .list_nodes()
            .await
            .into_iter()
            .filter(|n| n.kind() == NodeKind::Root)
            .map(|n| n.id)
            .collect();
        for root_id in roots {
            let title = extracted.product_name.clone();
            let description = extracted.product_description.clone();
            self.graph()
                .modify(&root_id, move |node| {
                    node.title = title;
                    node.description = description;
                })
                .await?;
        }
        Ok(project)
    }
}
