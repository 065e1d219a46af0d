//! Generation pipeline.
//!
//! This module turns graph nodes into generated children:
//! - [`PipelineCore::expand_personas`] / [`PipelineCore::expand_angles`]: single-call expansion
//! - [`PipelineCore::generate_creatives`]: the multi-stage creative pipeline
//!   (concept → copy → compliance → image → carousel)
//! - [`PipelineCore::regenerate_image`]: image-only rerun from a stored concept
//! - [`PipelineCore::generate_script`] / [`PipelineCore::generate_voiceover`]: audio
//! - [`PipelineCore::analyze_url`] / [`PipelineCore::analyze_image`]: project context extraction
//!
//! All entry points share providers, graph and project via [`PipelineCore`].

mod agents;
mod analysis;
mod audio;
mod core;
mod cost;
mod creative;
mod expansion;

pub use agents::*;
pub use analysis::*;
pub use audio::*;
pub use self::core::*;
pub use cost::*;
pub use creative::*;
pub use expansion::*;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{ProviderError, ProviderResult};

// ============================================================================
// Shared Utilities
// ============================================================================

/// Serialize a value to JSON for logging, with warning on failure.
pub(crate) fn serialize_for_log<T: serde::Serialize>(
    value: &T,
    context: &str,
) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        warn!(
            error = %e,
            context = %context,
            "Failed to serialize value for log"
        );
        serde_json::json!({
            "serialization_error": e.to_string(),
            "context": context
        })
    })
}

/// Extract JSON from a completion string, handling markdown code blocks.
///
/// Tries raw JSON first, then a ```json fenced block, then any fenced block.
pub(crate) fn extract_json_from_completion(completion: &str) -> Result<&str, String> {
    let trimmed = completion.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Ok(trimmed);
    }

    if completion.contains("```json") {
        return completion
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "Found ```json block but content was empty or malformed".to_string());
    }

    if completion.contains("```") {
        return completion
            .split("```")
            .nth(1)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "Found ``` block but content was empty or malformed".to_string());
    }

    Err(format!(
        "No JSON found in response. First 100 chars: '{}'",
        completion.chars().take(100).collect::<String>()
    ))
}

/// Parse a structured completion into `T`.
pub(crate) fn parse_completion<T: DeserializeOwned>(
    completion: &str,
    context: &str,
) -> ProviderResult<T> {
    let json = extract_json_from_completion(completion)
        .map_err(|message| ProviderError::InvalidResponse { message })?;
    serde_json::from_str(json).map_err(|e| ProviderError::InvalidResponse {
        message: format!("Failed to parse {}: {}", context, e),
    })
}
