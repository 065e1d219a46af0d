//! # Campaign Lab
//!
//! An MCP server for visual ad-campaign ideation. A product root expands into
//! personas, personas into marketing angles, and angles into finished ad
//! creatives produced by a chain of model-backed agents. A phased simulation
//! then plays out each creative's performance so winners can be promoted to
//! the Vault and fatigued ones remixed.
//!
//! ## Architecture
//!
//! ```text
//! MCP Client → McpServer (stdio JSON-RPC) → handlers
//!                                              ↓
//!        PipelineCore ── Gemini (text / image / speech), Firecrawl
//!              ↓
//!        MemoryGraph ← SimulationEngine, StageManager, view projections
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use campaign_lab::{AppState, Config, McpServer};
//! use campaign_lab::gemini::GeminiClient;
//! use campaign_lab::pipeline::Providers;
//! use campaign_lab::project::ProjectContext;
//! use campaign_lab::scrape::FirecrawlClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let gemini = Arc::new(GeminiClient::new(&config.gemini, config.models.clone(), config.request.clone())?);
//!     let scraper = Arc::new(FirecrawlClient::new(&config.scrape, &config.request)?);
//!     let providers = Providers { text: gemini.clone(), image: gemini.clone(), speech: gemini, scraper };
//!     let state = Arc::new(AppState::new(config, providers, ProjectContext::default()));
//!     McpServer::new(state).run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Configuration loaded from the environment.
pub mod config;
/// Error types and result aliases.
pub mod error;
/// Creative format catalogue.
pub mod formats;
/// Gemini REST client.
pub mod gemini;
/// Node/edge model and the in-memory graph store.
pub mod graph;
/// Canvas placement rules for new nodes.
pub mod layout;
/// Generation agents and the creative pipeline.
pub mod pipeline;
/// Project context and funnel derivation.
pub mod project;
/// Prompt templates and response schemas.
pub mod prompts;
/// Provider traits the pipeline generates through.
pub mod providers;
/// Landing page scraping.
pub mod scrape;
/// MCP server implementation and request handling.
pub mod server;
/// Phased performance simulation.
pub mod simulation;
/// Vault promotion and remix.
pub mod stage;
/// Lab and Vault projections.
pub mod view;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use server::{AppState, McpServer, SharedState};
