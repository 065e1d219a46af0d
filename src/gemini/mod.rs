//! Gemini HTTP client implementing the text, image and speech providers.

mod client;
mod types;

pub use client::GeminiClient;
pub use types::*;
