//! Provider contracts for text, image, speech and web scraping.
//!
//! Pipeline code only sees these traits. Every call either returns a payload
//! with its token counts or fails with a [`ProviderError`](crate::error::ProviderError);
//! callers turn failures into node state, never the other way round.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderResult;

/// A provider payload plus the tokens it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated<T> {
    /// Payload.
    pub value: T,
    /// Prompt tokens billed.
    pub input_tokens: u64,
    /// Completion tokens billed.
    pub output_tokens: u64,
}

impl<T> Generated<T> {
    /// Wrap a payload with its token counts.
    pub fn new(value: T, input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            value,
            input_tokens,
            output_tokens,
        }
    }

    /// Map the payload, keeping token counts.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Generated<U> {
        Generated {
            value: f(self.value),
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
        }
    }
}

/// Raw bytes sent alongside a prompt, base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineImage {
    /// Mime type sent to the provider.
    pub mime_type: String,
    /// Base64 data without a data-URL prefix.
    pub data: String,
}

impl InlineImage {
    /// Image from an already-bare base64 string.
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Build from either a bare base64 string or a `data:<mime>;base64,<data>` URL.
    ///
    /// A data URL's own mime type is ignored in favour of `mime_type`.
    pub fn from_base64(mime_type: &str, raw: &str) -> Self {
        let data = match raw.split_once(',') {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => raw,
        };
        Self::new(mime_type, data)
    }
}

/// One piece of a multi-part prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptPart {
    /// Prompt text.
    Text(String),
    /// Inline image.
    Image(InlineImage),
}

/// Text-generation request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextRequest {
    /// Prompt parts in send order.
    pub parts: Vec<PromptPart>,
    /// Declared JSON output schema; when set the model is asked for JSON.
    pub response_schema: Option<Value>,
}

impl TextRequest {
    /// Single-text request.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            parts: vec![PromptPart::Text(prompt.into())],
            response_schema: None,
        }
    }

    /// Ask for JSON matching `schema`.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    /// Put an image before the text parts.
    pub fn with_image(mut self, image: InlineImage) -> Self {
        self.parts.insert(0, PromptPart::Image(image));
        self
    }

    /// Concatenated text parts, for logging.
    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                PromptPart::Text(t) => Some(t.as_str()),
                PromptPart::Image(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Supported output aspect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1, the feed default.
    #[default]
    #[serde(rename = "1:1")]
    Square,
    /// 9:16, stories and reels.
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    /// Wire form, e.g. `9:16`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "9:16",
        }
    }

    /// Anything other than "1:1" means portrait.
    pub fn parse_lenient(raw: &str) -> Self {
        if raw.trim() == "1:1" {
            AspectRatio::Square
        } else {
            AspectRatio::Portrait
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Image-generation request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageRequest {
    /// Prompt parts in send order; a reference image comes first.
    pub parts: Vec<PromptPart>,
    /// Requested output shape.
    pub aspect_ratio: AspectRatio,
}

impl ImageRequest {
    /// Concatenated text parts, for logging.
    pub fn prompt_text(&self) -> String {
        TextRequest {
            parts: self.parts.clone(),
            response_schema: None,
        }
        .prompt_text()
    }
}

/// Text-generation provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate text. An empty completion is returned as an empty string.
    async fn generate_text(&self, request: TextRequest) -> ProviderResult<Generated<String>>;
}

/// Image-generation provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generate at most one image, returned as a `data:` URL.
    async fn generate_image(
        &self,
        request: ImageRequest,
    ) -> ProviderResult<Generated<Option<String>>>;
}

/// Speech-synthesis provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize speech; returns base64 PCM audio.
    async fn synthesize(&self, text: &str, voice: &str) -> ProviderResult<String>;
}

/// Web-scrape provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageScraper: Send + Sync {
    /// Fetch a page as markdown.
    async fn scrape(&self, url: &str) -> ProviderResult<String>;
}
