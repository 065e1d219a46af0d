use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::types::{GenerateContentRequest, GenerateContentResponse};
use crate::config::{GeminiConfig, ModelConfig, RequestConfig};
use crate::error::{ProviderError, ProviderResult};
use crate::providers::{
    Generated, ImageProvider, ImageRequest, PromptPart, SpeechProvider, TextProvider, TextRequest,
};

/// Client for the Gemini `generateContent` API
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    models: ModelConfig,
    request_config: RequestConfig,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(
        config: &GeminiConfig,
        models: ModelConfig,
        request_config: RequestConfig,
    ) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(ProviderError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            models,
            request_config,
        })
    }

    /// Call `generateContent` on a model, retrying with exponential backoff
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> ProviderResult<GenerateContentResponse> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);

        let mut last_error = None;
        let mut retries = 0;

        while retries <= self.request_config.max_retries {
            if retries > 0 {
                let delay = Duration::from_millis(
                    self.request_config.retry_delay_ms * (2_u64.pow(retries - 1)),
                );
                warn!(
                    model = %model,
                    retry = retries,
                    delay_ms = delay.as_millis(),
                    "Retrying Gemini request"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();

            match self.execute_request(&url, model, request).await {
                Ok(response) => {
                    let (input_tokens, output_tokens) = response.token_counts();
                    info!(
                        model = %model,
                        latency_ms = start.elapsed().as_millis(),
                        input_tokens,
                        output_tokens,
                        "Gemini call succeeded"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    error!(
                        model = %model,
                        error = %e,
                        latency_ms = start.elapsed().as_millis(),
                        retry = retries,
                        "Gemini call failed"
                    );
                    last_error = Some(e);
                    retries += 1;
                }
            }
        }

        Err(ProviderError::Unavailable {
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
            retries,
        })
    }

    /// Execute a single request (internal)
    async fn execute_request(
        &self,
        url: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> ProviderResult<GenerateContentResponse> {
        debug!(
            model = %model,
            parts = request.contents.iter().map(|c| c.parts.len()).sum::<usize>(),
            "Calling Gemini"
        );

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        timeout_ms: self.request_config.timeout_ms,
                    }
                } else {
                    ProviderError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Models this client calls
    pub fn models(&self) -> &ModelConfig {
        &self.models
    }
}

#[async_trait]
impl TextProvider for GeminiClient {
    async fn generate_text(&self, request: TextRequest) -> ProviderResult<Generated<String>> {
        let mut body = GenerateContentRequest::from_parts(&request.parts);
        if let Some(schema) = request.response_schema {
            body = body.with_json_schema(schema);
        }

        let response = self.generate_content(&self.models.text, &body).await?;
        let (input_tokens, output_tokens) = response.token_counts();
        Ok(Generated::new(response.text(), input_tokens, output_tokens))
    }
}

#[async_trait]
impl ImageProvider for GeminiClient {
    async fn generate_image(
        &self,
        request: ImageRequest,
    ) -> ProviderResult<Generated<Option<String>>> {
        let body = GenerateContentRequest::from_parts(&request.parts)
            .with_aspect_ratio(request.aspect_ratio);

        let response = self.generate_content(&self.models.image, &body).await?;
        let (input_tokens, output_tokens) = response.token_counts();
        let image = response
            .first_inline_data()
            .map(|data| format!("data:image/png;base64,{}", data.data));

        if image.is_none() {
            warn!(model = %self.models.image, "Image model returned no inline data");
        }
        Ok(Generated::new(image, input_tokens, output_tokens))
    }
}

#[async_trait]
impl SpeechProvider for GeminiClient {
    async fn synthesize(&self, text: &str, voice: &str) -> ProviderResult<String> {
        let body = GenerateContentRequest::from_parts(&[PromptPart::Text(text.to_string())])
            .with_voice(voice);

        let response = self.generate_content(&self.models.speech, &body).await?;
        response
            .first_inline_data()
            .map(|data| data.data.clone())
            .ok_or_else(|| ProviderError::EmptyResponse {
                model: self.models.speech.clone(),
            })
    }
}
