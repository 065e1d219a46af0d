//! Firecrawl client implementing [`PageScraper`].

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::{RequestConfig, ScrapeConfig};
use crate::error::{ProviderError, ProviderResult};
use crate::providers::PageScraper;

#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'a str; 1],
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Client for the Firecrawl `/v1/scrape` endpoint
#[derive(Clone)]
pub struct FirecrawlClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout_ms: u64,
}

impl FirecrawlClient {
    /// Create a new Firecrawl client. A missing API key is reported on first use.
    pub fn new(config: &ScrapeConfig, request_config: &RequestConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(ProviderError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout_ms: request_config.timeout_ms,
        })
    }

    /// Whether an API key is configured
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl PageScraper for FirecrawlClient {
    async fn scrape(&self, url: &str) -> ProviderResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured {
                message: "FIRECRAWL_API_KEY is not set".to_string(),
            })?;

        let endpoint = format!("{}/v1/scrape", self.base_url);
        debug!(url = %url, "Scraping page");
        let start = Instant::now();

        let response = self
            .client
            .post(&endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&ScrapeRequest {
                url,
                formats: ["markdown"],
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    ProviderError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body: ScrapeErrorBody = response.json().await.unwrap_or_default();
            let reason = body
                .error
                .unwrap_or_else(|| format!("Firecrawl Error: {}", status.as_u16()));
            warn!(url = %url, status = status.as_u16(), reason = %reason, "Scrape rejected");
            return Err(ProviderError::Scrape { reason });
        }

        let body: ScrapeResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse {
                    message: format!("Failed to parse scrape response: {}", e),
                })?;

        match body.data.and_then(|d| d.markdown).filter(|_| body.success) {
            Some(markdown) if !markdown.is_empty() => {
                info!(
                    url = %url,
                    chars = markdown.len(),
                    latency_ms = start.elapsed().as_millis(),
                    "Page scraped"
                );
                Ok(markdown)
            }
            _ => Err(ProviderError::Scrape {
                reason: "No markdown returned from Firecrawl".to_string(),
            }),
        }
    }
}
