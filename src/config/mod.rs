use std::env;
use std::str::FromStr;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini credentials and endpoint.
    pub gemini: GeminiConfig,
    /// Model names per role.
    pub models: ModelConfig,
    /// Firecrawl credentials and endpoint.
    pub scrape: ScrapeConfig,
    /// Log level and output format.
    pub logging: LoggingConfig,
    /// HTTP timeout and retry policy.
    pub request: RequestConfig,
    /// Prices used for cost estimates.
    pub pricing: PricingConfig,
    /// Creative batch scheduling.
    pub pipeline: PipelineConfig,
    /// Simulation RNG and busy flag.
    pub simulation: SimulationConfig,
}

/// Gemini API configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key, sent as `x-goog-api-key`.
    pub api_key: String,
    /// Base URL without a trailing slash.
    pub base_url: String,
}

/// Model names per provider role
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Text and structured-output model.
    pub text: String,
    /// Image model.
    pub image: String,
    /// Text-to-speech model.
    pub speech: String,
}

/// Firecrawl scrape configuration
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Optional; URL analysis reports a scrape failure without it.
    pub api_key: Option<String>,
    /// Base URL without a trailing slash.
    pub base_url: String,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    /// Human-readable output.
    Pretty,
    /// One JSON object per line.
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Per-request timeout.
    pub timeout_ms: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base delay, doubled on each retry.
    pub retry_delay_ms: u64,
}

/// Token and image pricing used for cost estimates (USD)
#[derive(Debug, Clone, PartialEq)]
pub struct PricingConfig {
    /// USD per million input tokens.
    pub input_per_million: f64,
    /// USD per million output tokens.
    pub output_per_million: f64,
    /// USD per generated image.
    pub per_image: f64,
}

/// Creative batch scheduling
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Minimum delay between consecutive node starts in a batch.
    pub stagger_ms: u64,
    /// Number of creative nodes allowed in flight at once.
    pub max_concurrency: usize,
    /// Delay before a remix resets a vault node.
    pub remix_delay_ms: u64,
}

/// Simulation engine configuration
#[derive(Debug, Clone, Default)]
pub struct SimulationConfig {
    /// Fixed RNG seed; entropy when absent.
    pub seed: Option<u64>,
    /// How long the busy flag stays up after a tick.
    pub busy_ms: u64,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let gemini = GeminiConfig {
            api_key: env::var("GEMINI_API_KEY")
                .or_else(|_| env::var("API_KEY"))
                .map_err(|_| AppError::Config {
                    message: "GEMINI_API_KEY is required".to_string(),
                })?,
            base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
        };

        let defaults = ModelConfig::default();
        let models = ModelConfig {
            text: env::var("TEXT_MODEL").unwrap_or(defaults.text),
            image: env::var("IMAGE_MODEL").unwrap_or(defaults.image),
            speech: env::var("TTS_MODEL").unwrap_or(defaults.speech),
        };

        let scrape = ScrapeConfig {
            api_key: env::var("FIRECRAWL_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: env::var("FIRECRAWL_BASE_URL")
                .unwrap_or_else(|_| "https://api.firecrawl.dev".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse()
                .unwrap_or(LogFormat::Pretty),
        };

        let request_defaults = RequestConfig::default();
        let request = RequestConfig {
            timeout_ms: env_or("REQUEST_TIMEOUT_MS", request_defaults.timeout_ms),
            max_retries: env_or("MAX_RETRIES", request_defaults.max_retries),
            retry_delay_ms: env_or("RETRY_DELAY_MS", request_defaults.retry_delay_ms),
        };

        let pricing_defaults = PricingConfig::default();
        let pricing = PricingConfig {
            input_per_million: env_or("PRICE_INPUT_PER_MILLION", pricing_defaults.input_per_million),
            output_per_million: env_or(
                "PRICE_OUTPUT_PER_MILLION",
                pricing_defaults.output_per_million,
            ),
            per_image: env_or("PRICE_PER_IMAGE", pricing_defaults.per_image),
        };

        let pipeline_defaults = PipelineConfig::default();
        let pipeline = PipelineConfig {
            stagger_ms: env_or("GENERATION_STAGGER_MS", pipeline_defaults.stagger_ms),
            max_concurrency: env_or("GENERATION_CONCURRENCY", pipeline_defaults.max_concurrency)
                .max(1),
            remix_delay_ms: env_or("REMIX_DELAY_MS", pipeline_defaults.remix_delay_ms),
        };

        let simulation = SimulationConfig {
            seed: env::var("SIMULATION_SEED").ok().and_then(|s| s.parse().ok()),
            busy_ms: env_or("SIMULATION_BUSY_MS", 1500),
        };

        Ok(Config {
            gemini,
            models,
            scrape,
            logging,
            request,
            pricing,
            pipeline,
            simulation,
        })
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            text: "gemini-2.5-flash".to_string(),
            image: "gemini-2.5-flash-image".to_string(),
            speech: "gemini-2.5-flash-preview-tts".to_string(),
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60000,
            max_retries: 2,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            input_per_million: 0.30,
            output_per_million: 2.50,
            per_image: 0.039,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stagger_ms: 800,
            max_concurrency: 1,
            remix_delay_ms: 2000,
        }
    }
}
