use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use campaign_lab::{
    config::{Config, LogFormat},
    gemini::GeminiClient,
    pipeline::Providers,
    project::ProjectContext,
    scrape::FirecrawlClient,
    server::{AppState, McpServer},
};

/// Campaign Lab MCP server over stdio.
#[derive(Parser, Debug)]
#[command(name = "campaign-lab", version, about)]
struct Cli {
    /// Seed the performance simulation for reproducible runs
    #[arg(long, env = "SIMULATION_SEED")]
    seed: Option<u64>,

    /// Log output format: pretty or json
    #[arg(long, env = "LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if cli.seed.is_some() {
        config.simulation.seed = cli.seed;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        seed = ?config.simulation.seed,
        "Campaign Lab starting..."
    );

    let gemini = match GeminiClient::new(
        &config.gemini,
        config.models.clone(),
        config.request.clone(),
    ) {
        Ok(c) => {
            info!(base_url = %config.gemini.base_url, text_model = %config.models.text, "Gemini client initialized");
            Arc::new(c)
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize Gemini client");
            return Err(e.into());
        }
    };

    if config.scrape.api_key.is_none() {
        warn!("FIRECRAWL_API_KEY not set, landing page analysis is disabled");
    }
    let scraper = Arc::new(FirecrawlClient::new(&config.scrape, &config.request)?);

    let providers = Providers {
        text: gemini.clone(),
        image: gemini.clone(),
        speech: gemini,
        scraper,
    };

    let state = Arc::new(AppState::new(config, providers, ProjectContext::default()));
    let server = McpServer::new(state);

    info!("Server ready, waiting for requests on stdin...");

    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
