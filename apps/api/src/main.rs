use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use analyzer_api::config::Config;
use analyzer_api::github::GITHUB_API_URL;
use analyzer_api::llm_client::{self, GEMINI_API_URL};
use analyzer_api::routes::build_router;
use analyzer_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("analyzer_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Analyzer API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM and GitHub clients
    let state = AppState::from_config(&config);
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    if config.gemini_api_url != GEMINI_API_URL {
        info!("Gemini API override: {}", config.gemini_api_url);
    }
    if config.github_api_url != GITHUB_API_URL {
        info!("GitHub API override: {}", config.github_api_url);
    }
    if config.github_token.is_none() {
        info!("GITHUB_TOKEN not set; GitHub requests are unauthenticated");
    }

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the deployed client URL

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
