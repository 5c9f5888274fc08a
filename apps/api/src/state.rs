use std::sync::Arc;

use crate::config::Config;
use crate::github::{GitHubClient, GitHubSource};
use crate::llm_client::{LlmClient, TextGenerator};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Text generation backend. Production: `LlmClient` (Gemini).
    pub llm: Arc<dyn TextGenerator>,
    /// GitHub profile source. Production: `GitHubClient` against the REST API.
    pub github: Arc<dyn GitHubSource>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            llm: Arc::new(
                LlmClient::new(config.gemini_api_key.clone())
                    .with_base_url(config.gemini_api_url.clone()),
            ),
            github: Arc::new(GitHubClient::new(
                config.github_api_url.clone(),
                config.github_token.clone(),
            )),
        }
    }
}
