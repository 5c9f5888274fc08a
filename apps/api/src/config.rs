use anyhow::{Context, Result};

use crate::github::GITHUB_API_URL;
use crate::llm_client::GEMINI_API_URL;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_api_url: String,
    pub github_api_url: String,
    /// Optional token; unauthenticated GitHub calls are limited to 60 per hour.
    pub github_token: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_api_url: std::env::var("GEMINI_API_URL")
                .unwrap_or_else(|_| GEMINI_API_URL.to_string()),
            github_api_url: std::env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| GITHUB_API_URL.to_string()),
            github_token: std::env::var("GITHUB_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

pub fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
