//! GitHub client. Fetches the public profile and repositories that feed the GitHub analysis.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const GITHUB_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("analyzer-api/", env!("CARGO_PKG_VERSION"));
const REPOS_PER_PAGE: u32 = 100;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub user not found: {0}")]
    UserNotFound(String),

    #[error("GitHub API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubProfile {
    pub login: String,
    pub name: Option<String>,
    #[serde(default)]
    pub public_repos: u32,
    #[serde(default)]
    pub followers: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubData {
    pub profile: GitHubProfile,
    pub repos: Vec<GitHubRepo>,
}

/// Source of GitHub profile data. Carried in `AppState` as `Arc<dyn GitHubSource>`.
#[async_trait]
pub trait GitHubSource: Send + Sync {
    async fn fetch(&self, username: &str) -> Result<GitHubData, GitHubError>;
}

/// Extracts a bare username from user input: `torvalds`, `https://github.com/torvalds/`, ...
/// Returns `None` when nothing is left.
pub fn normalize_username(input: &str) -> Option<String> {
    let mut name = input.trim();
    for prefix in ["https://github.com/", "http://github.com/", "github.com/"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            name = rest;
            break;
        }
    }
    let name = name.strip_suffix('/').unwrap_or(name).trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// GitHub logins are alphanumerics and single hyphens, at most 39 characters.
pub fn is_valid_username(name: &str) -> bool {
    name.len() <= 39
        && !name.starts_with('-')
        && !name.ends_with('-')
        && !name.contains("--")
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        username: &str,
    ) -> Result<T, GitHubError> {
        let mut request = self
            .client
            .get(url)
            .header("accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GitHubError::UserNotFound(username.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GitHubError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl GitHubSource for GitHubClient {
    async fn fetch(&self, username: &str) -> Result<GitHubData, GitHubError> {
        let profile_url = format!("{}/users/{}", self.base_url, username);
        let profile: GitHubProfile = self.get_json(&profile_url, username).await?;

        let repos_url = format!(
            "{}/users/{}/repos?per_page={}",
            self.base_url, username, REPOS_PER_PAGE
        );
        let repos: Vec<GitHubRepo> = self.get_json(&repos_url, username).await?;

        debug!(
            "Fetched GitHub data for {}: {} repos",
            profile.login,
            repos.len()
        );
        Ok(GitHubData { profile, repos })
    }
}
