//! Axum route handlers for the Analysis API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::info;

use crate::analysis::postprocess::{bulletize, extract_score, strip_score, AtsScore};
use crate::analysis::prompts::{
    build_github_prompt, build_leetcode_prompt, build_resume_prompt, RESUME_EXCERPT_CHARS,
};
use crate::errors::AppError;
use crate::github::{is_valid_username, normalize_username};
use crate::render::{render_html, render_markdown};
use crate::resume::{excerpt, extract_text, ResumeFormat};
use crate::sections::{parse, Section};
use crate::state::AppState;

/// Multipart field carrying the uploaded resume.
pub const RESUME_FIELD: &str = "resume";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GitHubAnalysisRequest {
    #[serde(rename = "githubProfile", default)]
    pub github_profile: Option<String>,
}

/// LeetCode stats as posted by the browser form: counts may arrive as numbers or strings.
#[derive(Debug, Deserialize)]
pub struct LeetCodeAnalysisRequest {
    #[serde(default, deserialize_with = "lenient_count")]
    pub total: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub easy: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub medium: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub hard: u32,
    #[serde(default, deserialize_with = "lenient_categories")]
    pub categories: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    /// Raw model output, unmodified.
    pub suggestion: String,
    /// Markdown cleaned up for display.
    pub formatted: String,
    pub sections: Vec<Section>,
    pub html: String,
}

impl AnalysisResponse {
    fn new(suggestion: String, formatted: String) -> Self {
        let sections = parse(&suggestion);
        let html = render_html(&sections);
        Self {
            suggestion,
            formatted,
            sections,
            html,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResumeAnalysisResponse {
    #[serde(flatten)]
    pub analysis: AnalysisResponse,
    pub ats_score: Option<AtsScore>,
}

struct ResumeUpload {
    file_name: String,
    bytes: Bytes,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/analyze-github
///
/// Fetches the profile and repositories, then asks the model for repository notes and tips.
pub async fn handle_analyze_github(
    State(state): State<AppState>,
    Json(request): Json<GitHubAnalysisRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let username = request
        .github_profile
        .as_deref()
        .and_then(normalize_username)
        .ok_or_else(|| AppError::Validation("No GitHub username provided.".to_string()))?;
    if !is_valid_username(&username) {
        return Err(AppError::Validation("Invalid GitHub username.".to_string()));
    }

    info!("GitHub analysis requested for {username}");
    let data = state.github.fetch(&username).await?;

    let prompt = build_github_prompt(&data);
    let suggestion = state
        .llm
        .generate(&prompt)
        .await
        .map_err(|e| AppError::llm("Gemini GitHub analysis failed", e))?;

    let formatted = render_markdown(&parse(&suggestion));
    Ok(Json(AnalysisResponse::new(suggestion, formatted)))
}

/// POST /api/analyze-leetcode
///
/// Rejects stats whose difficulty split does not add up to the total.
pub async fn handle_analyze_leetcode(
    State(state): State<AppState>,
    Json(request): Json<LeetCodeAnalysisRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let LeetCodeAnalysisRequest {
        total,
        easy,
        medium,
        hard,
        categories,
    } = request;

    let split = u64::from(easy) + u64::from(medium) + u64::from(hard);
    if split != u64::from(total) {
        return Err(AppError::Validation(
            "The sum of Easy, Medium, and Hard must equal the Total questions solved.".to_string(),
        ));
    }

    info!(
        "LeetCode analysis requested: {total} solved, {} categories",
        categories.len()
    );
    let prompt = build_leetcode_prompt(total, easy, medium, hard, &categories);
    let suggestion = state
        .llm
        .generate(&prompt)
        .await
        .map_err(|e| AppError::llm("Gemini LeetCode analysis failed", e))?;

    let formatted = bulletize(&suggestion);
    Ok(Json(AnalysisResponse::new(suggestion, formatted)))
}

/// POST /api/analyze-resume
///
/// Multipart upload with a `resume` field (PDF or DOCX). Returns the review plus the
/// ATS score found in it, if any.
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ResumeAnalysisResponse>, AppError> {
    let upload = read_resume_field(&mut multipart)
        .await?
        .ok_or_else(|| AppError::Validation("No resume file uploaded.".to_string()))?;

    let format = ResumeFormat::from_file_name(&upload.file_name).ok_or_else(|| {
        AppError::Validation("Unsupported file type. Please upload a PDF or DOCX.".to_string())
    })?;

    info!(
        "Resume analysis requested: {} ({:?}, {} bytes)",
        upload.file_name,
        format,
        upload.bytes.len()
    );

    let bytes = upload.bytes;
    let text = tokio::task::spawn_blocking(move || extract_text(format, &bytes))
        .await
        .map_err(|e| {
            if e.is_panic() {
                AppError::UnprocessableEntity("Could not read the resume".to_string())
            } else {
                AppError::Internal(anyhow::anyhow!("resume extraction task failed: {e}"))
            }
        })??;

    let prompt = build_resume_prompt(excerpt(&text, RESUME_EXCERPT_CHARS));
    let suggestion = state
        .llm
        .generate(&prompt)
        .await
        .map_err(|e| AppError::llm("Resume analysis failed", e))?;

    let ats_score = extract_score(&suggestion);
    let formatted = bulletize(&strip_score(&suggestion));
    Ok(Json(ResumeAnalysisResponse {
        analysis: AnalysisResponse::new(suggestion, formatted),
        ats_score,
    }))
}

/// Returns the first non-empty `resume` part. Other fields are skipped.
async fn read_resume_field(multipart: &mut Multipart) -> Result<Option<ResumeUpload>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        if file_name.is_empty() && bytes.is_empty() {
            continue;
        }
        return Ok(Some(ResumeUpload { file_name, bytes }));
    }
    Ok(None)
}

// ────────────────────────────────────────────────────────────────────────────
// Lenient form decoding
// ────────────────────────────────────────────────────────────────────────────

/// Numbers, numeric strings (`"12"`, `" 12 problems"`) or null; anything unreadable is 0.
/// Counts beyond `u32::MAX` saturate, whether sent as a number or a string.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX)),
        Some(Value::String(s)) => leading_int(&s),
        _ => 0,
    })
}

fn leading_int(s: &str) -> u32 {
    let digits: String = s
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(u32::MAX)
}

/// A JSON array of strings, or one comma-separated string.
fn lenient_categories<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    let categories = match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    };
    Ok(categories)
}
