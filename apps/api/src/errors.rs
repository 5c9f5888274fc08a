use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::github::GitHubError;
use crate::resume::ExtractError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// The body is `{"error": message, "code": CODE}`; upstream failures add `"details"`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("{message}: {details}")]
    Llm { message: String, details: String },

    #[error("GitHub error: {0}")]
    GitHub(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Wraps a model failure with the user-facing message for the analysis that failed.
    pub fn llm(message: &str, source: impl std::fmt::Display) -> Self {
        AppError::Llm {
            message: message.to_string(),
            details: source.to_string(),
        }
    }
}

impl From<GitHubError> for AppError {
    fn from(e: GitHubError) -> Self {
        match e {
            GitHubError::UserNotFound(_) => AppError::NotFound("GitHub user not found".to_string()),
            other => AppError::GitHub(other.to_string()),
        }
    }
}

impl From<ExtractError> for AppError {
    fn from(e: ExtractError) -> Self {
        AppError::UnprocessableEntity(format!("Could not read the resume: {e}"))
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Validation(format!("Invalid upload: {}", e.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => {
                tracing::warn!("Rejected request: {msg}");
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
            }
            AppError::UnprocessableEntity(msg) => {
                tracing::warn!("Unprocessable request: {msg}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "UNPROCESSABLE_ENTITY",
                    msg.clone(),
                    None,
                )
            }
            AppError::Llm { message, details } => {
                tracing::error!("LLM error: {message}: {details}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    message.clone(),
                    Some(details.clone()),
                )
            }
            AppError::GitHub(msg) => {
                tracing::error!("GitHub error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "GITHUB_ERROR",
                    "GitHub request failed".to_string(),
                    Some(msg.clone()),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(details) = details {
            body["details"] = json!(details);
        }

        (status, Json(body)).into_response()
    }
}
