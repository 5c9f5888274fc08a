pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

/// Resume uploads may exceed axum's 2 MiB default body limit.
pub const RESUME_UPLOAD_LIMIT: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        // Analysis API
        .route(
            "/api/analyze-github",
            post(handlers::handle_analyze_github),
        )
        .route(
            "/api/analyze-leetcode",
            post(handlers::handle_analyze_leetcode),
        )
        .route(
            "/api/analyze-resume",
            post(handlers::handle_analyze_resume).layer(DefaultBodyLimit::max(RESUME_UPLOAD_LIMIT)),
        )
        .with_state(state)
}
