//! Shared handler state and operational endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use storefront_core::config::QuizConfig;
use storefront_quiz::SessionStore;
use storefront_targeting::AudienceResolver;

use crate::content::ContentDirectory;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub content: Arc<ContentDirectory>,
    pub resolver: AudienceResolver,
    pub quiz: Arc<QuizConfig>,
    pub site_id: String,
    pub start_time: Instant,
}

/// GET /health — Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        site_id: state.site_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.sessions.len(),
    })
}

/// GET /ready — Readiness probe. Ready once a non-empty catalog is loaded.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.sessions.catalog().is_empty() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

/// GET /live — Liveness probe.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub site_id: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
}
