//! Request handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use super::{AppState, API_VERSION};
use crate::models::Job;
use crate::repository::RepositoryError;

const FEATURES: [&str; 4] = [
    "YouTube video processing",
    "Transcript extraction",
    "AI-powered summarization",
    "Keyword extraction",
];

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Repository(ref e) => {
                tracing::error!("Request failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "YouTube Productivity API",
        version: API_VERSION,
        status: "running",
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub app: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub supabase_configured: bool,
    pub features: [&'static str; 4],
}

pub async fn app_info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        app: "YouTube Productivity Backend",
        version: API_VERSION,
        environment: state.settings.environment.clone(),
        supabase_configured: state.settings.supabase_url.is_some(),
        features: FEATURES,
    })
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    state
        .repos
        .jobs
        .get(&job_id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("job"))
}
