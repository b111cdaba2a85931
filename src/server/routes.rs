//! Route configuration.

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/info", get(handlers::app_info))
        .route("/jobs/:job_id", get(handlers::get_job))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::repository::Repositories;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn test_state(dir: &std::path::Path) -> AppState {
        let repos = Repositories::open(&dir.join("ytprod.db")).await.unwrap();
        let settings = Settings {
            supabase_url: Some("https://abc.supabase.co".to_string()),
            environment: "test".to_string(),
            ..Settings::default()
        };
        AppState::with_repositories(settings, repos)
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(test_state(dir.path()).await);

        let (status, body) = get_json(router.clone(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "YouTube Productivity API");
        assert_eq!(body["status"], "running");

        let (status, body) = get_json(router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_info() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(test_state(dir.path()).await);

        let (status, body) = get_json(router, "/info").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["environment"], "test");
        assert_eq!(body["supabase_configured"], true);
        assert_eq!(body["features"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_job_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        state.repos.jobs.create("job-42", None).await.unwrap();
        let router = create_router(state);

        let (status, body) = get_json(router.clone(), "/jobs/job-42").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "job-42");
        assert_eq!(body["status"], "pending");
        assert_eq!(body["progress"], 0);

        let (status, body) = get_json(router, "/jobs/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({ "error": "job not found" }));
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(test_state(dir.path()).await);

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("origin", "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );
    }
}
