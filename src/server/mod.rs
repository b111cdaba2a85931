//! HTTP API for the backend.
//!
//! Serves service metadata, a health probe and job status lookups from the
//! local store.

mod handlers;
mod routes;

pub use handlers::ApiError;
pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use crate::config::Settings;
use crate::repository::Repositories;

/// API version reported by `/` and `/info`.
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub repos: Repositories,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let repos = Repositories::open(&settings.database_path()).await?;
        Ok(Self::with_repositories(settings.clone(), repos))
    }

    pub fn with_repositories(settings: Settings, repos: Repositories) -> Self {
        Self {
            settings: Arc::new(settings),
            repos,
        }
    }
}

/// Start the web server and run until Ctrl-C.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings).await?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting YouTube Productivity Backend...");
    info!("Environment: {}", settings.environment);
    info!(
        "Supabase URL: {}",
        settings.supabase_url.as_deref().unwrap_or("Not configured")
    );
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down YouTube Productivity Backend...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
