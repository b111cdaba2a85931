//! Local SQLite store mirroring the hosted schema.
//!
//! Each table has a Diesel-backed repository. [`Repositories`] opens the
//! pool, applies the embedded migrations and hands out the repositories.

pub mod diesel_job;
pub mod diesel_models;
pub mod diesel_pool;
pub mod diesel_summary;
pub mod diesel_transcript;
pub mod diesel_user;
pub mod diesel_video;
pub mod migrations;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

pub use diesel_job::DieselJobRepository;
pub use diesel_pool::{create_diesel_pool, run_blocking, SqlitePool};
pub use diesel_summary::DieselSummaryRepository;
pub use diesel_transcript::DieselTranscriptRepository;
pub use diesel_user::DieselUserRepository;
pub use diesel_video::DieselVideoRepository;

use crate::models::InvalidValue;

/// Errors raised by the local store.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] diesel_pool::R2D2Error),

    #[error(transparent)]
    InvalidValue(#[from] InvalidValue),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Format a timestamp the way the schema defaults do (`...T..:..:..mmmZ`),
/// so stored values compare correctly as text.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time in storage format.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Parse a stored RFC 3339 timestamp, falling back to now for garbage.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// All repositories over one shared pool.
#[derive(Clone)]
pub struct Repositories {
    pool: SqlitePool,
    pub users: DieselUserRepository,
    pub videos: DieselVideoRepository,
    pub transcripts: DieselTranscriptRepository,
    pub summaries: DieselSummaryRepository,
    pub jobs: DieselJobRepository,
}

impl Repositories {
    /// Open (or create) the store at `db_path` and apply pending migrations.
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = create_diesel_pool(db_path)?;
        let applied = run_blocking(pool.clone(), migrations::run_migrations).await?;
        if applied > 0 {
            tracing::info!("Applied {} migration(s) to {}", applied, db_path.display());
        }

        Ok(Self::new(pool))
    }

    /// Wrap an existing, already migrated pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: DieselUserRepository::new(pool.clone()),
            videos: DieselVideoRepository::new(pool.clone()),
            transcripts: DieselTranscriptRepository::new(pool.clone()),
            summaries: DieselSummaryRepository::new(pool.clone()),
            jobs: DieselJobRepository::new(pool.clone()),
            pool,
        }
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
