//! Diesel-based summary repository for SQLite.
//!
//! Keywords are a text array in Postgres and a JSON array here.

use diesel::prelude::*;
use uuid::Uuid;

use super::diesel_models::{NewSummary, SummaryRecord};
use super::diesel_pool::{run_blocking, SqlitePool};
use super::{now_timestamp, parse_datetime, RepositoryError, Result};
use crate::models::Summary;
use crate::schema::summaries;

impl TryFrom<SummaryRecord> for Summary {
    type Error = RepositoryError;

    fn try_from(record: SummaryRecord) -> Result<Self> {
        Ok(Summary {
            keywords: serde_json::from_str(&record.keywords)?,
            id: record.id,
            video_id: record.video_id,
            short_summary: record.short_summary,
            long_summary: record.long_summary,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        })
    }
}

#[derive(Clone)]
pub struct DieselSummaryRepository {
    pool: SqlitePool,
}

impl DieselSummaryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store the summaries and keywords of a video.
    pub async fn create(
        &self,
        video_id: &str,
        short_summary: Option<&str>,
        long_summary: Option<&str>,
        keywords: &[String],
    ) -> Result<Summary> {
        let id = Uuid::new_v4().to_string();
        let video_id = video_id.to_string();
        let short_summary = short_summary.map(str::to_string);
        let long_summary = long_summary.map(str::to_string);
        let keywords = serde_json::to_string(keywords)?;
        let pool = self.pool.clone();

        let record = run_blocking(pool, move |conn| {
            let now = now_timestamp();
            diesel::insert_into(summaries::table)
                .values(&NewSummary {
                    id: &id,
                    video_id: &video_id,
                    short_summary: short_summary.as_deref(),
                    long_summary: long_summary.as_deref(),
                    keywords: &keywords,
                    created_at: &now,
                    updated_at: &now,
                })
                .execute(conn)?;
            summaries::table.find(&id).first::<SummaryRecord>(conn)
        })
        .await?;

        record.try_into()
    }

    pub async fn get(&self, id: &str) -> Result<Option<Summary>> {
        let id = id.to_string();
        let pool = self.pool.clone();

        let record = run_blocking(pool, move |conn| {
            summaries::table
                .find(&id)
                .first::<SummaryRecord>(conn)
                .optional()
        })
        .await?;

        record.map(Summary::try_from).transpose()
    }

    /// Summaries of a video, oldest first.
    pub async fn list_for_video(&self, video_id: &str) -> Result<Vec<Summary>> {
        let video_id = video_id.to_string();
        let pool = self.pool.clone();

        let records = run_blocking(pool, move |conn| {
            summaries::table
                .filter(summaries::video_id.eq(&video_id))
                .order(summaries::created_at.asc())
                .load::<SummaryRecord>(conn)
        })
        .await?;

        records.into_iter().map(Summary::try_from).collect()
    }

    /// Replace the keyword set of a summary.
    pub async fn update_keywords(&self, id: &str, keywords: &[String]) -> Result<bool> {
        let id = id.to_string();
        let keywords = serde_json::to_string(keywords)?;
        let pool = self.pool.clone();

        let rows = run_blocking(pool, move |conn| {
            diesel::update(summaries::table.find(&id))
                .set(summaries::keywords.eq(&keywords))
                .execute(conn)
        })
        .await?;

        Ok(rows > 0)
    }
}
