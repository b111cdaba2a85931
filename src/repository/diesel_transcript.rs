//! Diesel-based transcript repository for SQLite.

use diesel::prelude::*;
use uuid::Uuid;

use super::diesel_models::{NewTranscript, TranscriptRecord};
use super::diesel_pool::{run_blocking, SqlitePool};
use super::{now_timestamp, parse_datetime, Result};
use crate::models::Transcript;
use crate::schema::transcripts;

/// Language recorded when the caller does not know better.
pub const DEFAULT_LANGUAGE: &str = "en";

impl From<TranscriptRecord> for Transcript {
    fn from(record: TranscriptRecord) -> Self {
        Transcript {
            id: record.id,
            video_id: record.video_id,
            text: record.text,
            language: record.language,
            token_count: record.token_count,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

#[derive(Clone)]
pub struct DieselTranscriptRepository {
    pool: SqlitePool,
}

impl DieselTranscriptRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a transcript for a video.
    pub async fn create(
        &self,
        video_id: &str,
        text: &str,
        language: &str,
        token_count: Option<i32>,
    ) -> Result<Transcript> {
        let id = Uuid::new_v4().to_string();
        let video_id = video_id.to_string();
        let text = text.to_string();
        let language = language.to_string();
        let pool = self.pool.clone();

        let record = run_blocking(pool, move |conn| {
            let now = now_timestamp();
            diesel::insert_into(transcripts::table)
                .values(&NewTranscript {
                    id: &id,
                    video_id: &video_id,
                    text: &text,
                    language: &language,
                    token_count,
                    created_at: &now,
                    updated_at: &now,
                })
                .execute(conn)?;
            transcripts::table.find(&id).first::<TranscriptRecord>(conn)
        })
        .await?;

        Ok(record.into())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Transcript>> {
        let id = id.to_string();
        let pool = self.pool.clone();

        let record = run_blocking(pool, move |conn| {
            transcripts::table
                .find(&id)
                .first::<TranscriptRecord>(conn)
                .optional()
        })
        .await?;

        Ok(record.map(Transcript::from))
    }

    /// Transcripts of a video, oldest first.
    pub async fn list_for_video(&self, video_id: &str) -> Result<Vec<Transcript>> {
        let video_id = video_id.to_string();
        let pool = self.pool.clone();

        let records = run_blocking(pool, move |conn| {
            transcripts::table
                .filter(transcripts::video_id.eq(&video_id))
                .order(transcripts::created_at.asc())
                .load::<TranscriptRecord>(conn)
        })
        .await?;

        Ok(records.into_iter().map(Transcript::from).collect())
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        let pool = self.pool.clone();

        let rows = run_blocking(pool, move |conn| {
            diesel::delete(transcripts::table.find(&id)).execute(conn)
        })
        .await?;

        Ok(rows > 0)
    }
}
