//! Diesel-based video repository for SQLite.

use diesel::prelude::*;
use uuid::Uuid;

use super::diesel_models::{NewVideo, VideoRecord};
use super::diesel_pool::{run_blocking, SqlitePool};
use super::{now_timestamp, parse_datetime, RepositoryError, Result};
use crate::models::{Video, VideoStatus};
use crate::schema::videos;

impl TryFrom<VideoRecord> for Video {
    type Error = RepositoryError;

    fn try_from(record: VideoRecord) -> Result<Self> {
        Ok(Video {
            status: record.status.parse::<VideoStatus>()?,
            id: record.id,
            user_id: record.user_id,
            youtube_id: record.youtube_id,
            title: record.title,
            duration: record.duration,
            thumbnail: record.thumbnail,
            job_id: record.job_id,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        })
    }
}

/// Video metadata applied once it has been fetched.
#[derive(Debug, Clone, Default)]
pub struct VideoDetails {
    pub title: Option<String>,
    pub duration: Option<i32>,
    pub thumbnail: Option<String>,
}

/// Diesel-based video repository with compile-time query checking.
#[derive(Clone)]
pub struct DieselVideoRepository {
    pool: SqlitePool,
}

impl DieselVideoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a pending video for `youtube_id`, optionally owned by a user.
    pub async fn create(&self, youtube_id: &str, user_id: Option<&str>) -> Result<Video> {
        let id = Uuid::new_v4().to_string();
        let youtube_id = youtube_id.to_string();
        let user_id = user_id.map(str::to_string);
        let pool = self.pool.clone();

        let record = run_blocking(pool, move |conn| {
            let now = now_timestamp();
            diesel::insert_into(videos::table)
                .values(&NewVideo {
                    id: &id,
                    user_id: user_id.as_deref(),
                    youtube_id: &youtube_id,
                    title: None,
                    duration: None,
                    thumbnail: None,
                    status: VideoStatus::Pending.as_str(),
                    job_id: None,
                    created_at: &now,
                    updated_at: &now,
                })
                .execute(conn)?;
            videos::table.find(&id).first::<VideoRecord>(conn)
        })
        .await?;

        record.try_into()
    }

    /// Get a video by ID.
    pub async fn get(&self, id: &str) -> Result<Option<Video>> {
        let id = id.to_string();
        let pool = self.pool.clone();

        let record = run_blocking(pool, move |conn| {
            videos::table.find(&id).first::<VideoRecord>(conn).optional()
        })
        .await?;

        record.map(Video::try_from).transpose()
    }

    /// Most recently created video for a YouTube id.
    pub async fn get_by_youtube_id(&self, youtube_id: &str) -> Result<Option<Video>> {
        let youtube_id = youtube_id.to_string();
        let pool = self.pool.clone();

        let record = run_blocking(pool, move |conn| {
            videos::table
                .filter(videos::youtube_id.eq(&youtube_id))
                .order(videos::created_at.desc())
                .first::<VideoRecord>(conn)
                .optional()
        })
        .await?;

        record.map(Video::try_from).transpose()
    }

    /// Count all videos.
    pub async fn count(&self) -> Result<u64> {
        let pool = self.pool.clone();

        let count = run_blocking(pool, move |conn| {
            use diesel::dsl::count_star;
            videos::table.select(count_star()).first::<i64>(conn)
        })
        .await?;

        Ok(count as u64)
    }

    /// Store fetched metadata on a video.
    pub async fn update_details(&self, id: &str, details: VideoDetails) -> Result<bool> {
        let id = id.to_string();
        let pool = self.pool.clone();

        let rows = run_blocking(pool, move |conn| {
            diesel::update(videos::table.find(&id))
                .set((
                    videos::title.eq(details.title),
                    videos::duration.eq(details.duration),
                    videos::thumbnail.eq(details.thumbnail),
                ))
                .execute(conn)
        })
        .await?;

        Ok(rows > 0)
    }

    /// Move a video to a new processing state.
    pub async fn update_status(&self, id: &str, status: VideoStatus) -> Result<bool> {
        let id = id.to_string();
        let pool = self.pool.clone();

        let rows = run_blocking(pool, move |conn| {
            diesel::update(videos::table.find(&id))
                .set(videos::status.eq(status.as_str()))
                .execute(conn)
        })
        .await?;

        Ok(rows > 0)
    }

    /// Record the job currently processing this video.
    pub async fn set_job(&self, id: &str, job_id: Option<&str>) -> Result<bool> {
        let id = id.to_string();
        let job_id = job_id.map(str::to_string);
        let pool = self.pool.clone();

        let rows = run_blocking(pool, move |conn| {
            diesel::update(videos::table.find(&id))
                .set(videos::job_id.eq(job_id))
                .execute(conn)
        })
        .await?;

        Ok(rows > 0)
    }

    /// Delete a video, cascading to its transcripts and summaries.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        let pool = self.pool.clone();

        let rows = run_blocking(pool, move |conn| {
            diesel::delete(videos::table.find(&id)).execute(conn)
        })
        .await?;

        Ok(rows > 0)
    }
}
