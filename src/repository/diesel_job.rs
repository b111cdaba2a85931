//! Diesel-based job repository for SQLite.
//!
//! Job ids are chosen by the caller. Progress is validated through
//! [`Progress`] before it reaches the database; the column CHECK is the
//! second line.

use diesel::prelude::*;

use super::diesel_models::{JobRecord, NewJob};
use super::diesel_pool::{run_blocking, SqlitePool};
use super::{now_timestamp, parse_datetime, RepositoryError, Result};
use crate::models::{Job, JobStatus, Progress};
use crate::schema::jobs;

impl TryFrom<JobRecord> for Job {
    type Error = RepositoryError;

    fn try_from(record: JobRecord) -> Result<Self> {
        let result = match record.result.as_deref() {
            Some(raw) => Some(serde_json::from_str(raw)?),
            None => None,
        };

        Ok(Job {
            status: record.status.parse::<JobStatus>()?,
            progress: Progress::new(record.progress)?,
            result,
            id: record.id,
            video_id: record.video_id,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        })
    }
}

#[derive(Clone)]
pub struct DieselJobRepository {
    pool: SqlitePool,
}

impl DieselJobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a pending job at 0%.
    pub async fn create(&self, id: &str, video_id: Option<&str>) -> Result<Job> {
        let id = id.to_string();
        let video_id = video_id.map(str::to_string);
        let pool = self.pool.clone();

        let record = run_blocking(pool, move |conn| {
            let now = now_timestamp();
            diesel::insert_into(jobs::table)
                .values(&NewJob {
                    id: &id,
                    video_id: video_id.as_deref(),
                    status: JobStatus::Pending.as_str(),
                    progress: Progress::MIN.value(),
                    result: None,
                    created_at: &now,
                    updated_at: &now,
                })
                .execute(conn)?;
            jobs::table.find(&id).first::<JobRecord>(conn)
        })
        .await?;

        record.try_into()
    }

    pub async fn get(&self, id: &str) -> Result<Option<Job>> {
        let id = id.to_string();
        let pool = self.pool.clone();

        let record = run_blocking(pool, move |conn| {
            jobs::table.find(&id).first::<JobRecord>(conn).optional()
        })
        .await?;

        record.map(Job::try_from).transpose()
    }

    /// Jobs in a given state, oldest first.
    pub async fn list_by_status(&self, status: JobStatus) -> Result<Vec<Job>> {
        let pool = self.pool.clone();

        let records = run_blocking(pool, move |conn| {
            jobs::table
                .filter(jobs::status.eq(status.as_str()))
                .order(jobs::created_at.asc())
                .load::<JobRecord>(conn)
        })
        .await?;

        records.into_iter().map(Job::try_from).collect()
    }

    /// Attach the job to a video.
    pub async fn set_video(&self, id: &str, video_id: &str) -> Result<bool> {
        let id = id.to_string();
        let video_id = video_id.to_string();
        let pool = self.pool.clone();

        let rows = run_blocking(pool, move |conn| {
            diesel::update(jobs::table.find(&id))
                .set(jobs::video_id.eq(Some(&video_id)))
                .execute(conn)
        })
        .await?;

        Ok(rows > 0)
    }

    /// Set status and progress together.
    pub async fn update_progress(
        &self,
        id: &str,
        status: JobStatus,
        progress: Progress,
    ) -> Result<bool> {
        let id = id.to_string();
        let pool = self.pool.clone();

        let rows = run_blocking(pool, move |conn| {
            diesel::update(jobs::table.find(&id))
                .set((
                    jobs::status.eq(status.as_str()),
                    jobs::progress.eq(progress.value()),
                ))
                .execute(conn)
        })
        .await?;

        Ok(rows > 0)
    }

    /// Mark the job completed at 100% with its result payload.
    pub async fn complete(&self, id: &str, result: &serde_json::Value) -> Result<bool> {
        self.finish(id, JobStatus::Completed, Some(Progress::MAX), result)
            .await
    }

    /// Mark the job failed, keeping its progress and recording the error.
    pub async fn fail(&self, id: &str, error: &str) -> Result<bool> {
        let result = serde_json::json!({ "error": error });
        self.finish(id, JobStatus::Failed, None, &result).await
    }

    async fn finish(
        &self,
        id: &str,
        status: JobStatus,
        progress: Option<Progress>,
        result: &serde_json::Value,
    ) -> Result<bool> {
        let id = id.to_string();
        let result = serde_json::to_string(result)?;
        let pool = self.pool.clone();

        let rows = run_blocking(pool, move |conn| {
            let target = jobs::table.find(&id);
            match progress {
                Some(progress) => diesel::update(target)
                    .set((
                        jobs::status.eq(status.as_str()),
                        jobs::progress.eq(progress.value()),
                        jobs::result.eq(Some(&result)),
                    ))
                    .execute(conn),
                None => diesel::update(target)
                    .set((
                        jobs::status.eq(status.as_str()),
                        jobs::result.eq(Some(&result)),
                    ))
                    .execute(conn),
            }
        })
        .await?;

        Ok(rows > 0)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        let pool = self.pool.clone();

        let rows = run_blocking(pool, move |conn| {
            diesel::delete(jobs::table.find(&id)).execute(conn)
        })
        .await?;

        Ok(rows > 0)
    }
}
