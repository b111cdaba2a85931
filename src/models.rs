//! Domain models for users, videos, transcripts, summaries and jobs.
//!
//! These mirror the hosted schema. Storage records live in
//! `repository::diesel_models`; the conversions happen in the repositories.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Processing state of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// All values accepted by the `videos.status` column.
    pub const ALL: [VideoStatus; 4] = [
        Self::Pending,
        Self::Processing,
        Self::Completed,
        Self::Failed,
    ];
}

impl FromStr for VideoStatus {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(InvalidValue::new("video status", other)),
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a processing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether the job can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// All values accepted by the `jobs.status` column.
    pub const ALL: [JobStatus; 4] = [Self::Pending, Self::Running, Self::Completed, Self::Failed];
}

impl FromStr for JobStatus {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(InvalidValue::new("job status", other)),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that does not belong to a constrained column domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct InvalidValue {
    pub kind: &'static str,
    pub value: String,
}

impl InvalidValue {
    fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Job progress as a percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Progress(u8);

impl Progress {
    pub const MIN: Progress = Progress(0);
    pub const MAX: Progress = Progress(100);

    pub fn new(value: i32) -> Result<Self, InvalidValue> {
        if (0..=100).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(InvalidValue::new("progress", value.to_string()))
        }
    }

    pub fn value(&self) -> i32 {
        self.0 as i32
    }
}

impl TryFrom<i32> for Progress {
    type Error = InvalidValue;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Progress> for i32 {
    fn from(progress: Progress) -> Self {
        progress.value()
    }
}

/// An application user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A YouTube video tracked by the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub user_id: Option<String>,
    pub youtube_id: String,
    pub title: Option<String>,
    /// Duration in seconds.
    pub duration: Option<i32>,
    pub thumbnail: Option<String>,
    pub status: VideoStatus,
    pub job_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Plain-text transcript of a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub id: String,
    pub video_id: String,
    pub text: String,
    pub language: String,
    pub token_count: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short and long summaries of a video plus its keywords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub id: String,
    pub video_id: String,
    pub short_summary: Option<String>,
    pub long_summary: Option<String>,
    pub keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A tracked unit of video-processing work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// External identifier chosen by the caller.
    pub id: String,
    pub video_id: Option<String>,
    pub status: JobStatus,
    pub progress: Progress,
    pub result: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_through_strings() {
        for status in VideoStatus::ALL {
            assert_eq!(status.as_str().parse::<VideoStatus>().unwrap(), status);
        }
        for status in JobStatus::ALL {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        let err = "done".parse::<JobStatus>().unwrap_err();
        assert_eq!(err.kind, "job status");
        assert!("running".parse::<VideoStatus>().is_err());
        assert!("processing".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_progress_bounds() {
        assert_eq!(Progress::new(0).unwrap(), Progress::MIN);
        assert_eq!(Progress::new(100).unwrap(), Progress::MAX);
        assert_eq!(Progress::new(42).unwrap().value(), 42);
        assert!(Progress::new(-1).is_err());
        assert!(Progress::new(101).is_err());
    }

    #[test]
    fn test_progress_serde_validates() {
        let progress: Progress = serde_json::from_str("55").unwrap();
        assert_eq!(progress.value(), 55);
        assert!(serde_json::from_str::<Progress>("150").is_err());
        assert_eq!(serde_json::to_string(&progress).unwrap(), "55");
    }

    #[test]
    fn test_terminal_job_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }
}
