//! Video processing service.
//!
//! Runs one URL through the worker and the summarizer while keeping the
//! job and video rows in the local store up to date.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{JobStatus, Progress, VideoStatus};
use crate::repository::diesel_transcript::DEFAULT_LANGUAGE;
use crate::repository::diesel_video::VideoDetails;
use crate::repository::{Repositories, RepositoryError};
use crate::summarizer::{estimate_tokens, SummarizationResult, SummarizeError, Summarizer};
use crate::worker::{
    extract_video_id, process_youtube_video, JobWorkspace, TranscriptSource, VideoSource,
    WorkerError,
};

/// Progress checkpoints reported while a job runs.
pub const PROGRESS_STARTED: u8 = 10;
pub const PROGRESS_TRANSCRIBED: u8 = 40;
pub const PROGRESS_SUMMARIZED: u8 = 70;

/// Errors that end a processing job.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Could not extract video ID from URL: {0}")]
    InvalidUrl(String),

    #[error("no transcript text available: video has no subtitles and audio transcription is not supported")]
    NoTranscript,

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error("summarization failed: {0}")]
    Summarize(#[from] SummarizeError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Identifiers and output of a completed job.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingOutcome {
    pub job_id: String,
    pub video_id: String,
    pub youtube_id: String,
    pub title: String,
    pub transcript_id: String,
    pub summary_id: String,
    pub transcript_source: TranscriptSource,
    #[serde(flatten)]
    pub summary: SummarizationResult,
}

/// What a job has created so far, for failure handling and cleanup.
#[derive(Default)]
struct JobState {
    video_id: Option<String>,
    workspace: Option<JobWorkspace>,
}

/// Ties the worker, the summarizer and the local store together.
pub struct ProcessingService {
    repos: Repositories,
    source: Arc<dyn VideoSource>,
    summarizer: Summarizer,
    work_dir: PathBuf,
    keep_files: bool,
}

impl ProcessingService {
    pub fn new(
        repos: Repositories,
        source: Arc<dyn VideoSource>,
        summarizer: Summarizer,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            repos,
            source,
            summarizer,
            work_dir,
            keep_files: false,
        }
    }

    /// Keep the job workspace on disk after the job ends.
    pub fn with_keep_files(mut self, keep_files: bool) -> Self {
        self.keep_files = keep_files;
        self
    }

    /// Process `url` as a new job.
    ///
    /// The job is recorded before any work starts. On error the job is
    /// marked failed with `{"error": <message>}` and its video, if one was
    /// linked, is marked failed too.
    pub async fn process(
        &self,
        url: &str,
        user_id: Option<&str>,
    ) -> Result<ProcessingOutcome, ProcessingError> {
        let job_id = Uuid::new_v4().to_string();
        self.repos.jobs.create(&job_id, None).await?;
        info!("Created job {} for {}", job_id, url);

        let mut state = JobState::default();
        let result = self.run(&job_id, url, user_id, &mut state).await;

        if let Err(ref e) = result {
            error!("Job {} failed: {}", job_id, e);
            if let Err(db_err) = self.record_failure(&job_id, state.video_id.as_deref(), e).await {
                warn!("Could not record failure of job {}: {}", job_id, db_err);
            }
        }

        if let Some(workspace) = state.workspace {
            if !self.keep_files {
                workspace.cleanup();
            }
        }
        result
    }

    async fn run(
        &self,
        job_id: &str,
        url: &str,
        user_id: Option<&str>,
        state: &mut JobState,
    ) -> Result<ProcessingOutcome, ProcessingError> {
        let youtube_id =
            extract_video_id(url).ok_or_else(|| ProcessingError::InvalidUrl(url.to_string()))?;

        let video = match self.repos.videos.get_by_youtube_id(&youtube_id).await? {
            Some(existing) => existing,
            None => self.repos.videos.create(&youtube_id, user_id).await?,
        };
        state.video_id = Some(video.id.clone());
        self.repos.videos.set_job(&video.id, Some(job_id)).await?;
        self.repos.jobs.set_video(job_id, &video.id).await?;

        self.set_progress(job_id, PROGRESS_STARTED).await?;
        self.repos
            .videos
            .update_status(&video.id, VideoStatus::Processing)
            .await?;

        let workspace = state
            .workspace
            .insert(JobWorkspace::create(&self.work_dir, job_id)?);
        let processed = process_youtube_video(self.source.as_ref(), workspace, url).await?;
        self.repos
            .videos
            .update_details(
                &video.id,
                VideoDetails {
                    title: Some(processed.metadata.title.clone()),
                    duration: i32::try_from(processed.metadata.duration).ok(),
                    thumbnail: Some(processed.metadata.thumbnail.clone())
                        .filter(|t| !t.is_empty()),
                },
            )
            .await?;

        let text = processed
            .transcript_text
            .filter(|t| !t.trim().is_empty())
            .ok_or(ProcessingError::NoTranscript)?;
        let token_count = i32::try_from(estimate_tokens(&text)).ok();
        let transcript = self
            .repos
            .transcripts
            .create(&video.id, &text, DEFAULT_LANGUAGE, token_count)
            .await?;
        self.set_progress(job_id, PROGRESS_TRANSCRIBED).await?;

        let summary = self.summarizer.process_text(&text, true).await?;
        self.set_progress(job_id, PROGRESS_SUMMARIZED).await?;

        let summary_row = self
            .repos
            .summaries
            .create(
                &video.id,
                Some(summary.short_summary.as_str()),
                Some(summary.long_summary.as_str()),
                &summary.keywords,
            )
            .await?;

        let outcome = ProcessingOutcome {
            job_id: job_id.to_string(),
            video_id: video.id.clone(),
            youtube_id,
            title: processed.metadata.title,
            transcript_id: transcript.id,
            summary_id: summary_row.id,
            transcript_source: processed.transcript_source,
            summary,
        };
        let result = serde_json::to_value(&outcome).map_err(RepositoryError::from)?;
        self.repos.jobs.complete(job_id, &result).await?;
        self.repos
            .videos
            .update_status(&video.id, VideoStatus::Completed)
            .await?;

        info!("Job {} completed for video {}", job_id, outcome.youtube_id);
        Ok(outcome)
    }

    async fn set_progress(&self, job_id: &str, percent: u8) -> Result<(), ProcessingError> {
        let progress = Progress::new(i32::from(percent)).map_err(RepositoryError::from)?;
        self.repos
            .jobs
            .update_progress(job_id, JobStatus::Running, progress)
            .await?;
        Ok(())
    }

    async fn record_failure(
        &self,
        job_id: &str,
        video_id: Option<&str>,
        err: &ProcessingError,
    ) -> Result<(), RepositoryError> {
        self.repos.jobs.fail(job_id, &err.to_string()).await?;
        if let Some(video_id) = video_id {
            self.repos
                .videos
                .update_status(video_id, VideoStatus::Failed)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarizer::SummarizeBackend;
    use crate::worker::VideoMetadata;
    use async_trait::async_trait;
    use std::path::Path;

    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    struct FakeSource {
        subtitles: bool,
        fail_metadata: bool,
    }

    #[async_trait]
    impl VideoSource for FakeSource {
        async fn fetch_metadata(&self, _url: &str) -> Result<VideoMetadata, WorkerError> {
            if self.fail_metadata {
                return Err(WorkerError::CommandFailed {
                    tool: "yt-dlp".to_string(),
                    message: "Video unavailable".to_string(),
                });
            }
            Ok(VideoMetadata::from_info(
                "dQw4w9WgXcQ",
                &serde_json::json!({
                    "title": "Test Talk",
                    "duration": 212,
                    "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hq.jpg"
                }),
            ))
        }

        async fn download_subtitles(
            &self,
            _url: &str,
            out_dir: &Path,
        ) -> Result<Option<PathBuf>, WorkerError> {
            if !self.subtitles {
                return Ok(None);
            }
            let path = out_dir.join("dQw4w9WgXcQ.en.vtt");
            std::fs::write(
                &path,
                "WEBVTT\n\n00:00:00.000 --> 00:00:02.000\nRust ownership rules. Rust ownership matters.\n",
            )?;
            Ok(Some(path))
        }

        async fn download_audio(
            &self,
            _url: &str,
            out_dir: &Path,
            job_id: &str,
        ) -> Result<PathBuf, WorkerError> {
            let path = out_dir.join(format!("{}_audio.mp3", job_id));
            std::fs::write(&path, b"ID3")?;
            Ok(path)
        }
    }

    struct EchoBackend;

    #[async_trait]
    impl SummarizeBackend for EchoBackend {
        async fn summarize(
            &self,
            _text: &str,
            max_length: u32,
            _min_length: u32,
        ) -> Result<String, SummarizeError> {
            Ok(format!("summary {}", max_length))
        }
    }

    async fn service(
        dir: &Path,
        source: FakeSource,
    ) -> (ProcessingService, Repositories) {
        let repos = Repositories::open(&dir.join("ytprod.db")).await.unwrap();
        let service = ProcessingService::new(
            repos.clone(),
            Arc::new(source),
            Summarizer::new(Arc::new(EchoBackend)),
            dir.join("work"),
        );
        (service, repos)
    }

    #[tokio::test]
    async fn test_successful_job() {
        let dir = tempfile::tempdir().unwrap();
        let (service, repos) = service(
            dir.path(),
            FakeSource {
                subtitles: true,
                fail_metadata: false,
            },
        )
        .await;

        let outcome = service.process(URL, None).await.unwrap();
        assert_eq!(outcome.youtube_id, "dQw4w9WgXcQ");
        assert_eq!(outcome.summary.short_summary, "summary 60");
        assert_eq!(outcome.summary.keywords, vec!["rust", "ownership"]);

        let job = repos.jobs.get(&outcome.job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, Progress::MAX);
        assert_eq!(job.video_id.as_deref(), Some(outcome.video_id.as_str()));
        let result = job.result.unwrap();
        assert_eq!(result["summary_id"], outcome.summary_id.as_str());

        let video = repos.videos.get(&outcome.video_id).await.unwrap().unwrap();
        assert_eq!(video.status, VideoStatus::Completed);
        assert_eq!(video.title.as_deref(), Some("Test Talk"));
        assert_eq!(video.duration, Some(212));
        assert_eq!(video.job_id.as_deref(), Some(outcome.job_id.as_str()));

        let transcripts = repos.transcripts.list_for_video(&video.id).await.unwrap();
        assert_eq!(transcripts.len(), 1);
        assert_eq!(
            transcripts[0].text,
            "Rust ownership rules. Rust ownership matters."
        );

        assert!(!dir.path().join("work").join(&outcome.job_id).exists());
    }

    #[tokio::test]
    async fn test_second_job_reuses_video() {
        let dir = tempfile::tempdir().unwrap();
        let (service, repos) = service(
            dir.path(),
            FakeSource {
                subtitles: true,
                fail_metadata: false,
            },
        )
        .await;

        let first = service.process(URL, None).await.unwrap();
        let second = service
            .process("https://youtu.be/dQw4w9WgXcQ", None)
            .await
            .unwrap();
        assert_eq!(first.video_id, second.video_id);
        assert_ne!(first.job_id, second.job_id);
        assert_eq!(repos.videos.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failure_marks_job_and_video() {
        let dir = tempfile::tempdir().unwrap();
        let (service, repos) = service(
            dir.path(),
            FakeSource {
                subtitles: true,
                fail_metadata: true,
            },
        )
        .await;

        let err = service.process(URL, None).await.unwrap_err();
        assert!(matches!(err, ProcessingError::Worker(_)));

        let failed = repos.jobs.list_by_status(JobStatus::Failed).await.unwrap();
        assert_eq!(failed.len(), 1);
        let job = &failed[0];
        assert_eq!(job.progress.value(), i32::from(PROGRESS_STARTED));
        let message = job.result.as_ref().unwrap()["error"].as_str().unwrap();
        assert!(message.contains("Video unavailable"));

        let video_id = job.video_id.as_deref().unwrap();
        let video = repos.videos.get(video_id).await.unwrap().unwrap();
        assert_eq!(video.status, VideoStatus::Failed);
    }

    #[tokio::test]
    async fn test_audio_only_video_fails_without_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let (service, repos) = service(
            dir.path(),
            FakeSource {
                subtitles: false,
                fail_metadata: false,
            },
        )
        .await;

        let err = service.process(URL, None).await.unwrap_err();
        assert!(matches!(err, ProcessingError::NoTranscript));
        let failed = repos.jobs.list_by_status(JobStatus::Failed).await.unwrap();
        assert_eq!(failed.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_url_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let (service, repos) = service(
            dir.path(),
            FakeSource {
                subtitles: true,
                fail_metadata: false,
            },
        )
        .await;

        let err = service
            .process("https://example.com/not-youtube", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessingError::InvalidUrl(_)));

        let failed = repos.jobs.list_by_status(JobStatus::Failed).await.unwrap();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].video_id.is_none());
        assert_eq!(failed[0].progress, Progress::MIN);
        assert_eq!(repos.videos.count().await.unwrap(), 0);
    }
}
