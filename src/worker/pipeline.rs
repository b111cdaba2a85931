//! Metadata, then subtitles, then audio fallback.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info};

use super::{vtt_file_to_text, JobWorkspace, VideoMetadata, WorkerError};

/// Where video metadata and transcript material come from.
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata, WorkerError>;

    /// Download English subtitles into `out_dir`. `None` when the video has none.
    async fn download_subtitles(
        &self,
        url: &str,
        out_dir: &Path,
    ) -> Result<Option<PathBuf>, WorkerError>;

    /// Download the audio track into `out_dir` as `<job_id>_audio.<ext>`.
    async fn download_audio(
        &self,
        url: &str,
        out_dir: &Path,
        job_id: &str,
    ) -> Result<PathBuf, WorkerError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptSource {
    Subtitles,
    Audio,
}

/// Output of [`process_youtube_video`].
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedVideo {
    pub job_id: String,
    #[serde(flatten)]
    pub metadata: VideoMetadata,
    pub transcript_source: TranscriptSource,
    pub transcript_path: PathBuf,
    /// Plain text, only available when subtitles were found.
    pub transcript_text: Option<String>,
}

/// Fetch metadata and a transcript for `url` into `workspace`.
///
/// Subtitles are preferred; when the video has none the audio track is
/// downloaded instead and `transcript_text` stays empty.
pub async fn process_youtube_video(
    source: &dyn VideoSource,
    workspace: &JobWorkspace,
    url: &str,
) -> Result<ProcessedVideo, WorkerError> {
    let result = run(source, workspace, url).await;
    if let Err(ref e) = result {
        error!("Error processing video {}: {}", url, e);
    }
    result
}

async fn run(
    source: &dyn VideoSource,
    workspace: &JobWorkspace,
    url: &str,
) -> Result<ProcessedVideo, WorkerError> {
    let metadata = source.fetch_metadata(url).await?;

    let (transcript_source, transcript_path) =
        match source.download_subtitles(url, workspace.path()).await? {
            Some(path) => (TranscriptSource::Subtitles, path),
            None => {
                info!("No VTT subtitles found, downloading audio for ASR");
                let path = source
                    .download_audio(url, workspace.path(), workspace.job_id())
                    .await?;
                (TranscriptSource::Audio, path)
            }
        };

    let is_vtt = transcript_path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("vtt"))
        .unwrap_or(false);
    let transcript_text = if is_vtt {
        Some(vtt_file_to_text(&transcript_path).await?)
    } else {
        None
    };

    info!("Successfully processed video: {}", metadata.title);
    Ok(ProcessedVideo {
        job_id: workspace.job_id().to_string(),
        metadata,
        transcript_source,
        transcript_path,
        transcript_text,
    })
}
