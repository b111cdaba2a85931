//! Metadata and subtitle/audio downloads through the `yt-dlp` binary.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::process::Command;
use tracing::info;

use super::pipeline::VideoSource;
use super::{extract_video_id, WorkerError};

const TOOL: &str = "yt-dlp";

/// Maximum description length kept in metadata, in characters.
const DESCRIPTION_LIMIT: usize = 500;

/// Video metadata as reported by yt-dlp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub youtube_id: String,
    pub title: String,
    /// Duration in seconds.
    pub duration: u64,
    pub thumbnail: String,
    pub uploader: String,
    /// `YYYYMMDD`, empty when unknown.
    pub upload_date: String,
    pub view_count: u64,
    /// First 500 characters followed by `...`, or empty.
    pub description: String,
}

impl VideoMetadata {
    /// Build metadata from a yt-dlp info document.
    pub fn from_info(youtube_id: &str, info: &Value) -> Self {
        let text = |key: &str, default: &str| {
            info.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        let number = |key: &str| {
            info.get(key)
                .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0).round() as u64)))
                .unwrap_or(0)
        };

        let description = match info.get("description").and_then(Value::as_str) {
            Some(d) if !d.is_empty() => {
                let truncated: String = d.chars().take(DESCRIPTION_LIMIT).collect();
                format!("{}...", truncated)
            }
            _ => String::new(),
        };

        Self {
            youtube_id: youtube_id.to_string(),
            title: text("title", "Unknown Title"),
            duration: number("duration"),
            thumbnail: text("thumbnail", ""),
            uploader: text("uploader", "Unknown"),
            upload_date: text("upload_date", ""),
            view_count: number("view_count"),
            description,
        }
    }
}

/// Handle command output, extracting stdout on success or returning appropriate error.
fn handle_cmd_output(result: std::io::Result<std::process::Output>) -> Result<String, WorkerError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(WorkerError::CommandFailed {
                    tool: TOOL.to_string(),
                    message: stderr.trim().to_string(),
                })
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(WorkerError::ToolNotFound(TOOL.to_string()))
        }
        Err(e) => Err(WorkerError::Io(e)),
    }
}

/// First file in `dir` (by name) accepted by `matches`.
pub(crate) fn find_file<F>(dir: &Path, matches: F) -> Result<Option<PathBuf>, WorkerError>
where
    F: Fn(&str) -> bool,
{
    let mut found: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(&matches)
                .unwrap_or(false)
        })
        .collect();
    found.sort();
    Ok(found.into_iter().next())
}

/// yt-dlp driver.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
}

impl YtDlp {
    /// Find `yt-dlp` on the PATH.
    pub fn locate() -> Result<Self, WorkerError> {
        which::which(TOOL)
            .map(Self::with_binary)
            .map_err(|_| WorkerError::ToolNotFound(TOOL.to_string()))
    }

    /// Use a specific binary.
    pub fn with_binary(binary: PathBuf) -> Self {
        Self { binary }
    }

    async fn run(&self, args: &[&str]) -> Result<String, WorkerError> {
        let output = Command::new(&self.binary)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await;
        handle_cmd_output(output)
    }
}

#[async_trait]
impl VideoSource for YtDlp {
    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata, WorkerError> {
        let youtube_id =
            extract_video_id(url).ok_or_else(|| WorkerError::InvalidUrl(url.to_string()))?;

        let stdout = self
            .run(&[
                "--dump-single-json",
                "--skip-download",
                "--no-playlist",
                "--no-warnings",
                url,
            ])
            .await?;
        let info: Value = serde_json::from_str(&stdout)
            .map_err(|e| WorkerError::Decode(format!("yt-dlp metadata: {}", e)))?;

        let metadata = VideoMetadata::from_info(&youtube_id, &info);
        info!("Successfully fetched metadata for video: {}", metadata.title);
        Ok(metadata)
    }

    async fn download_subtitles(
        &self,
        url: &str,
        out_dir: &Path,
    ) -> Result<Option<PathBuf>, WorkerError> {
        let template = out_dir.join("%(id)s.%(ext)s");
        let template = template.to_string_lossy();
        self.run(&[
            "--write-subs",
            "--write-auto-subs",
            "--sub-langs",
            "en",
            "--sub-format",
            "vtt",
            "--skip-download",
            "--no-playlist",
            "--no-warnings",
            "-o",
            &template,
            url,
        ])
        .await?;

        let found = find_file(out_dir, |name| name.ends_with(".vtt"))?;
        if let Some(ref path) = found {
            info!("Found VTT subtitle file: {}", path.display());
        }
        Ok(found)
    }

    async fn download_audio(
        &self,
        url: &str,
        out_dir: &Path,
        job_id: &str,
    ) -> Result<PathBuf, WorkerError> {
        let prefix = format!("{}_audio.", job_id);
        let template = out_dir.join(format!("{}%(ext)s", prefix));
        let template = template.to_string_lossy();
        self.run(&[
            "-f",
            "bestaudio/best",
            "--extract-audio",
            "--audio-format",
            "mp3",
            "--no-playlist",
            "--no-warnings",
            "-o",
            &template,
            url,
        ])
        .await?;

        let path = find_file(out_dir, |name| name.starts_with(&prefix))?.ok_or_else(|| {
            WorkerError::MissingOutput("audio file not found after download".to_string())
        })?;
        info!("Downloaded audio file for ASR: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_from_full_info() {
        let long_description = "x".repeat(600);
        let info = json!({
            "title": "Never Gonna Give You Up",
            "duration": 212.0,
            "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg",
            "uploader": "Rick Astley",
            "upload_date": "20091025",
            "view_count": 1_500_000_000u64,
            "description": long_description,
        });
        let meta = VideoMetadata::from_info("dQw4w9WgXcQ", &info);

        assert_eq!(meta.title, "Never Gonna Give You Up");
        assert_eq!(meta.duration, 212);
        assert_eq!(meta.uploader, "Rick Astley");
        assert_eq!(meta.view_count, 1_500_000_000);
        assert_eq!(meta.description.chars().count(), 503);
        assert!(meta.description.ends_with("..."));
    }

    #[test]
    fn test_metadata_defaults() {
        let meta = VideoMetadata::from_info("dQw4w9WgXcQ", &json!({}));
        assert_eq!(meta.title, "Unknown Title");
        assert_eq!(meta.duration, 0);
        assert_eq!(meta.thumbnail, "");
        assert_eq!(meta.uploader, "Unknown");
        assert_eq!(meta.description, "");
    }

    #[test]
    fn test_find_file_picks_first_match() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.en.vtt"), "").unwrap();
        std::fs::write(dir.path().join("a.en.vtt"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        let found = find_file(dir.path(), |n| n.ends_with(".vtt")).unwrap();
        assert_eq!(found, Some(dir.path().join("a.en.vtt")));
        assert_eq!(find_file(dir.path(), |n| n.ends_with(".mp3")).unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_binary_reported() {
        let ytdlp = YtDlp::with_binary(PathBuf::from("/nonexistent/yt-dlp"));
        let err = ytdlp
            .fetch_metadata("https://youtu.be/dQw4w9WgXcQ")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::ToolNotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_url_rejected_before_running() {
        let ytdlp = YtDlp::with_binary(PathBuf::from("/nonexistent/yt-dlp"));
        let err = ytdlp
            .fetch_metadata("https://example.com/video")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::InvalidUrl(_)));
    }
}
