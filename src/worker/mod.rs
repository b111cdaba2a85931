//! Video-processing worker.
//!
//! Resolves a YouTube URL to metadata and a transcript by driving `yt-dlp`
//! inside a per-job scratch directory.

mod pipeline;
mod video_id;
mod vtt;
mod workspace;
mod ytdlp;

pub use pipeline::{process_youtube_video, ProcessedVideo, TranscriptSource, VideoSource};
pub use video_id::extract_video_id;
pub use vtt::{vtt_file_to_text, vtt_to_text};
pub use workspace::JobWorkspace;
pub use ytdlp::{VideoMetadata, YtDlp};

use thiserror::Error;

/// Errors raised while processing a video.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Could not extract video ID from URL: {0}")]
    InvalidUrl(String),

    #[error("invalid job id: {0:?}")]
    InvalidJobId(String),

    #[error("{0} not found; install it and make sure it is on PATH")]
    ToolNotFound(String),

    #[error("{tool} failed: {message}")]
    CommandFailed { tool: String, message: String },

    #[error("expected output missing: {0}")]
    MissingOutput(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
