//! Transcript summarization and keyword extraction.
//!
//! Long text is summarized in passes: each chunk is summarized on its own,
//! the chunk summaries are condensed into a long summary, and the long
//! summary into a short one.

mod chunk;
mod client;
mod keywords;

pub use chunk::{chunk_text, estimate_tokens, DEFAULT_MAX_TOKENS};
pub use client::InferenceClient;
pub use keywords::{extract_keywords, DEFAULT_TOP_K};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Maximum characters of a chunk used when its summary fails.
const FALLBACK_CHARS: usize = 200;

/// Configuration for the summarization backend.
#[derive(Debug, Clone, Serialize, Deserialize, prefer::FromValue)]
pub struct SummarizerConfig {
    /// Whether summarization is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Hosted inference API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Summarization model
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for the hosted endpoint (`HF_API_KEY`)
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Use the self-hosted endpoint even when an API key is set (`USE_LOCAL_MODELS`)
    #[serde(default)]
    pub use_local_models: bool,
    /// Self-hosted inference server base URL
    #[serde(default = "default_local_endpoint")]
    pub local_endpoint: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_enabled() -> bool {
    true
}
fn default_endpoint() -> String {
    "https://api-inference.huggingface.co".to_string()
}
fn default_model() -> String {
    "sshleifer/distilbart-cnn-12-6".to_string()
}
fn default_local_endpoint() -> String {
    "http://localhost:8080".to_string()
}
fn default_timeout_secs() -> u64 {
    300
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            use_local_models: false,
            local_endpoint: default_local_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Errors that can occur during summarization.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("summarization is disabled")]
    Disabled,

    #[error("input text is empty")]
    EmptyInput,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("inference API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid response from inference API: {0}")]
    InvalidResponse(String),
}

/// A model that turns text into a summary bounded by token lengths.
#[async_trait]
pub trait SummarizeBackend: Send + Sync {
    async fn summarize(
        &self,
        text: &str,
        max_length: u32,
        min_length: u32,
    ) -> Result<String, SummarizeError>;
}

/// Output of [`Summarizer::summarize_long_text`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongTextSummary {
    pub short_summary: String,
    pub long_summary: String,
    pub chunk_summaries: Vec<String>,
    pub num_chunks: usize,
    pub total_tokens: usize,
}

/// Summaries plus keywords for a text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummarizationResult {
    pub short_summary: String,
    pub long_summary: String,
    pub chunk_summaries: Vec<String>,
    pub keywords: Vec<String>,
    pub num_chunks: usize,
    pub total_tokens: usize,
}

/// Multi-pass summarizer over a [`SummarizeBackend`].
#[derive(Clone)]
pub struct Summarizer {
    backend: Arc<dyn SummarizeBackend>,
}

impl Summarizer {
    pub fn new(backend: Arc<dyn SummarizeBackend>) -> Self {
        Self { backend }
    }

    /// Summarizer backed by an [`InferenceClient`].
    pub fn from_config(config: &SummarizerConfig) -> Result<Self, SummarizeError> {
        Ok(Self::new(Arc::new(InferenceClient::new(config)?)))
    }

    /// Summarize arbitrarily long text.
    ///
    /// A chunk whose summary fails is replaced by its first 200 characters
    /// followed by `...`; failures of the two final passes are returned.
    pub async fn summarize_long_text(&self, text: &str) -> Result<LongTextSummary, SummarizeError> {
        if text.trim().is_empty() {
            return Err(SummarizeError::EmptyInput);
        }
        let chunks = chunk_text(text, DEFAULT_MAX_TOKENS);
        if chunks.is_empty() {
            return Err(SummarizeError::EmptyInput);
        }

        info!("Processing {} chunks for summarization", chunks.len());
        let mut chunk_summaries = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            info!("Summarizing chunk {}/{}", i + 1, chunks.len());
            match self.backend.summarize(chunk, 150, 30).await {
                Ok(summary) => chunk_summaries.push(summary),
                Err(e) => {
                    warn!("Failed to summarize chunk {}: {}", i + 1, e);
                    let head: String = chunk.chars().take(FALLBACK_CHARS).collect();
                    chunk_summaries.push(format!("{}...", head));
                }
            }
        }

        let joined = chunk_summaries.join(" ");
        let long_summary = self.backend.summarize(&joined, 300, 100).await?;
        let short_summary = self.backend.summarize(&long_summary, 60, 20).await?;

        info!("Summarization completed successfully");
        Ok(LongTextSummary {
            short_summary,
            long_summary,
            num_chunks: chunks.len(),
            chunk_summaries,
            total_tokens: estimate_tokens(text),
        })
    }

    /// Summarize `text` and optionally extract its keywords.
    pub async fn process_text(
        &self,
        text: &str,
        with_keywords: bool,
    ) -> Result<SummarizationResult, SummarizeError> {
        let summary = self.summarize_long_text(text).await?;
        let keywords = if with_keywords {
            extract_keywords(text, DEFAULT_TOP_K)
        } else {
            Vec::new()
        };

        Ok(SummarizationResult {
            short_summary: summary.short_summary,
            long_summary: summary.long_summary,
            chunk_summaries: summary.chunk_summaries,
            keywords,
            num_chunks: summary.num_chunks,
            total_tokens: summary.total_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records calls and answers with `summary(<max_length>)`.
    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<(String, u32, u32)>>,
        fail_chunks: bool,
    }

    #[async_trait]
    impl SummarizeBackend for RecordingBackend {
        async fn summarize(
            &self,
            text: &str,
            max_length: u32,
            min_length: u32,
        ) -> Result<String, SummarizeError> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), max_length, min_length));
            if self.fail_chunks && max_length == 150 {
                return Err(SummarizeError::InvalidResponse("boom".to_string()));
            }
            Ok(format!("summary({})", max_length))
        }
    }

    #[tokio::test]
    async fn test_multi_pass_lengths() {
        let backend = Arc::new(RecordingBackend::default());
        let summarizer = Summarizer::new(backend.clone());

        let result = summarizer
            .summarize_long_text("A short talk. About one thing.")
            .await
            .unwrap();
        assert_eq!(result.num_chunks, 1);
        assert_eq!(result.chunk_summaries, vec!["summary(150)"]);
        assert_eq!(result.long_summary, "summary(300)");
        assert_eq!(result.short_summary, "summary(60)");
        assert_eq!(result.total_tokens, 30 / 4);

        let calls = backend.calls.lock().unwrap();
        let lengths: Vec<(u32, u32)> = calls.iter().map(|c| (c.1, c.2)).collect();
        assert_eq!(lengths, vec![(150, 30), (300, 100), (60, 20)]);
        assert_eq!(calls[0].0, "A short talk About one thing");
        assert_eq!(calls[2].0, "summary(300)");
    }

    #[tokio::test]
    async fn test_chunk_failure_falls_back_to_text() {
        let backend = Arc::new(RecordingBackend {
            fail_chunks: true,
            ..Default::default()
        });
        let summarizer = Summarizer::new(backend);
        let sentence = "y".repeat(300);

        let result = summarizer.summarize_long_text(&sentence).await.unwrap();
        assert_eq!(result.chunk_summaries, vec![format!("{}...", "y".repeat(200))]);
        assert_eq!(result.long_summary, "summary(300)");
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let summarizer = Summarizer::new(Arc::new(RecordingBackend::default()));
        assert!(matches!(
            summarizer.summarize_long_text("  ").await,
            Err(SummarizeError::EmptyInput)
        ));
        assert!(matches!(
            summarizer.summarize_long_text("?!.").await,
            Err(SummarizeError::EmptyInput)
        ));
    }

    #[tokio::test]
    async fn test_process_text_keywords_optional() {
        let summarizer = Summarizer::new(Arc::new(RecordingBackend::default()));
        let text = "Cargo builds crates. Cargo runs tests. Cargo publishes crates.";

        let with = summarizer.process_text(text, true).await.unwrap();
        assert_eq!(with.keywords.first().map(String::as_str), Some("cargo"));

        let without = summarizer.process_text(text, false).await.unwrap();
        assert!(without.keywords.is_empty());
        assert_eq!(without.short_summary, "summary(60)");
    }
}
