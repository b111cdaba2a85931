//! Hugging Face style inference client.
//!
//! Talks to the hosted Inference API when an API key is configured, or to a
//! self-hosted server exposing the same `/models/<model>` route.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{SummarizeBackend, SummarizeError, SummarizerConfig};

/// Inference API request format.
#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_length: u32,
    min_length: u32,
    do_sample: bool,
}

/// Inference API response item.
#[derive(Debug, Deserialize)]
struct SummaryItem {
    #[serde(default)]
    summary_text: String,
}

/// Inference API error body, e.g. while a model is loading.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Summarization backend calling `POST {endpoint}/models/{model}`.
pub struct InferenceClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for InferenceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl InferenceClient {
    /// Create a client from configuration.
    ///
    /// The hosted endpoint is used when an API key is set and local models
    /// are not requested; otherwise the self-hosted endpoint is used.
    pub fn new(config: &SummarizerConfig) -> Result<Self, SummarizeError> {
        if !config.enabled {
            return Err(SummarizeError::Disabled);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let (endpoint, api_key) = match (&config.api_key, config.use_local_models) {
            (Some(key), false) => {
                info!("Initializing Hugging Face Inference API");
                (config.endpoint.clone(), Some(key.clone()))
            }
            _ => {
                info!("Initializing local inference endpoint {}", config.local_endpoint);
                (config.local_endpoint.clone(), None)
            }
        };

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Whether requests go to the hosted API.
    pub fn is_hosted(&self) -> bool {
        self.api_key.is_some()
    }

    fn url(&self) -> String {
        format!("{}/models/{}", self.endpoint, self.model)
    }
}

#[async_trait]
impl SummarizeBackend for InferenceClient {
    async fn summarize(
        &self,
        text: &str,
        max_length: u32,
        min_length: u32,
    ) -> Result<String, SummarizeError> {
        let request = InferenceRequest {
            inputs: text,
            parameters: InferenceParameters {
                max_length,
                min_length,
                do_sample: false,
            },
        };

        debug!(
            "Summarizing {} characters with {}",
            text.chars().count(),
            self.model
        );
        let mut req = self.client.post(self.url()).json(&request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(SummarizeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let items: Vec<SummaryItem> = resp
            .json()
            .await
            .map_err(|e| SummarizeError::InvalidResponse(e.to_string()))?;
        items
            .into_iter()
            .next()
            .map(|item| item.summary_text)
            .ok_or_else(|| SummarizeError::InvalidResponse("empty result list".to_string()))
    }
}
