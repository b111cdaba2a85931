//! HTTP clients for the hosted Supabase platform.
//!
//! Covers the slice of the platform this project touches: the Storage API
//! (buckets and objects) and PostgREST (table rows). Both clients share one
//! [`SupabaseClient`], which carries the project URL and API key.

mod error;
pub mod rest;
pub mod storage;

pub use error::SupabaseError;
pub use rest::{Query, RestClient};
pub use storage::{Bucket, StorageClient, StorageObject};

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Settings;

/// Shared connection details for the Supabase APIs.
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    /// Create a client for the project at `base_url`.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, SupabaseError> {
        let mut base_url = Url::parse(base_url)?;
        // Url::join treats a base without a trailing slash as a file name.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .user_agent(concat!("ytprod/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    /// Create a client from settings, failing if URL or key are missing.
    pub fn from_settings(settings: &Settings) -> Result<Self, SupabaseError> {
        let url = settings
            .supabase_url
            .as_deref()
            .ok_or(SupabaseError::NotConfigured("SUPABASE_URL"))?;
        let key = settings
            .supabase_key
            .as_deref()
            .ok_or(SupabaseError::NotConfigured("SUPABASE_KEY"))?;
        Self::new(url, key, settings.request_timeout())
    }

    /// Project URL with a trailing slash.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Storage API client.
    pub fn storage(&self) -> StorageClient {
        StorageClient::new(self.clone())
    }

    /// PostgREST client.
    pub fn rest(&self) -> RestClient {
        RestClient::new(self.clone())
    }

    pub(crate) fn url(&self, path: &str) -> Result<Url, SupabaseError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Attach the headers every Supabase API expects.
    pub(crate) fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Send a request and return the response if it succeeded.
    pub(crate) async fn send(&self, req: RequestBuilder) -> Result<Response, SupabaseError> {
        let response = self.authorize(req).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SupabaseError::from_body(status.as_u16(), &body))
    }

    /// Send a request and decode a JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
    ) -> Result<T, SupabaseError> {
        let response = self.send(req).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SupabaseError::Decode(format!("{}: {}", e, body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining_keeps_project_path() {
        let client =
            SupabaseClient::new("https://abc.supabase.co", "key", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.url("/storage/v1/bucket").unwrap().as_str(),
            "https://abc.supabase.co/storage/v1/bucket"
        );

        let proxied =
            SupabaseClient::new("http://localhost:8000/supabase", "key", Duration::from_secs(5))
                .unwrap();
        assert_eq!(
            proxied.url("rest/v1/users").unwrap().as_str(),
            "http://localhost:8000/supabase/rest/v1/users"
        );
    }

    #[test]
    fn test_from_settings_requires_url_and_key() {
        let mut settings = Settings::default();
        let err = SupabaseClient::from_settings(&settings).unwrap_err();
        assert!(matches!(err, SupabaseError::NotConfigured("SUPABASE_URL")));

        settings.supabase_url = Some("https://abc.supabase.co".to_string());
        let err = SupabaseClient::from_settings(&settings).unwrap_err();
        assert!(matches!(err, SupabaseError::NotConfigured("SUPABASE_KEY")));

        settings.supabase_key = Some("key".to_string());
        assert!(SupabaseClient::from_settings(&settings).is_ok());
    }

    #[test]
    fn test_debug_hides_key() {
        let client =
            SupabaseClient::new("https://abc.supabase.co", "secret", Duration::from_secs(5))
                .unwrap();
        assert!(!format!("{:?}", client).contains("secret"));
    }
}
