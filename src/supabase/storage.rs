//! Supabase Storage API client.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{SupabaseClient, SupabaseError};

/// A storage bucket.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Bucket {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// An object returned by a bucket listing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageObject {
    pub name: String,
    /// Folders are listed with a null id.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Response to an upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    /// `<bucket>/<path>`.
    #[serde(rename = "Key")]
    pub key: String,
}

#[derive(Debug, Serialize)]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: u32,
    offset: u32,
    #[serde(rename = "sortBy")]
    sort_by: SortBy,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SortBy {
    column: &'static str,
    order: &'static str,
}

#[derive(Debug, Serialize)]
struct RemoveRequest<'a> {
    prefixes: &'a [String],
}

/// Encode each path segment, keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Client for buckets and objects.
#[derive(Clone, Debug)]
pub struct StorageClient {
    client: SupabaseClient,
}

impl StorageClient {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// List all buckets visible to the API key.
    pub async fn list_buckets(&self) -> Result<Vec<Bucket>, SupabaseError> {
        let url = self.client.url("storage/v1/bucket")?;
        self.client.send_json(self.client.http().get(url)).await
    }

    /// Get a bucket by id.
    pub async fn get_bucket(&self, id: &str) -> Result<Bucket, SupabaseError> {
        let url = self
            .client
            .url(&format!("storage/v1/bucket/{}", urlencoding::encode(id)))?;
        self.client.send_json(self.client.http().get(url)).await
    }

    /// List objects under `prefix`, optionally narrowed by a name search.
    pub async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        search: Option<&str>,
        limit: u32,
    ) -> Result<Vec<StorageObject>, SupabaseError> {
        let url = self
            .client
            .url(&format!("storage/v1/object/list/{}", urlencoding::encode(bucket)))?;
        let body = ListRequest {
            prefix,
            limit,
            offset: 0,
            sort_by: SortBy {
                column: "name",
                order: "asc",
            },
            search,
        };
        self.client
            .send_json(self.client.http().post(url).json(&body))
            .await
    }

    /// Upload bytes to `bucket/path`. Fails if the object already exists.
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<UploadResponse, SupabaseError> {
        let url = self.object_url(bucket, path)?;
        debug!("Uploading {} bytes to {}/{}", bytes.len(), bucket, path);
        let req = self
            .client
            .http()
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("cache-control", "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes);
        self.client.send_json(req).await
    }

    /// Unauthenticated URL of an object in a public bucket.
    ///
    /// Computed locally; the object is not checked for existence.
    pub fn public_url(&self, bucket: &str, path: &str) -> Result<String, SupabaseError> {
        let url = self.client.url(&format!(
            "storage/v1/object/public/{}/{}",
            urlencoding::encode(bucket),
            encode_path(path)
        ))?;
        Ok(url.to_string())
    }

    /// Download an object's bytes.
    pub async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, SupabaseError> {
        let url = self.object_url(bucket, path)?;
        let response = self.client.send(self.client.http().get(url)).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Delete objects by path. Returns the objects the API reports as removed.
    pub async fn remove(
        &self,
        bucket: &str,
        paths: &[String],
    ) -> Result<Vec<StorageObject>, SupabaseError> {
        let url = self
            .client
            .url(&format!("storage/v1/object/{}", urlencoding::encode(bucket)))?;
        let body = RemoveRequest { prefixes: paths };
        self.client
            .send_json(self.client.http().delete(url).json(&body))
            .await
    }

    fn object_url(&self, bucket: &str, path: &str) -> Result<url::Url, SupabaseError> {
        self.client.url(&format!(
            "storage/v1/object/{}/{}",
            urlencoding::encode(bucket),
            encode_path(path)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_encode_path_keeps_separators() {
        assert_eq!(encode_path("a/b c/d.txt"), "a/b%20c/d.txt");
    }

    #[test]
    fn test_public_url() {
        let storage =
            SupabaseClient::new("https://abc.supabase.co", "key", Duration::from_secs(5))
                .unwrap()
                .storage();
        assert_eq!(
            storage.public_url("videos", "smoke/test file.txt").unwrap(),
            "https://abc.supabase.co/storage/v1/object/public/videos/smoke/test%20file.txt"
        );
    }
}
