//! Storage smoke test: bucket lookup and an upload/download/delete round trip.
//!
//! Stops at the first failure, except that an uploaded test object is
//! always deleted again.

use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::report::SmokeReport;
use crate::supabase::StorageClient;

/// First line of every uploaded test payload.
pub const PAYLOAD_HEADER: &str = "Hello from the ytprod storage smoke test!";

/// Name prefix of uploaded test objects.
pub const OBJECT_PREFIX: &str = "smoke-test-";

fn short_digest(bytes: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(bytes));
    digest[..12].to_string()
}

/// The object uploaded by a storage smoke run.
#[derive(Debug, Clone)]
pub struct TestObject {
    pub name: String,
    pub payload: Vec<u8>,
}

impl TestObject {
    /// A uniquely named text object stamped with the current time.
    pub fn generate() -> Self {
        Self {
            name: format!("{}{}.txt", OBJECT_PREFIX, Uuid::new_v4()),
            payload: format!("{}\nTimestamp: {}\n", PAYLOAD_HEADER, Utc::now().to_rfc3339())
                .into_bytes(),
        }
    }
}

/// Run the storage smoke test against `bucket`.
pub async fn run_storage_smoke(storage: &StorageClient, bucket: &str) -> SmokeReport {
    run_storage_smoke_with(storage, bucket, TestObject::generate()).await
}

/// Run the storage smoke test uploading `object`.
pub async fn run_storage_smoke_with(
    storage: &StorageClient,
    bucket: &str,
    object: TestObject,
) -> SmokeReport {
    let mut report = SmokeReport::new("Storage smoke test");
    report.info(format!("Testing storage bucket '{}'", bucket));

    let buckets = match storage.list_buckets().await {
        Ok(buckets) => {
            report.pass(format!("Listed {} bucket(s)", buckets.len()));
            buckets
        }
        Err(e) => {
            report.fail(format!("Failed to list buckets: {}", e));
            return report;
        }
    };

    let Some(found) = buckets.iter().find(|b| b.name == bucket || b.id == bucket) else {
        let available: Vec<&str> = buckets.iter().map(|b| b.name.as_str()).collect();
        let available = if available.is_empty() {
            "(none)".to_string()
        } else {
            available.join(", ")
        };
        report.fail(format!(
            "Bucket '{}' not found. Available buckets: {}",
            bucket, available
        ));
        return report;
    };
    report.pass(format!(
        "Found bucket '{}' (public: {})",
        found.name, found.public
    ));
    if !found.public {
        report.info("Bucket is private; its public URLs will not serve content");
    }
    let bucket_id = found.id.clone();

    let TestObject {
        name: object_name,
        payload,
    } = object;

    match storage
        .upload(&bucket_id, &object_name, payload.clone(), "text/plain")
        .await
    {
        Ok(uploaded) => report.pass(format!(
            "Uploaded test file {} ({} bytes)",
            uploaded.key,
            payload.len()
        )),
        Err(e) => {
            report.fail(format!("Failed to upload test file: {}", e));
            return report;
        }
    }

    let verified = verify_object(&mut report, storage, &bucket_id, &object_name, &payload).await;

    match storage.remove(&bucket_id, &[object_name.clone()]).await {
        Ok(_) => report.pass(format!("Deleted test file {}", object_name)),
        Err(e) => {
            report.fail(format!("Failed to delete test file {}: {}", object_name, e));
            return report;
        }
    }
    if !verified {
        return report;
    }

    match storage
        .list_objects(&bucket_id, "", Some(&object_name), 100)
        .await
    {
        Ok(objects) if objects.iter().any(|o| o.name == object_name) => {
            report.fail(format!("Test file {} still listed after delete", object_name))
        }
        Ok(_) => report.pass("Bucket left without test artifacts"),
        Err(e) => report.fail(format!("Failed to list objects after cleanup: {}", e)),
    }

    report
}

/// Public URL and download checks. Returns false on the first failure.
async fn verify_object(
    report: &mut SmokeReport,
    storage: &StorageClient,
    bucket_id: &str,
    object_name: &str,
    payload: &[u8],
) -> bool {
    match storage.public_url(bucket_id, object_name) {
        Ok(url) if !url.is_empty() => report.pass(format!("Public URL: {}", url)),
        Ok(_) => {
            report.fail("Public URL is empty");
            return false;
        }
        Err(e) => {
            report.fail(format!("Failed to build public URL: {}", e));
            return false;
        }
    }

    let downloaded = match storage.download(bucket_id, object_name).await {
        Ok(bytes) => bytes,
        Err(e) => {
            report.fail(format!("Failed to download test file: {}", e));
            return false;
        }
    };

    if downloaded == payload {
        report.pass(format!(
            "Downloaded content matches upload (sha256 {})",
            short_digest(&downloaded)
        ));
        true
    } else {
        report.fail(format!(
            "Downloaded content differs: expected {} bytes (sha256 {}), got {} bytes (sha256 {})",
            payload.len(),
            short_digest(payload),
            downloaded.len(),
            short_digest(&downloaded)
        ));
        false
    }
}
