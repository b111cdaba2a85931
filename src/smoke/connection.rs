//! Connection smoke test: table access, a throwaway insert/delete and the
//! storage bucket. Every check runs even when an earlier one failed.

use serde_json::{json, Value};
use uuid::Uuid;

use super::report::SmokeReport;
use crate::supabase::{Query, RestClient, StorageClient};

/// Tables the hosted schema must expose.
pub const TABLES: [&str; 5] = ["users", "videos", "transcripts", "summaries", "jobs"];

/// Number of sample users listed.
const SAMPLE_USERS: u32 = 5;

/// Run the connection smoke test.
pub async fn run_connection_smoke(
    rest: &RestClient,
    storage: &StorageClient,
    bucket: &str,
) -> SmokeReport {
    let mut report = SmokeReport::new("Connection smoke test");

    match rest.count("users").await {
        Ok(count) => report.pass(format!(
            "Database connection successful ({} row(s) in users)",
            count
        )),
        Err(e) => report.fail(format!("Database connection failed: {}", e)),
    }

    for table in TABLES {
        let query = Query::new().limit(1);
        match rest.select::<Value>(table, &query).await {
            Ok(_) => report.pass(format!("Table '{}' exists and accessible", table)),
            Err(e) if e.is_not_found() => {
                report.fail(format!("Table '{}' does not exist: {}", table, e))
            }
            Err(e) => report.fail(format!("Table '{}' is not accessible: {}", table, e)),
        }
    }

    check_sample_users(&mut report, rest).await;
    check_insert_delete(&mut report, rest).await;

    match storage.list_buckets().await {
        Ok(buckets) if buckets.iter().any(|b| b.name == bucket || b.id == bucket) => {
            report.pass(format!("Storage bucket '{}' exists", bucket))
        }
        Ok(_) => report.fail(format!("Storage bucket '{}' not found", bucket)),
        Err(e) => report.fail(format!("Failed to list storage buckets: {}", e)),
    }

    report
}

async fn check_sample_users(report: &mut SmokeReport, rest: &RestClient) {
    let query = Query::new()
        .columns("id,email,created_at")
        .order("created_at", true)
        .limit(SAMPLE_USERS);

    match rest.select::<Value>("users", &query).await {
        Ok(users) => {
            report.pass(format!("Found {} users", users.len()));
            for user in &users {
                if let Some(email) = user.get("email").and_then(Value::as_str) {
                    report.info(format!("  - {}", email));
                }
            }
        }
        Err(e) => report.fail(format!("Failed to list users: {}", e)),
    }
}

async fn check_insert_delete(report: &mut SmokeReport, rest: &RestClient) {
    let email = format!("smoke-test-{}@example.com", Uuid::new_v4());

    let inserted = match rest
        .insert::<_, Value>("users", &[json!({ "email": email })])
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            report.fail(format!("Failed to insert test user: {}", e));
            return;
        }
    };

    let Some(id) = inserted
        .first()
        .and_then(|row| row.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
    else {
        report.fail("Insert did not return the new user's id");
        // Best effort: remove by the unique email instead.
        if let Err(e) = rest.delete_eq::<Value>("users", "email", &email).await {
            report.fail(format!("Failed to delete test user {}: {}", email, e));
        }
        return;
    };
    report.pass(format!("Inserted test user {}", email));

    match rest.delete_eq::<Value>("users", "id", &id).await {
        Ok(rows) if !rows.is_empty() => report.pass("Deleted test user"),
        Ok(_) => report.fail(format!("Delete of test user {} matched no rows", id)),
        Err(e) => report.fail(format!("Failed to delete test user {}: {}", id, e)),
    }
}
