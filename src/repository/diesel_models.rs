//! Diesel ORM models for database tables.
//!
//! Records are the raw column values; the repositories convert them into the
//! typed domain models in `crate::models`.

use diesel::prelude::*;

use crate::schema;

/// User record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

/// New user for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::users)]
pub struct NewUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Video record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::videos)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VideoRecord {
    pub id: String,
    pub user_id: Option<String>,
    pub youtube_id: String,
    pub title: Option<String>,
    pub duration: Option<i32>,
    pub thumbnail: Option<String>,
    pub status: String,
    pub job_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// New video for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::videos)]
pub struct NewVideo<'a> {
    pub id: &'a str,
    pub user_id: Option<&'a str>,
    pub youtube_id: &'a str,
    pub title: Option<&'a str>,
    pub duration: Option<i32>,
    pub thumbnail: Option<&'a str>,
    pub status: &'a str,
    pub job_id: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Transcript record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::transcripts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TranscriptRecord {
    pub id: String,
    pub video_id: String,
    pub text: String,
    pub language: String,
    pub token_count: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

/// New transcript for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::transcripts)]
pub struct NewTranscript<'a> {
    pub id: &'a str,
    pub video_id: &'a str,
    pub text: &'a str,
    pub language: &'a str,
    pub token_count: Option<i32>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Summary record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::summaries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SummaryRecord {
    pub id: String,
    pub video_id: String,
    pub short_summary: Option<String>,
    pub long_summary: Option<String>,
    /// JSON array of keywords.
    pub keywords: String,
    pub created_at: String,
    pub updated_at: String,
}

/// New summary for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::summaries)]
pub struct NewSummary<'a> {
    pub id: &'a str,
    pub video_id: &'a str,
    pub short_summary: Option<&'a str>,
    pub long_summary: Option<&'a str>,
    pub keywords: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Job record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::jobs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct JobRecord {
    pub id: String,
    pub video_id: Option<String>,
    pub status: String,
    pub progress: i32,
    /// JSON result payload.
    pub result: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// New job for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::jobs)]
pub struct NewJob<'a> {
    pub id: &'a str,
    pub video_id: Option<&'a str>,
    pub status: &'a str,
    pub progress: i32,
    pub result: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}
