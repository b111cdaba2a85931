//! ytprod: backend tooling for the YouTube productivity app.
//!
//! The hosted side is a Supabase project (Postgres schema plus a storage
//! bucket) that the smoke tests exercise. Locally, a SQLite mirror of the
//! same schema backs the video worker, the summarizer and the HTTP API.

pub mod cli;
pub mod config;
pub mod models;
pub mod repository;
pub mod schema;
pub mod server;
pub mod services;
pub mod smoke;
pub mod summarizer;
pub mod supabase;
pub mod worker;
