//! Smoke tests against the hosted platform.
//!
//! Both tests are fixed, sequential call sequences that print one status
//! line per step. They never retry.

pub mod connection;
pub mod report;
pub mod storage;

pub use connection::run_connection_smoke;
pub use report::{CheckStatus, ReportLine, SmokeReport};
pub use storage::{run_storage_smoke, run_storage_smoke_with, TestObject};
