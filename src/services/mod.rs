//! Service layer for ytprod business logic.
//!
//! This module contains domain logic separated from UI concerns.
//! Services can be used by the CLI, the API server, or other interfaces.

pub mod processing;

pub use processing::{ProcessingError, ProcessingOutcome, ProcessingService};
