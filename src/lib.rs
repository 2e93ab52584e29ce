//! # Photo Archiver
//!
//! A deduplicating chronological photo and video archiver.
//!
//! ## Core Philosophy
//! - **Never delete** - duplicates are recorded or moved aside, never removed
//! - **Deterministic** - the same input always produces the same plan
//! - **Two passes** - evaluate first, inspect the log, then process
//!
//! ## Architecture
//! The library is split into a core engine and presentation layers:
//! - `core` - scanning, duplicate detection, naming, plan building,
//!   log persistence and the processing stage
//! - `error` - error types with per-file failures kept local

pub mod core;
pub mod error;

// Re-export commonly used types at the crate root
pub use error::{ArchiverError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
