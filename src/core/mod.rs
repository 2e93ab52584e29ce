//! # Core Module
//!
//! The duplicate-detection and chronological-naming engine.
//!
//! ## Modules
//! - `scanner` - Discovers media files in raw and archive directories
//! - `metadata` - Resolves timestamps and memoizes per-file facts
//! - `hasher` - Strong content hashes and perceptual fingerprints
//! - `detector` - Exact and perceptual duplicate detection
//! - `naming` - Deterministic chronological name assignment
//! - `plan` - Evaluation records and the plan builder
//! - `export` - Evaluation log persistence (CSV)
//! - `execute` - Processing stage (copy/convert/move)

pub mod detector;
pub mod execute;
pub mod export;
pub mod hasher;
pub mod metadata;
pub mod naming;
pub mod plan;
pub mod scanner;

// Re-export commonly used types
pub use detector::{DuplicateGroup, MatchMethod};
pub use metadata::MetadataCache;
pub use plan::{EvaluationPlan, EvaluationRecord, RecordStatus};
pub use scanner::{MediaFile, Origin};
