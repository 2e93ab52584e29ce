//! # Detector Module
//!
//! Finds duplicates among the scanned files in two tiers:
//!
//! 1. `exact` - byte-identical copies, found by size partition plus strong
//!    hash within size-collision groups
//! 2. `similar` - visually identical re-compressions, found by perceptual
//!    fingerprint over size/date-filtered candidate pairs
//!
//! Both tiers produce [`DuplicateGroup`]s with the same survivor rule: a
//! processed (already archived) file always outranks raw candidates, and
//! among raw files the earliest capture timestamp wins, with path order as
//! the final tie-break.

mod exact;
mod similar;

pub use exact::{ExactDetection, ExactDuplicateDetector};
pub use similar::{SimilarDetection, SimilarityConfig, SimilarityDetector};

use crate::core::metadata::MetadataCache;
use crate::core::scanner::{MediaFile, Origin};
use crate::error::PlanError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Which detection tier produced a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    /// Identical bytes (size + strong hash)
    Exact,
    /// Matching perceptual fingerprints
    Similar,
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMethod::Exact => write!(f, "exact"),
            MatchMethod::Similar => write!(f, "similar"),
        }
    }
}

/// A set of files considered equivalent under one detection method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Unique identifier for this group
    pub id: Uuid,
    /// The file that stays; every other member defers to it
    pub survivor: PathBuf,
    /// The members that will not be imported, in path order
    pub duplicates: Vec<PathBuf>,
    /// The detection tier that formed this group
    pub method: MatchMethod,
}

impl DuplicateGroup {
    /// Create a group; duplicates are sorted for deterministic output
    pub fn new(survivor: PathBuf, mut duplicates: Vec<PathBuf>, method: MatchMethod) -> Self {
        duplicates.sort();
        Self {
            id: Uuid::new_v4(),
            survivor,
            duplicates,
            method,
        }
    }

    /// Number of files deferring to the survivor
    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }
}

/// Pick the survivor of a group of equivalent files.
///
/// Rules, in order:
/// 1. a `processed`-origin file always wins over raw candidates
/// 2. the earliest resolved timestamp wins
/// 3. path lexical order breaks remaining ties
///
/// Ties that survive all three rules mean the same path appears twice,
/// which is an invariant violation surfaced as
/// [`PlanError::AmbiguousSurvivor`] rather than guessed around.
pub fn select_survivor<'a>(
    members: &[&'a MediaFile],
    cache: &MetadataCache,
) -> Result<&'a MediaFile, PlanError> {
    let key = |file: &MediaFile| -> (u8, NaiveDateTime, PathBuf) {
        let origin_rank = match file.origin {
            Origin::Processed => 0,
            Origin::Raw => 1,
        };
        let timestamp = cache
            .timestamp(&file.path)
            .unwrap_or(NaiveDateTime::UNIX_EPOCH);
        (origin_rank, timestamp, file.path.clone())
    };

    let mut ranked: Vec<(&&MediaFile, (u8, NaiveDateTime, PathBuf))> =
        members.iter().map(|f| (f, key(f))).collect();
    ranked.sort_by(|a, b| a.1.cmp(&b.1));

    match ranked.as_slice() {
        [] => Err(PlanError::EmptyInput),
        [(file, _)] => Ok(**file),
        [(first, first_key), (_, second_key), ..] => {
            if first_key == second_key {
                return Err(PlanError::AmbiguousSurvivor {
                    path: first.path.clone(),
                });
            }
            Ok(**first)
        }
    }
}
