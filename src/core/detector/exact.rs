//! Exact duplicate detection: size partition, then strong hash.

use super::{select_survivor, DuplicateGroup, MatchMethod};
use crate::core::metadata::MetadataCache;
use crate::core::scanner::MediaFile;
use crate::error::{HashError, PlanError};
use std::collections::BTreeMap;
use tracing::debug;

/// Outcome of the exact-duplicate pass
#[derive(Debug)]
pub struct ExactDetection<'a> {
    /// Hash-equal groups of two or more files
    pub groups: Vec<DuplicateGroup>,
    /// Files not in any group, candidates for the similarity pass
    pub unique: Vec<&'a MediaFile>,
    /// Files whose content could not be read; excluded from grouping
    pub failed: Vec<HashError>,
}

/// Finds byte-identical files across raw and archive sets.
///
/// Hashing is the expensive step, so it only runs inside size-collision
/// groups: a file whose size is unique in the batch can have no exact
/// duplicate and is never read.
pub struct ExactDuplicateDetector;

impl ExactDuplicateDetector {
    pub fn new() -> Self {
        Self
    }

    /// Partition `files` into duplicate groups, unique residue and
    /// unreadable failures.
    pub fn detect<'a>(
        &self,
        files: &'a [MediaFile],
        cache: &MetadataCache,
    ) -> Result<ExactDetection<'a>, PlanError> {
        // BTreeMap keeps group iteration deterministic across runs
        let mut by_size: BTreeMap<u64, Vec<&MediaFile>> = BTreeMap::new();
        for file in files {
            by_size.entry(file.size).or_default().push(file);
        }

        let mut unique: Vec<&MediaFile> = Vec::new();
        let mut collision_members: Vec<&MediaFile> = Vec::new();

        for members in by_size.values() {
            if members.len() == 1 {
                // Size is unique in the batch; no hash needed
                unique.push(members[0]);
            } else {
                collision_members.extend(members.iter().copied());
            }
        }

        debug!(
            collisions = collision_members.len(),
            skipped = unique.len(),
            "hashing size-collision groups"
        );

        // One parallel batch over every collision member
        let failed = cache.ensure_hashes(&collision_members);

        let mut groups = Vec::new();
        for members in by_size.values() {
            if members.len() < 2 {
                continue;
            }

            let mut by_hash: BTreeMap<u128, Vec<&MediaFile>> = BTreeMap::new();
            for file in members {
                // Files that failed hashing stay out of every bucket
                if let Some(hash) = cache.cached_hash(&file.path) {
                    by_hash.entry(hash.value()).or_default().push(file);
                }
            }

            for sub_members in by_hash.values() {
                if sub_members.len() == 1 {
                    unique.push(sub_members[0]);
                    continue;
                }

                let survivor = select_survivor(sub_members, cache)?;
                let duplicates = sub_members
                    .iter()
                    .filter(|f| f.path != survivor.path)
                    .map(|f| f.path.clone())
                    .collect();

                // The survivor itself stays eligible for later stages
                unique.push(survivor);
                groups.push(DuplicateGroup::new(
                    survivor.path.clone(),
                    duplicates,
                    MatchMethod::Exact,
                ));
            }
        }

        unique.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(ExactDetection {
            groups,
            unique,
            failed,
        })
    }
}

impl Default for ExactDuplicateDetector {
    fn default() -> Self {
        Self::new()
    }
}
