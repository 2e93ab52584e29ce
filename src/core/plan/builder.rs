//! Composes scanning, detection and naming into the evaluation plan.

use super::{conversion_target, EvaluationPlan, EvaluationRecord, RecordStatus};
use crate::core::detector::{ExactDuplicateDetector, SimilarityConfig, SimilarityDetector};
use crate::core::metadata::MetadataCache;
use crate::core::naming::{NameRequest, NamingAssigner, SequenceCounter};
use crate::core::scanner::{MediaFile, MediaScanner, Origin, ScanConfig, WalkDirScanner};
use crate::error::{PlanError, ScanError};
use chrono::Datelike;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tracing::info;

/// Everything an evaluation run needs to know
#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    /// Raw source directories
    pub raw_dirs: Vec<PathBuf>,
    /// Root of the processed archive
    pub archive_dir: PathBuf,
    /// Scanner options (exclusions, Live Photo skip, hidden files)
    pub scan: ScanConfig,
    /// Similarity thresholds
    pub similarity: SimilarityConfig,
}

/// An evaluation plan plus the non-fatal noise collected along the way
#[derive(Debug)]
pub struct EvaluationOutcome {
    pub plan: EvaluationPlan,
    pub scan_errors: Vec<ScanError>,
}

/// Builds one ordered [`EvaluationRecord`] per raw file.
///
/// Composition order matches the data flow: facts for everything, exact
/// dedup over raw ∪ archive, similarity over the residue, names for
/// whatever is still pending.
pub struct EvaluationPlanBuilder {
    similarity: SimilarityConfig,
}

impl EvaluationPlanBuilder {
    pub fn new(similarity: SimilarityConfig) -> Self {
        Self { similarity }
    }

    /// Scan the configured directories and build the plan.
    ///
    /// A missing raw directory is recorded and skipped; a missing archive
    /// simply yields no processed files (first run). Only a scan that fails
    /// outright is fatal.
    pub fn evaluate(config: &EvaluationConfig) -> crate::error::Result<EvaluationOutcome> {
        let raw_scanner = WalkDirScanner::new(config.scan.clone());
        let mut scan_errors = Vec::new();

        let raw_result = raw_scanner.scan(&config.raw_dirs, Origin::Raw)?;
        scan_errors.extend(raw_result.errors);
        let raw = raw_result.files;

        // The archive scan never applies Live Photo skipping and ignores a
        // missing directory entirely
        let archive_scan = ScanConfig {
            skip_live_photo_clips: false,
            ..config.scan.clone()
        };
        let archive_scanner = WalkDirScanner::new(archive_scan);
        let archive = if config.archive_dir.exists() {
            let result = archive_scanner
                .scan(std::slice::from_ref(&config.archive_dir), Origin::Processed)?;
            scan_errors.extend(result.errors);
            result.files
        } else {
            Vec::new()
        };

        info!(
            raw = raw.len(),
            archive = archive.len(),
            "scanned input sets"
        );

        let mut files = raw;
        files.extend(archive);

        let cache = MetadataCache::new();
        let builder = EvaluationPlanBuilder::new(config.similarity.clone());
        let plan = builder.build(&files, &cache)?;

        Ok(EvaluationOutcome { plan, scan_errors })
    }

    /// Build the plan for an already-scanned file set.
    ///
    /// `files` holds raw candidates and archived files together, told apart
    /// by their origin tag. Records are emitted for raw files only;
    /// archived files anchor duplicate groups and seed the name counters.
    pub fn build(
        &self,
        files: &[MediaFile],
        cache: &MetadataCache,
    ) -> Result<EvaluationPlan, PlanError> {
        cache.populate_facts(files);

        // Tier 1: exact duplicates across raw ∪ archive
        let exact = ExactDuplicateDetector::new().detect(files, cache)?;

        // Tier 2: perceptual similarity over the exact-unique residue
        let similar = SimilarityDetector::new(self.similarity.clone()).detect(&exact.unique, cache)?;

        // Fold both tiers into per-path decisions
        let mut duplicate_of: HashMap<PathBuf, PathBuf> = HashMap::new();
        for group in exact.groups.iter().chain(similar.groups.iter()) {
            for duplicate in &group.duplicates {
                duplicate_of.insert(duplicate.clone(), group.survivor.clone());
            }
        }

        let unreadable: HashSet<PathBuf> = exact
            .failed
            .iter()
            .chain(similar.failed.iter())
            .map(|e| e.path().clone())
            .collect();

        // Seed name counters from the archive, then name the pending raws
        let archive_files: Vec<MediaFile> = files
            .iter()
            .filter(|f| f.origin == Origin::Processed)
            .cloned()
            .collect();
        let mut counter = SequenceCounter::seed_from_archive(&archive_files);

        let pending_requests: Vec<NameRequest> = files
            .iter()
            .filter(|f| f.origin == Origin::Raw)
            .filter(|f| !duplicate_of.contains_key(&f.path) && !unreadable.contains(&f.path))
            .map(|f| {
                let timestamp = cache
                    .timestamp(&f.path)
                    .unwrap_or(chrono::NaiveDateTime::UNIX_EPOCH);
                let (target_extension, _) = conversion_target(&f.extension);
                NameRequest {
                    path: f.path.clone(),
                    timestamp,
                    target_extension,
                }
            })
            .collect();

        let assigned = NamingAssigner::assign(pending_requests, &mut counter);
        let assigned_by_path: HashMap<PathBuf, _> = assigned
            .into_iter()
            .map(|a| (a.path.clone(), a))
            .collect();

        // One record per raw file, ordered chronologically
        let mut records: Vec<EvaluationRecord> = files
            .iter()
            .filter(|f| f.origin == Origin::Raw)
            .map(|f| {
                let timestamp = cache
                    .timestamp(&f.path)
                    .unwrap_or(chrono::NaiveDateTime::UNIX_EPOCH);
                let (_, convert) = conversion_target(&f.extension);

                let (status, target_name, duplicate_target, import) =
                    if unreadable.contains(&f.path) {
                        (RecordStatus::Error, None, None, false)
                    } else if let Some(survivor) = duplicate_of.get(&f.path) {
                        (RecordStatus::Duplicate, None, Some(survivor.clone()), false)
                    } else {
                        let name = assigned_by_path
                            .get(&f.path)
                            .map(|a| a.file_name.clone());
                        (RecordStatus::Pending, name, None, true)
                    };

                EvaluationRecord {
                    source: f.path.clone(),
                    timestamp,
                    target_year: timestamp.year(),
                    target_name,
                    status,
                    duplicate_of: duplicate_target,
                    convert,
                    import,
                }
            })
            .collect();

        records.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.source.cmp(&b.source))
        });

        info!(
            total = records.len(),
            pending = records.iter().filter(|r| r.status == RecordStatus::Pending).count(),
            duplicates = duplicate_of.len(),
            errors = unreadable.len(),
            "evaluation plan built"
        );

        Ok(EvaluationPlan { records })
    }
}
