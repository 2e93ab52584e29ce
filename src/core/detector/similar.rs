//! Perceptual similarity detection over the exact-unique residue.
//!
//! Catches visually-identical but byte-different files, typically an
//! original next to a re-compressed export. Fingerprinting is the expensive
//! step, so a pair must pass two cheap filters first:
//!
//! - **size class**: one side below the "compressed" ceiling, the other
//!   above the "original" floor. Two originals (or two compressed copies)
//!   are never compared.
//! - **date proximity**: resolved timestamps within a configurable window.
//!
//! The remaining comparison is O(n²) over the candidates; after exact
//! dedup has removed most volume the candidate set is small enough that
//! the filters are the only mitigation needed.

use super::{select_survivor, DuplicateGroup, MatchMethod};
use crate::core::metadata::MetadataCache;
use crate::core::scanner::MediaFile;
use crate::error::{HashError, PlanError};
use chrono::Duration;
use std::collections::HashSet;
use tracing::debug;

/// Thresholds for similarity candidacy and matching
#[derive(Debug, Clone)]
pub struct SimilarityConfig {
    /// Size ceiling for the "compressed" side of a candidate pair
    pub compressed_max_bytes: u64,
    /// Size floor for the "original" side of a candidate pair
    pub original_min_bytes: u64,
    /// Maximum timestamp distance for a candidate pair, in days
    pub date_window_days: i64,
    /// Maximum Hamming distance for two fingerprints to match
    pub distance_threshold: u32,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            compressed_max_bytes: 1_000_000,
            original_min_bytes: 1_200_000,
            date_window_days: 10,
            distance_threshold: 8,
        }
    }
}

impl SimilarityConfig {
    /// Size-class filter: exactly one side looks like a re-compression of
    /// the other
    pub fn is_size_class_pair(&self, a: u64, b: u64) -> bool {
        (a < self.compressed_max_bytes && b > self.original_min_bytes)
            || (b < self.compressed_max_bytes && a > self.original_min_bytes)
    }

    /// Date-proximity filter, inclusive of the window boundary
    pub fn within_date_window(
        &self,
        a: chrono::NaiveDateTime,
        b: chrono::NaiveDateTime,
    ) -> bool {
        let delta = if a > b { a - b } else { b - a };
        delta <= Duration::days(self.date_window_days)
    }
}

/// Outcome of the similarity pass
#[derive(Debug)]
pub struct SimilarDetection {
    /// Visually-matching groups of two or more files
    pub groups: Vec<DuplicateGroup>,
    /// Files whose fingerprint could not be computed
    pub failed: Vec<HashError>,
}

/// Finds visually-matching pairs among files the exact pass left unique
pub struct SimilarityDetector {
    config: SimilarityConfig,
}

impl SimilarityDetector {
    pub fn new(config: SimilarityConfig) -> Self {
        Self { config }
    }

    /// Detect similar files among `files` (the exact-unique residue).
    ///
    /// Only fingerprintable files that survive both candidate filters are
    /// ever decoded; a file shared across many candidate pairs is
    /// fingerprinted once via the cache.
    pub fn detect<'a>(
        &self,
        files: &[&'a MediaFile],
        cache: &MetadataCache,
    ) -> Result<SimilarDetection, PlanError> {
        let mut candidates: Vec<&MediaFile> = files
            .iter()
            .copied()
            .filter(|f| f.can_fingerprint())
            .collect();
        candidates.sort_by(|a, b| a.path.cmp(&b.path));

        // Pairs passing both cheap filters, by candidate index
        let mut pairs: Vec<(usize, usize)> = Vec::new();
        for i in 0..candidates.len() {
            for j in (i + 1)..candidates.len() {
                let (fa, fb) = match (
                    cache.facts(&candidates[i].path),
                    cache.facts(&candidates[j].path),
                ) {
                    (Some(fa), Some(fb)) => (fa, fb),
                    _ => continue,
                };

                if self.config.is_size_class_pair(fa.size, fb.size)
                    && self.config.within_date_window(fa.timestamp, fb.timestamp)
                {
                    pairs.push((i, j));
                }
            }
        }

        if pairs.is_empty() {
            return Ok(SimilarDetection {
                groups: Vec::new(),
                failed: Vec::new(),
            });
        }

        // Fingerprint only the files that appear in a surviving pair
        let mut needed_indices: Vec<usize> = pairs
            .iter()
            .flat_map(|&(i, j)| [i, j])
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        needed_indices.sort_unstable();
        let needed: Vec<&MediaFile> = needed_indices.iter().map(|&i| candidates[i]).collect();

        debug!(
            candidates = candidates.len(),
            pairs = pairs.len(),
            fingerprinting = needed.len(),
            "similarity candidate filtering done"
        );

        let failed = cache.ensure_fingerprints(&needed);
        let failed_paths: HashSet<_> = failed.iter().map(|e| e.path().clone()).collect();

        // Union-find over candidate indices; matching pairs merge
        let mut parent: Vec<usize> = (0..candidates.len()).collect();
        fn find(parent: &mut Vec<usize>, x: usize) -> usize {
            if parent[x] != x {
                let up = parent[x];
                let root = find(parent, up);
                parent[x] = root;
            }
            parent[x]
        }

        for &(i, j) in &pairs {
            if failed_paths.contains(&candidates[i].path)
                || failed_paths.contains(&candidates[j].path)
            {
                continue;
            }
            let (pa, pb) = (
                cache.cached_fingerprint(&candidates[i].path),
                cache.cached_fingerprint(&candidates[j].path),
            );
            if let (Some(pa), Some(pb)) = (pa, pb) {
                if pa.distance(&pb) <= self.config.distance_threshold {
                    let (ra, rb) = (find(&mut parent, i), find(&mut parent, j));
                    if ra != rb {
                        parent[ra] = rb;
                    }
                }
            }
        }

        // Collect components of two or more members
        let mut components: Vec<Vec<&MediaFile>> = vec![Vec::new(); candidates.len()];
        for i in 0..candidates.len() {
            let root = find(&mut parent, i);
            components[root].push(candidates[i]);
        }

        let mut groups = Vec::new();
        for members in components.into_iter().filter(|c| c.len() >= 2) {
            let survivor = select_survivor(&members, cache)?;
            let duplicates = members
                .iter()
                .filter(|f| f.path != survivor.path)
                .map(|f| f.path.clone())
                .collect();
            groups.push(DuplicateGroup::new(
                survivor.path.clone(),
                duplicates,
                MatchMethod::Similar,
            ));
        }

        Ok(SimilarDetection { groups, failed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::Fingerprint;
    use crate::core::scanner::Origin;
    use chrono::NaiveDate;
    use std::path::PathBuf;
    use std::time::{Duration as StdDuration, SystemTime};

    fn media_file(path: &str, size: u64, day: u32) -> MediaFile {
        let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let secs = date.and_hms_opt(12, 0, 0).unwrap().and_utc().timestamp() as u64;
        MediaFile {
            path: PathBuf::from(path),
            size,
            modified: SystemTime::UNIX_EPOCH + StdDuration::from_secs(secs),
            created: None,
            // png avoids an EXIF probe of nonexistent paths; resolution
            // falls back to the injected modified time either way
            extension: "png".to_string(),
            origin: Origin::Raw,
        }
    }

    fn detect_with_prints(
        files: &[MediaFile],
        prints: &[(&MediaFile, &[u8])],
    ) -> SimilarDetection {
        let cache = MetadataCache::new();
        cache.populate_facts(files);
        for (file, bytes) in prints {
            cache.insert_fingerprint(file.path.clone(), Fingerprint::from_bytes(bytes));
        }
        let refs: Vec<&MediaFile> = files.iter().collect();
        SimilarityDetector::new(SimilarityConfig::default())
            .detect(&refs, &cache)
            .unwrap()
    }

    #[test]
    fn default_thresholds() {
        let config = SimilarityConfig::default();
        assert_eq!(config.compressed_max_bytes, 1_000_000);
        assert_eq!(config.original_min_bytes, 1_200_000);
        assert_eq!(config.date_window_days, 10);
        assert_eq!(config.distance_threshold, 8);
    }

    #[test]
    fn two_originals_are_never_a_candidate_pair() {
        let config = SimilarityConfig::default();
        // 2 MB and 2.1 MB: both in the "original" class
        assert!(!config.is_size_class_pair(2_000_000, 2_100_000));
    }

    #[test]
    fn compressed_against_original_is_a_candidate_pair() {
        let config = SimilarityConfig::default();
        assert!(config.is_size_class_pair(300_000, 1_500_000));
        assert!(config.is_size_class_pair(1_500_000, 300_000));
    }

    #[test]
    fn two_compressed_files_are_not_a_candidate_pair() {
        let config = SimilarityConfig::default();
        assert!(!config.is_size_class_pair(300_000, 400_000));
    }

    #[test]
    fn date_window_is_inclusive() {
        let config = SimilarityConfig::default();
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(config.within_date_window(base, base + Duration::days(10)));
        assert!(!config.within_date_window(base, base + Duration::days(10) + Duration::seconds(1)));
    }

    #[test]
    fn matching_pair_forms_a_group() {
        let original = media_file("/raw/original.png", 1_500_000, 1);
        let compressed = media_file("/raw/compressed.png", 300_000, 3);
        let files = vec![original.clone(), compressed.clone()];

        let result = detect_with_prints(
            &files,
            &[(&original, &[0xAB; 8]), (&compressed, &[0xAB; 8])],
        );

        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].method, MatchMethod::Similar);
        // Earlier timestamp survives
        assert_eq!(result.groups[0].survivor, original.path);
        assert_eq!(result.groups[0].duplicates, vec![compressed.path]);
    }

    #[test]
    fn outside_date_window_is_never_fingerprinted() {
        let original = media_file("/raw/original.png", 1_500_000, 1);
        let compressed = media_file("/raw/compressed.png", 300_000, 12); // 11 days apart
        let files = vec![original, compressed];

        let cache = MetadataCache::new();
        cache.populate_facts(&files);
        let refs: Vec<&MediaFile> = files.iter().collect();
        let result = SimilarityDetector::new(SimilarityConfig::default())
            .detect(&refs, &cache)
            .unwrap();

        assert!(result.groups.is_empty());
        // No fingerprint computation was even attempted (the paths do not
        // exist, so an attempt would have surfaced in `failed`)
        assert!(result.failed.is_empty());
    }

    #[test]
    fn same_size_class_is_never_fingerprinted() {
        let a = media_file("/raw/a.png", 2_000_000, 1);
        let b = media_file("/raw/b.png", 2_100_000, 1);
        let files = vec![a, b];

        let cache = MetadataCache::new();
        cache.populate_facts(&files);
        let refs: Vec<&MediaFile> = files.iter().collect();
        let result = SimilarityDetector::new(SimilarityConfig::default())
            .detect(&refs, &cache)
            .unwrap();

        assert!(result.groups.is_empty());
        assert!(result.failed.is_empty());
    }

    #[test]
    fn distant_fingerprints_do_not_group() {
        let original = media_file("/raw/original.png", 1_500_000, 1);
        let compressed = media_file("/raw/compressed.png", 300_000, 2);
        let files = vec![original.clone(), compressed.clone()];

        let result = detect_with_prints(
            &files,
            &[(&original, &[0xFF; 8]), (&compressed, &[0x00; 8])],
        );

        assert!(result.groups.is_empty());
    }

    #[test]
    fn videos_are_not_candidates() {
        let mut video = media_file("/raw/clip.mov", 1_500_000, 1);
        video.extension = "mov".to_string();
        let compressed = media_file("/raw/photo.png", 300_000, 1);
        let files = vec![video, compressed];

        let cache = MetadataCache::new();
        cache.populate_facts(&files);
        let refs: Vec<&MediaFile> = files.iter().collect();
        let result = SimilarityDetector::new(SimilarityConfig::default())
            .detect(&refs, &cache)
            .unwrap();

        assert!(result.groups.is_empty());
        assert!(result.failed.is_empty());
    }

    #[test]
    fn fingerprint_failure_is_reported_and_excluded() {
        // Candidate pair over nonexistent paths: the fingerprint attempt
        // fails and both files drop out of grouping
        let original = media_file("/raw/original.png", 1_500_000, 1);
        let compressed = media_file("/raw/compressed.png", 300_000, 2);
        let files = vec![original, compressed];

        let cache = MetadataCache::new();
        cache.populate_facts(&files);
        let refs: Vec<&MediaFile> = files.iter().collect();
        let result = SimilarityDetector::new(SimilarityConfig::default())
            .detect(&refs, &cache)
            .unwrap();

        assert_eq!(result.failed.len(), 2);
        assert!(result.groups.is_empty());
    }

    #[test]
    fn transitive_matches_merge_into_one_group() {
        let a = media_file("/raw/a.png", 1_500_000, 1);
        let b = media_file("/raw/b.png", 300_000, 2);
        let c = media_file("/raw/c.png", 1_600_000, 3);
        let files = vec![a.clone(), b.clone(), c.clone()];

        // a~b and b~c match pairwise; a and c never form a direct pair
        // (both originals) but land in the same group transitively
        let result = detect_with_prints(
            &files,
            &[(&a, &[0xAB; 8]), (&b, &[0xAB; 8]), (&c, &[0xAB; 8])],
        );

        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].duplicate_count(), 2);
        assert_eq!(result.groups[0].survivor, a.path);
    }
}
