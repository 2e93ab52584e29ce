//! Per-file fact cache with memoized hashes and fingerprints.

use super::{resolve_timestamp, FileFacts};
use crate::core::hasher::{self, ContentHash, Fingerprint};
use crate::core::scanner::MediaFile;
use crate::error::HashError;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Memoizes everything the detectors ask about a file.
///
/// Facts (size, timestamp, origin) are cheap and populated eagerly for the
/// whole batch; content hashes and perceptual fingerprints are expensive and
/// computed at most once, on demand, for the files the detectors actually
/// select. Entries are write-once: a value stored for a path is never
/// replaced, so concurrent population cannot produce torn or flip-flopping
/// reads.
///
/// The cache holds no state beyond its own maps; dropping it discards
/// everything.
pub struct MetadataCache {
    facts: RwLock<HashMap<PathBuf, FileFacts>>,
    hashes: RwLock<HashMap<PathBuf, ContentHash>>,
    fingerprints: RwLock<HashMap<PathBuf, Fingerprint>>,
}

impl MetadataCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            facts: RwLock::new(HashMap::new()),
            hashes: RwLock::new(HashMap::new()),
            fingerprints: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve facts for the whole batch in parallel.
    ///
    /// Timestamp resolution reads EXIF headers, so this is I/O bound and
    /// worth spreading across the worker pool. Already-known paths keep
    /// their stored facts.
    pub fn populate_facts(&self, files: &[MediaFile]) {
        let resolved: Vec<(PathBuf, FileFacts)> = files
            .par_iter()
            .map(|file| {
                (
                    file.path.clone(),
                    FileFacts {
                        size: file.size,
                        timestamp: resolve_timestamp(file),
                        origin: file.origin,
                    },
                )
            })
            .collect();

        let mut facts = self
            .facts
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for (path, value) in resolved {
            facts.entry(path).or_insert(value);
        }
    }

    /// Facts for a single path, if populated
    pub fn facts(&self, path: &Path) -> Option<FileFacts> {
        self.facts
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(path)
            .copied()
    }

    /// Resolved timestamp for a single path, if populated
    pub fn timestamp(&self, path: &Path) -> Option<chrono::NaiveDateTime> {
        self.facts(path).map(|f| f.timestamp)
    }

    /// Strong hash of a file, computed at most once
    pub fn hash(&self, file: &MediaFile) -> Result<ContentHash, HashError> {
        if let Some(hash) = self.cached_hash(&file.path) {
            return Ok(hash);
        }

        let computed = hasher::hash_file(&file.path)?;
        let mut hashes = self
            .hashes
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // First writer wins; a raced recomputation yields the same value
        Ok(*hashes.entry(file.path.clone()).or_insert(computed))
    }

    /// Perceptual fingerprint of a file, computed at most once
    pub fn fingerprint(&self, file: &MediaFile) -> Result<Fingerprint, HashError> {
        if let Some(print) = self.cached_fingerprint(&file.path) {
            return Ok(print);
        }

        let computed = hasher::fingerprint_file(&file.path)?;
        let mut prints = self
            .fingerprints
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(prints.entry(file.path.clone()).or_insert(computed).clone())
    }

    /// Compute hashes for many files in parallel, returning the failures.
    ///
    /// Each file is handled by exactly one worker, so no hash is computed
    /// twice. Failed files stay absent from the cache.
    pub fn ensure_hashes(&self, files: &[&MediaFile]) -> Vec<HashError> {
        files
            .par_iter()
            .filter_map(|file| self.hash(file).err())
            .collect()
    }

    /// Compute fingerprints for many files in parallel, returning the
    /// failures
    pub fn ensure_fingerprints(&self, files: &[&MediaFile]) -> Vec<HashError> {
        files
            .par_iter()
            .filter_map(|file| self.fingerprint(file).err())
            .collect()
    }

    /// Previously computed hash, without triggering computation
    pub fn cached_hash(&self, path: &Path) -> Option<ContentHash> {
        self.hashes
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(path)
            .copied()
    }

    /// Previously computed fingerprint, without triggering computation
    pub fn cached_fingerprint(&self, path: &Path) -> Option<Fingerprint> {
        self.fingerprints
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    /// Store a fingerprint directly (cache restoration and tests)
    pub fn insert_fingerprint(&self, path: PathBuf, print: Fingerprint) {
        self.fingerprints
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entry(path)
            .or_insert(print);
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new()
    }
}
