//! # Naming Module
//!
//! Deterministic chronological names for imported files.
//!
//! Names have the form `YYYYMMDD_NNN.ext`: the calendar date of the
//! resolved timestamp plus a 1-based, zero-padded sequence unique within
//! that date. The year component decides the archive folder
//! (`processed/YYYY/`).
//!
//! Sequence counters are seeded by parsing the names already present in
//! the archive, so a re-run never reissues a name an earlier import used.
//! Within one run, assignment order is (timestamp, path) ascending, which
//! makes the whole assignment reproducible for an unchanged input set.

use crate::core::scanner::MediaFile;
use chrono::{Datelike, NaiveDateTime};
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

fn archive_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{8})_(\d{3,})$").expect("valid archive name pattern"))
}

/// Next available sequence number per date key (`YYYYMMDD`)
///
/// Within one date, issued numbers are a contiguous ascending run; numbers
/// are never reused once issued, and seeding places the run above anything
/// already in the archive.
#[derive(Debug, Default)]
pub struct SequenceCounter {
    last_issued: HashMap<String, u32>,
}

impl SequenceCounter {
    /// A counter with every date starting at 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from files already in the processed archive.
    ///
    /// Parses `YYYYMMDD_NNN` stems; anything else in the archive is
    /// ignored.
    pub fn seed_from_archive(files: &[MediaFile]) -> Self {
        let mut counter = Self::new();
        for file in files {
            counter.observe_existing(&file.stem());
        }
        counter
    }

    /// Record an existing archive name so its number is never reissued
    pub fn observe_existing(&mut self, stem: &str) {
        if let Some(captures) = archive_name_pattern().captures(stem) {
            let date_key = captures[1].to_string();
            if let Ok(number) = captures[2].parse::<u32>() {
                let entry = self.last_issued.entry(date_key).or_insert(0);
                *entry = (*entry).max(number);
            }
        }
    }

    /// Issue the next sequence number for a date key
    pub fn next(&mut self, date_key: &str) -> u32 {
        let entry = self.last_issued.entry(date_key.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Highest number issued or observed for a date key
    pub fn current(&self, date_key: &str) -> Option<u32> {
        self.last_issued.get(date_key).copied()
    }
}

/// A request for one name: who, when, and the target extension
#[derive(Debug, Clone)]
pub struct NameRequest {
    /// Source file identity
    pub path: PathBuf,
    /// Resolved capture timestamp
    pub timestamp: NaiveDateTime,
    /// Extension the archived file will carry (post conversion mapping)
    pub target_extension: String,
}

/// One assigned archive name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedName {
    /// Source file identity
    pub path: PathBuf,
    /// Date key the sequence was drawn from (`YYYYMMDD`)
    pub date_key: String,
    /// Archive folder grouping key
    pub year: i32,
    /// Issued sequence number
    pub sequence: u32,
    /// Full target file name, e.g. `20240101_001.jpg`
    pub file_name: String,
}

/// Assigns chronological names to the pending files of one evaluation
pub struct NamingAssigner;

impl NamingAssigner {
    /// Assign names for every request, in chronological order.
    ///
    /// Requests are ordered by (timestamp, path) before any number is
    /// issued, so the same input set always produces the same names.
    pub fn assign(mut requests: Vec<NameRequest>, counter: &mut SequenceCounter) -> Vec<AssignedName> {
        requests.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.path.cmp(&b.path))
        });

        requests
            .into_iter()
            .map(|request| {
                let date = request.timestamp.date();
                let date_key = date.format("%Y%m%d").to_string();
                let sequence = counter.next(&date_key);
                let file_name = format!(
                    "{}_{:03}.{}",
                    date_key, sequence, request.target_extension
                );

                AssignedName {
                    path: request.path,
                    date_key,
                    year: date.year(),
                    sequence,
                    file_name,
                }
            })
            .collect()
    }
}
