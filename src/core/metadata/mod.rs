//! # Metadata Module
//!
//! Resolves the capture timestamp for every file and memoizes the per-file
//! facts the detectors need.
//!
//! ## Timestamp resolution
//! 1. EXIF `DateTimeOriginal`, for image formats that may carry it
//! 2. Fallback: the earliest of filesystem modified and created times
//!
//! Resolution never fails - a file with no usable EXIF simply falls back to
//! filesystem time, which always exists. EXIF parsing is best-effort; a
//! corrupt or vendor-specific EXIF block is treated the same as a missing
//! one.

mod cache;

pub use cache::MetadataCache;

use super::scanner::{MediaFile, Origin};
use chrono::{DateTime, Local, NaiveDateTime};
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::SystemTime;

/// The cheap per-file facts every detection stage consumes
#[derive(Debug, Clone, Copy)]
pub struct FileFacts {
    /// File size in bytes
    pub size: u64,
    /// Resolved capture timestamp
    pub timestamp: NaiveDateTime,
    /// Raw candidate or archived file
    pub origin: Origin,
}

/// Attempt to read EXIF `DateTimeOriginal` from an image file.
///
/// Returns `None` on any failure; the caller falls back to filesystem
/// times.
pub fn extract_date_taken(path: &Path) -> Option<NaiveDateTime> {
    let file = File::open(path).ok()?;
    let mut bufreader = BufReader::new(&file);
    let exif_reader = Reader::new().read_from_container(&mut bufreader).ok()?;

    let field = exif_reader.get_field(Tag::DateTimeOriginal, In::PRIMARY)?;
    if let Value::Ascii(ref vec) = field.value {
        let bytes = vec.first()?;
        let s = std::str::from_utf8(bytes).ok()?;
        // EXIF date format: "YYYY:MM:DD HH:MM:SS"
        return NaiveDateTime::parse_from_str(s.trim(), "%Y:%m:%d %H:%M:%S").ok();
    }

    None
}

/// Resolve the timestamp used for deduplication and naming.
///
/// Images get an EXIF attempt first; everything else (and every EXIF
/// failure) uses the earliest of the filesystem times captured at scan
/// time.
pub fn resolve_timestamp(file: &MediaFile) -> NaiveDateTime {
    if file.is_image() {
        if let Some(taken) = extract_date_taken(&file.path) {
            return taken;
        }
    }

    let mut earliest = file.modified;
    if let Some(created) = file.created {
        if created < earliest {
            earliest = created;
        }
    }

    to_local_naive(earliest)
}

fn to_local_naive(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}
