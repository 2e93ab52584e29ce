//! # Scanner Module
//!
//! Discovers media files in raw source directories and the processed
//! archive.
//!
//! Unlike a photo-only tool, the archiver accepts any file the user dropped
//! into a raw folder (videos included) and filters by an exclusion list
//! rather than an image allow-list. Two refinements are applied during
//! enumeration:
//! - extensions in the configured exclusion set are dropped (sidecar files
//!   such as `.aae`)
//! - `.mov` clips paired with a `.heic` still of the same stem are Live
//!   Photo companions and can be skipped
//!
//! ## Example
//! ```rust,ignore
//! use photo_archiver::core::scanner::{MediaScanner, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let result = scanner.scan(&["raw".into()], Origin::Raw)?;
//! ```

mod filter;
mod walker;

pub use filter::MediaFilter;
pub use walker::{drop_live_photo_clips, ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

/// Where a file was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// A candidate file from a raw source directory
    Raw,
    /// A file already living in the processed archive
    Processed,
}

/// A discovered media file
///
/// Identity is the absolute source path. Size, extension and filesystem
/// times are resolved eagerly at scan time; everything expensive (capture
/// timestamp, content hash, fingerprint) lives in the [`MetadataCache`].
///
/// [`MetadataCache`]: crate::core::metadata::MetadataCache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFile {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Filesystem modification time
    pub modified: SystemTime,
    /// Filesystem creation time, where the platform reports one
    pub created: Option<SystemTime>,
    /// Lowercased extension without the leading dot, empty if none
    pub extension: String,
    /// Raw candidate or archived file
    pub origin: Origin,
}

impl MediaFile {
    /// File name without the extension
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string()
    }

    /// Whether the extension is an image format (gates the EXIF attempt)
    pub fn is_image(&self) -> bool {
        filter::is_image_extension(&self.extension)
    }

    /// Whether the file can be decoded for perceptual fingerprinting
    ///
    /// A video (or a HEIC still) can be hashed byte-wise but never
    /// fingerprinted, so it is not a similarity candidate.
    pub fn can_fingerprint(&self) -> bool {
        filter::can_fingerprint_extension(&self.extension)
    }
}

/// Result of scanning directories
#[derive(Debug)]
pub struct ScanResult {
    /// Files that were found
    pub files: Vec<MediaFile>,
    /// Non-fatal errors encountered along the way
    pub errors: Vec<ScanError>,
}

/// Trait for media file discovery
pub trait MediaScanner {
    /// Scan the given directories, tagging every file with `origin`
    fn scan(&self, paths: &[PathBuf], origin: Origin) -> Result<ScanResult, ScanError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media_file(path: &str, ext: &str) -> MediaFile {
        MediaFile {
            path: PathBuf::from(path),
            size: 0,
            modified: SystemTime::UNIX_EPOCH,
            created: None,
            extension: ext.to_string(),
            origin: Origin::Raw,
        }
    }

    #[test]
    fn stem_strips_extension() {
        let file = media_file("/raw/IMG_0001.HEIC", "heic");
        assert_eq!(file.stem(), "IMG_0001");
    }

    #[test]
    fn heic_is_an_image() {
        assert!(media_file("/raw/a.heic", "heic").is_image());
    }

    #[test]
    fn mov_is_not_an_image() {
        assert!(!media_file("/raw/a.mov", "mov").is_image());
    }
}
