//! File filtering by extension and visibility.

use std::collections::HashSet;
use std::path::Path;

/// Image formats that may carry EXIF capture metadata.
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp", "heic", "heif",
];

/// Image formats the `image` crate can decode for fingerprinting.
/// HEIC/HEIF are absent: their EXIF is readable but the pixel data is not
/// decodable here, and a doomed decode attempt would flag a healthy file
/// as an error.
const FINGERPRINT_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp"];

/// Whether a (lowercased, dot-free) extension is an image format
pub fn is_image_extension(extension: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&extension)
}

/// Whether an extension can be decoded for perceptual fingerprinting
pub fn can_fingerprint_extension(extension: &str) -> bool {
    FINGERPRINT_EXTENSIONS.contains(&extension)
}

/// Normalize an extension from a path: lowercased, no leading dot
pub fn normalize_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Decides which files enter the evaluation
///
/// The archiver keeps everything except excluded extensions and (by
/// default) hidden files; format support is a concern of later stages.
#[derive(Debug, Clone)]
pub struct MediaFilter {
    excluded: HashSet<String>,
    include_hidden: bool,
}

impl MediaFilter {
    /// Create a filter with no exclusions
    pub fn new() -> Self {
        Self {
            excluded: HashSet::new(),
            include_hidden: false,
        }
    }

    /// Set the excluded extensions (accepted with or without leading dot)
    pub fn with_excluded_extensions(mut self, extensions: &[String]) -> Self {
        self.excluded = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Include hidden files
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Whether the file at `path` should enter the evaluation
    pub fn should_include(&self, path: &Path) -> bool {
        if !self.include_hidden {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    return false;
                }
            }
        }

        !self.excluded.contains(&normalize_extension(path))
    }
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self::new()
    }
}
