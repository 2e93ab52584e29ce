//! Directory walking implementation using walkdir.

use super::{filter::normalize_extension, MediaFile, MediaFilter, MediaScanner, Origin, ScanResult};
use crate::error::ScanError;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tracing::warn;
use walkdir::WalkDir;

/// Configuration for the directory scanner
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Extensions to exclude from evaluation (e.g. `.aae` sidecars)
    pub excluded_extensions: Vec<String>,
    /// Skip `.mov` clips paired with a `.heic` still of the same stem
    pub skip_live_photo_clips: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: false,
            max_depth: None,
            excluded_extensions: vec![".aae".to_string()],
            skip_live_photo_clips: true,
        }
    }
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: MediaFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let filter = MediaFilter::new()
            .with_excluded_extensions(&config.excluded_extensions)
            .with_hidden(config.include_hidden);

        Self { config, filter }
    }

    fn scan_directory(
        &self,
        root: &PathBuf,
        origin: Origin,
    ) -> Result<(Vec<MediaFile>, Vec<ScanError>), ScanError> {
        if !root.exists() || !root.is_dir() {
            return Err(ScanError::DirectoryNotFound { path: root.clone() });
        }

        let mut files = Vec::new();
        let mut errors = Vec::new();

        let mut walker = WalkDir::new(root).follow_links(self.config.follow_symlinks);
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        for entry_result in walker {
            match entry_result {
                Ok(entry) => {
                    let path = entry.path();

                    if path.is_dir() {
                        if !self.config.include_hidden {
                            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                                if name.starts_with('.') && path != root.as_path() {
                                    continue;
                                }
                            }
                        }
                        continue;
                    }

                    if !self.filter.should_include(path) {
                        continue;
                    }

                    match fs::metadata(path) {
                        Ok(metadata) => {
                            files.push(MediaFile {
                                path: path.to_path_buf(),
                                size: metadata.len(),
                                modified: metadata
                                    .modified()
                                    .unwrap_or(std::time::SystemTime::UNIX_EPOCH),
                                created: metadata.created().ok(),
                                extension: normalize_extension(path),
                                origin,
                            });
                        }
                        Err(e) => {
                            errors.push(ScanError::ReadDirectory {
                                path: path.to_path_buf(),
                                source: e,
                            });
                        }
                    }
                }
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    let error = if e.io_error().map(|e| e.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path }
                    } else {
                        ScanError::ReadDirectory {
                            path,
                            source: std::io::Error::other(e.to_string()),
                        }
                    };
                    errors.push(error);
                }
            }
        }

        Ok((files, errors))
    }
}

impl MediaScanner for WalkDirScanner {
    fn scan(&self, paths: &[PathBuf], origin: Origin) -> Result<ScanResult, ScanError> {
        let mut all_files = Vec::new();
        let mut all_errors = Vec::new();

        for path in paths {
            match self.scan_directory(path, origin) {
                Ok((files, errors)) => {
                    all_files.extend(files);
                    all_errors.extend(errors);
                }
                Err(e) => {
                    // A missing raw folder is a warning, not a fatal error
                    warn!("skipping {}: {}", path.display(), e);
                    all_errors.push(e);
                }
            }
        }

        if self.config.skip_live_photo_clips && origin == Origin::Raw {
            all_files = drop_live_photo_clips(all_files);
        }

        Ok(ScanResult {
            files: all_files,
            errors: all_errors,
        })
    }
}

/// Drop `.mov` files whose stem matches a `.heic` still in the same set.
///
/// iPhones store a Live Photo as a HEIC still plus a short MOV clip with
/// the same stem; archiving both would double every Live Photo.
pub fn drop_live_photo_clips(files: Vec<MediaFile>) -> Vec<MediaFile> {
    let heic_stems: HashSet<String> = files
        .iter()
        .filter(|f| f.extension == "heic")
        .map(|f| f.stem())
        .collect();

    files
        .into_iter()
        .filter(|f| !(f.extension == "mov" && heic_stems.contains(&f.stem())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_file(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(b"content").unwrap();
        path
    }

    #[test]
    fn scan_empty_directory_returns_empty_vec() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = WalkDirScanner::new(ScanConfig::default());

        let result = scanner
            .scan(&[temp_dir.path().to_path_buf()], Origin::Raw)
            .unwrap();

        assert!(result.files.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn scan_finds_files_with_metadata() {
        let temp_dir = TempDir::new().unwrap();
        create_file(&temp_dir, "photo.JPG");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner
            .scan(&[temp_dir.path().to_path_buf()], Origin::Raw)
            .unwrap();

        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].extension, "jpg");
        assert_eq!(result.files[0].size, 7);
        assert_eq!(result.files[0].origin, Origin::Raw);
    }

    #[test]
    fn scan_traverses_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        create_file(&temp_dir, "root.jpg");
        let subdir = temp_dir.path().join("2023");
        fs::create_dir(&subdir).unwrap();
        File::create(subdir.join("nested.png")).unwrap();

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner
            .scan(&[temp_dir.path().to_path_buf()], Origin::Raw)
            .unwrap();

        assert_eq!(result.files.len(), 2);
    }

    #[test]
    fn scan_applies_exclusion_list() {
        let temp_dir = TempDir::new().unwrap();
        create_file(&temp_dir, "photo.jpg");
        create_file(&temp_dir, "edits.aae");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner
            .scan(&[temp_dir.path().to_path_buf()], Origin::Raw)
            .unwrap();

        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].path.ends_with("photo.jpg"));
    }

    #[test]
    fn scan_nonexistent_directory_records_error() {
        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner
            .scan(&[PathBuf::from("/nonexistent/path/12345")], Origin::Raw)
            .unwrap();

        assert!(result.files.is_empty());
        assert!(!result.errors.is_empty());
    }

    #[test]
    fn live_photo_clip_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        create_file(&temp_dir, "IMG_0001.heic");
        create_file(&temp_dir, "IMG_0001.mov");
        create_file(&temp_dir, "IMG_0002.mov");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner
            .scan(&[temp_dir.path().to_path_buf()], Origin::Raw)
            .unwrap();

        let names: Vec<String> = result
            .files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert!(names.contains(&"IMG_0001.heic".to_string()));
        assert!(!names.contains(&"IMG_0001.mov".to_string()));
        // An unpaired clip is a plain video, not a Live Photo companion
        assert!(names.contains(&"IMG_0002.mov".to_string()));
    }

    #[test]
    fn live_photo_clips_kept_when_disabled() {
        let temp_dir = TempDir::new().unwrap();
        create_file(&temp_dir, "IMG_0001.heic");
        create_file(&temp_dir, "IMG_0001.mov");

        let config = ScanConfig {
            skip_live_photo_clips: false,
            ..Default::default()
        };
        let scanner = WalkDirScanner::new(config);
        let result = scanner
            .scan(&[temp_dir.path().to_path_buf()], Origin::Raw)
            .unwrap();

        assert_eq!(result.files.len(), 2);
    }
}
