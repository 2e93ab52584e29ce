//! # Execute Module
//!
//! The processing stage: act on a previously written evaluation log.
//!
//! - `pending` rows are imported into `processed/YYYY/` under their
//!   assigned names, converting HEIC/MOV via `ffmpeg` when flagged
//! - `duplicate` rows are moved into a holding folder when one is
//!   configured; nothing is ever deleted
//! - every other row is left untouched
//!
//! Per-row failures update that row's status and never abort the batch;
//! the rewritten log is the record of what happened.

use crate::core::export::{read_log_file, write_log_file};
use crate::core::plan::{EvaluationRecord, RecordStatus};
use crate::error::{ProcessError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{info, warn};

/// Options for a processing run
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Evaluation log written by a prior evaluation run
    pub log_path: PathBuf,
    /// Root of the processed archive (`processed/YYYY/` is created below)
    pub processed_dir: PathBuf,
    /// Holding folder for duplicate sources; `None` leaves duplicates
    /// in place
    pub duplicates_dir: Option<PathBuf>,
}

/// Tally of one processing run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessReport {
    /// Pending rows imported by plain copy
    pub copied: usize,
    /// Pending rows imported through format conversion
    pub converted: usize,
    /// Duplicate sources moved into the holding folder
    pub duplicates_moved: usize,
    /// Rows that failed and were marked with an error status
    pub failed: usize,
    /// Rows that required no action
    pub skipped: usize,
}

/// Execute the evaluation log.
///
/// Reads the log, performs each actionable row, and rewrites the log with
/// updated statuses so a re-run picks up only what is still pending.
pub fn process(options: &ProcessOptions) -> Result<ProcessReport> {
    if !options.log_path.exists() {
        return Err(ProcessError::LogNotFound {
            path: options.log_path.clone(),
        }
        .into());
    }

    let mut records = read_log_file(&options.log_path)?;
    let mut report = ProcessReport::default();

    for record in &mut records {
        match record.status {
            RecordStatus::Pending if record.import => {
                match import_record(record, &options.processed_dir) {
                    Ok(converted) => {
                        record.status = RecordStatus::Done;
                        if converted {
                            report.converted += 1;
                        } else {
                            report.copied += 1;
                        }
                    }
                    Err(e) => {
                        warn!("import failed: {e}");
                        record.status = RecordStatus::Error;
                        report.failed += 1;
                    }
                }
            }
            RecordStatus::Duplicate => {
                if let Some(holding) = &options.duplicates_dir {
                    match move_aside(&record.source, holding) {
                        Ok(()) => report.duplicates_moved += 1,
                        Err(e) => {
                            warn!("duplicate move failed: {e}");
                            report.failed += 1;
                        }
                    }
                } else {
                    report.skipped += 1;
                }
            }
            _ => report.skipped += 1,
        }
    }

    write_log_file(&records, &options.log_path)?;

    info!(
        copied = report.copied,
        converted = report.converted,
        duplicates_moved = report.duplicates_moved,
        failed = report.failed,
        "processing complete"
    );

    Ok(report)
}

/// Import one pending record; returns whether a conversion ran
fn import_record(record: &EvaluationRecord, processed_dir: &Path) -> std::result::Result<bool, ProcessError> {
    let name = record.target_name.as_deref().ok_or_else(|| ProcessError::Convert {
        source_path: record.source.clone(),
        reason: "pending record has no target name".to_string(),
    })?;

    let year_folder = processed_dir.join(record.target_year.to_string());
    fs::create_dir_all(&year_folder).map_err(|source| ProcessError::CreateFolder {
        path: year_folder.clone(),
        source,
    })?;

    let target = year_folder.join(name);
    if record.convert {
        convert_with_ffmpeg(&record.source, &target)?;
        Ok(true)
    } else {
        fs::copy(&record.source, &target).map_err(|source| ProcessError::Copy {
            source_path: record.source.clone(),
            target: target.clone(),
            source,
        })?;
        Ok(false)
    }
}

/// Convert a file by shelling out to ffmpeg
fn convert_with_ffmpeg(source: &Path, target: &Path) -> std::result::Result<(), ProcessError> {
    let status = Command::new("ffmpeg")
        .arg("-i")
        .arg(source)
        .arg("-y")
        .arg(target)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| ProcessError::Convert {
            source_path: source.to_path_buf(),
            reason: format!("failed to launch ffmpeg: {e}"),
        })?;

    if !status.success() {
        return Err(ProcessError::Convert {
            source_path: source.to_path_buf(),
            reason: format!("ffmpeg exited with {status}"),
        });
    }

    Ok(())
}

/// Move a duplicate source into the holding folder.
///
/// Falls back to copy-and-remove when a plain rename crosses filesystems.
fn move_aside(source: &Path, holding: &Path) -> std::result::Result<(), ProcessError> {
    fs::create_dir_all(holding).map_err(|e| ProcessError::CreateFolder {
        path: holding.to_path_buf(),
        source: e,
    })?;

    let file_name = source.file_name().ok_or_else(|| ProcessError::Copy {
        source_path: source.to_path_buf(),
        target: holding.to_path_buf(),
        source: std::io::Error::other("source has no file name"),
    })?;
    let target = holding.join(file_name);

    if fs::rename(source, &target).is_ok() {
        return Ok(());
    }

    fs::copy(source, &target).map_err(|e| ProcessError::Copy {
        source_path: source.to_path_buf(),
        target: target.clone(),
        source: e,
    })?;
    fs::remove_file(source).map_err(|e| ProcessError::Copy {
        source_path: source.to_path_buf(),
        target,
        source: e,
    })?;

    Ok(())
}
