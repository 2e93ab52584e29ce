//! # Plan Module
//!
//! The evaluation plan: one ordered decision per raw file.
//!
//! Every scanned raw file ends up as exactly one [`EvaluationRecord`] with
//! a status of `pending` (import under an assigned name), `duplicate`
//! (defer to a survivor) or `error` (content unreadable). The ordered
//! record list is the engine's sole output contract; the CSV writer and
//! the processing stage both consume it and nothing else.

mod builder;

pub use builder::{EvaluationConfig, EvaluationOutcome, EvaluationPlanBuilder};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Decision state of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Import under the assigned name
    Pending,
    /// Equivalent to a surviving file; not imported
    Duplicate,
    /// Content could not be read; excluded from evaluation
    Error,
    /// Imported by a completed processing run
    Done,
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordStatus::Pending => write!(f, "pending"),
            RecordStatus::Duplicate => write!(f, "duplicate"),
            RecordStatus::Error => write!(f, "error"),
            RecordStatus::Done => write!(f, "done"),
        }
    }
}

impl std::str::FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RecordStatus::Pending),
            "duplicate" => Ok(RecordStatus::Duplicate),
            "error" => Ok(RecordStatus::Error),
            "done" => Ok(RecordStatus::Done),
            other => Err(format!("unknown record status: {other}")),
        }
    }
}

/// Map a source extension to the archived extension and conversion flag.
///
/// HEIC stills and MOV clips are converted on import; everything else
/// keeps its extension.
pub fn conversion_target(extension: &str) -> (String, bool) {
    match extension {
        "heic" => ("jpg".to_string(), true),
        "mov" => ("mp4".to_string(), true),
        other => (other.to_string(), false),
    }
}

/// One decision: what happens to one raw file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Source file
    pub source: PathBuf,
    /// Timestamp the decision was made under
    pub timestamp: NaiveDateTime,
    /// Archive folder grouping key (year of the timestamp)
    pub target_year: i32,
    /// Assigned archive name; present only for pending records
    pub target_name: Option<String>,
    /// Decision state
    pub status: RecordStatus,
    /// Survivor this file defers to; present only for duplicate records
    pub duplicate_of: Option<PathBuf>,
    /// Whether import requires a format conversion
    pub convert: bool,
    /// Whether the processing stage should import this file
    pub import: bool,
}

/// The finished evaluation: records ordered by (timestamp, path)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationPlan {
    pub records: Vec<EvaluationRecord>,
}

impl EvaluationPlan {
    /// Number of records in the plan
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the plan holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records awaiting import
    pub fn pending_count(&self) -> usize {
        self.count(RecordStatus::Pending)
    }

    /// Records marked as duplicates
    pub fn duplicate_count(&self) -> usize {
        self.count(RecordStatus::Duplicate)
    }

    /// Records excluded by read failures
    pub fn error_count(&self) -> usize {
        self.count(RecordStatus::Error)
    }

    fn count(&self, status: RecordStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_mapping() {
        assert_eq!(conversion_target("heic"), ("jpg".to_string(), true));
        assert_eq!(conversion_target("mov"), ("mp4".to_string(), true));
        assert_eq!(conversion_target("jpg"), ("jpg".to_string(), false));
        assert_eq!(conversion_target("png"), ("png".to_string(), false));
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            RecordStatus::Pending,
            RecordStatus::Duplicate,
            RecordStatus::Error,
            RecordStatus::Done,
        ] {
            let parsed: RecordStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn unknown_status_fails_to_parse() {
        assert!("imported".parse::<RecordStatus>().is_err());
    }

    #[test]
    fn plan_counts_by_status() {
        let record = |status| EvaluationRecord {
            source: PathBuf::from("/raw/a.jpg"),
            timestamp: chrono::NaiveDateTime::UNIX_EPOCH,
            target_year: 1970,
            target_name: None,
            status,
            duplicate_of: None,
            convert: false,
            import: false,
        };

        let plan = EvaluationPlan {
            records: vec![
                record(RecordStatus::Pending),
                record(RecordStatus::Pending),
                record(RecordStatus::Duplicate),
                record(RecordStatus::Error),
            ],
        };

        assert_eq!(plan.len(), 4);
        assert_eq!(plan.pending_count(), 2);
        assert_eq!(plan.duplicate_count(), 1);
        assert_eq!(plan.error_count(), 1);
    }
}
