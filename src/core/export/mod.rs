//! # Export Module
//!
//! Persists the evaluation plan as a CSV log and reads it back for the
//! processing stage.
//!
//! Columns: `source, timestamp, target_year, target_name, status,
//! duplicate_of, convert, import`. The log is the hand-off point between
//! the two stages: evaluation writes it, the user can inspect or prune it,
//! processing reads it and rewrites it with updated statuses.

use crate::core::plan::{EvaluationRecord, RecordStatus};
use crate::error::ExportError;
use chrono::NaiveDateTime;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const HEADER: &str = "source,timestamp,target_year,target_name,status,duplicate_of,convert,import";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Write records to any writer in evaluation-log format
pub fn write_log<W: Write>(records: &[EvaluationRecord], mut writer: W) -> std::io::Result<()> {
    writeln!(writer, "{HEADER}")?;

    for record in records {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{}",
            quote(&record.source.display().to_string()),
            record.timestamp.format(TIMESTAMP_FORMAT),
            record.target_year,
            quote(record.target_name.as_deref().unwrap_or("")),
            record.status,
            quote(
                &record
                    .duplicate_of
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            ),
            record.convert,
            record.import,
        )?;
    }

    Ok(())
}

/// Write the evaluation log to a file
pub fn write_log_file(records: &[EvaluationRecord], path: &Path) -> Result<(), ExportError> {
    let map_err = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(map_err)?;
    let mut writer = BufWriter::new(file);
    write_log(records, &mut writer).map_err(map_err)?;
    writer.flush().map_err(map_err)
}

/// Read an evaluation log back into records
pub fn read_log_file(path: &Path) -> Result<Vec<EvaluationRecord>, ExportError> {
    let file = File::open(path).map_err(|source| ExportError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let malformed = |line: usize, reason: &str| ExportError::MalformedRow {
        path: path.to_path_buf(),
        line,
        reason: reason.to_string(),
    };

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| ExportError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if index == 0 {
            // Header row
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        let line_number = index + 1;
        let fields = split_row(&line);
        if fields.len() != 8 {
            return Err(malformed(line_number, "expected 8 fields"));
        }

        let timestamp = NaiveDateTime::parse_from_str(&fields[1], TIMESTAMP_FORMAT)
            .map_err(|_| malformed(line_number, "bad timestamp"))?;
        let target_year: i32 = fields[2]
            .parse()
            .map_err(|_| malformed(line_number, "bad target year"))?;
        let status: RecordStatus = fields[4]
            .parse()
            .map_err(|_| malformed(line_number, "bad status"))?;
        let convert: bool = fields[6]
            .parse()
            .map_err(|_| malformed(line_number, "bad convert flag"))?;
        let import: bool = fields[7]
            .parse()
            .map_err(|_| malformed(line_number, "bad import flag"))?;

        records.push(EvaluationRecord {
            source: PathBuf::from(&fields[0]),
            timestamp,
            target_year,
            target_name: non_empty(&fields[3]),
            status,
            duplicate_of: non_empty(&fields[5]).map(PathBuf::from),
            convert,
            import,
        });
    }

    Ok(records)
}

fn non_empty(field: &str) -> Option<String> {
    if field.is_empty() {
        None
    } else {
        Some(field.to_string())
    }
}

/// Quote a field if it contains a comma, quote or newline
fn quote(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split one CSV row, honoring quoted fields
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            other => current.push(other),
        }
    }
    fields.push(current);

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn record(source: &str, status: RecordStatus) -> EvaluationRecord {
        EvaluationRecord {
            source: PathBuf::from(source),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            target_year: 2024,
            target_name: Some("20240101_001.jpg".to_string()),
            status,
            duplicate_of: None,
            convert: false,
            import: status == RecordStatus::Pending,
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let records = vec![record("/raw/a.jpg", RecordStatus::Pending)];
        let mut out = Vec::new();

        write_log(&records, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], HEADER);
        assert_eq!(
            lines[1],
            "/raw/a.jpg,2024-01-01T09:30:00,2024,20240101_001.jpg,pending,,false,true"
        );
    }

    #[test]
    fn log_round_trips_through_a_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("evaluation_log.csv");

        let mut duplicate = record("/raw/b.jpg", RecordStatus::Duplicate);
        duplicate.target_name = None;
        duplicate.duplicate_of = Some(PathBuf::from("/raw/a.jpg"));
        let records = vec![record("/raw/a.jpg", RecordStatus::Pending), duplicate];

        write_log_file(&records, &path).unwrap();
        let restored = read_log_file(&path).unwrap();

        assert_eq!(restored.len(), 2);
        assert_eq!(restored[0].source, records[0].source);
        assert_eq!(restored[0].status, RecordStatus::Pending);
        assert_eq!(restored[0].target_name, records[0].target_name);
        assert_eq!(restored[1].status, RecordStatus::Duplicate);
        assert_eq!(restored[1].duplicate_of, records[1].duplicate_of);
        assert_eq!(restored[1].target_name, None);
    }

    #[test]
    fn paths_with_commas_survive_the_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("evaluation_log.csv");

        let records = vec![record("/raw/holiday, 2024/a.jpg", RecordStatus::Pending)];
        write_log_file(&records, &path).unwrap();
        let restored = read_log_file(&path).unwrap();

        assert_eq!(restored[0].source, PathBuf::from("/raw/holiday, 2024/a.jpg"));
    }

    #[test]
    fn missing_log_is_a_read_error() {
        let result = read_log_file(Path::new("/nonexistent/evaluation_log.csv"));
        assert!(matches!(result, Err(ExportError::Read { .. })));
    }

    #[test]
    fn short_row_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("evaluation_log.csv");
        std::fs::write(&path, format!("{HEADER}\n/raw/a.jpg,oops\n")).unwrap();

        let result = read_log_file(&path);
        assert!(matches!(result, Err(ExportError::MalformedRow { line: 2, .. })));
    }

    #[test]
    fn quoted_field_with_escaped_quote_parses() {
        let fields = split_row(r#"a,"b""c",d"#);
        assert_eq!(fields, vec!["a", "b\"c", "d"]);
    }
}
