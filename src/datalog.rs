use std::error::Error as StdError;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Default file the row log is appended to.
pub const DEFAULT_LOG_PATH: &str = "data.txt";

/// Failure to append to the row log.
#[derive(Debug)]
pub struct LogError {
    path: PathBuf,
    source: io::Error,
}

impl LogError {
    /// The log file that could not be written.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not append to {}: {}",
            self.path.display(),
            self.source
        )
    }
}

impl StdError for LogError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}

/// Append-only text log of every ingested row.
///
/// The file is opened and closed again for each row so that a row is on disk as soon as
/// [`RowLog::append`] returns.
#[derive(Debug, Clone)]
pub struct RowLog {
    path: PathBuf,
}

impl RowLog {
    /// Log appending to `path`. The file is created on first use.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        RowLog { path: path.into() }
    }

    /// The file rows are appended to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends row number `row` with its raw text, stamped with the current local time.
    pub fn append(&self, row: usize, raw: &str) -> Result<(), LogError> {
        self.append_at(Local::now(), row, raw)
    }

    /// Appends row number `row` with its raw text, stamped with `at`.
    pub fn append_at(&self, at: DateTime<Local>, row: usize, raw: &str) -> Result<(), LogError> {
        let entry = format_entry(at, row, raw);
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(entry.as_bytes()))
            .map_err(|source| LogError {
                path: self.path.clone(),
                source,
            })
    }
}

impl Default for RowLog {
    fn default() -> Self {
        RowLog::new(DEFAULT_LOG_PATH)
    }
}

fn format_entry(at: DateTime<Local>, row: usize, raw: &str) -> String {
    format!(
        "{}: [{}] {}\n\n",
        at.format("%Y-%m-%dT%H:%M:%S%.6f"),
        row,
        raw
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 12, 0, 5).unwrap()
    }

    #[test]
    fn entry_format() {
        assert_eq!(
            format_entry(noon(), 2, "1 3 1"),
            "2024-03-09T12:00:05.000000: [2] 1 3 1\n\n"
        );
    }

    #[test]
    fn appends_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let log = RowLog::new(dir.path().join("data.txt"));
        log.append_at(noon(), 1, "3 1 3").unwrap();
        log.append_at(noon(), 2, "1 3 1").unwrap();

        let text = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(
            text,
            "2024-03-09T12:00:05.000000: [1] 3 1 3\n\n2024-03-09T12:00:05.000000: [2] 1 3 1\n\n"
        );
    }

    #[test]
    fn reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let log = RowLog::new(dir.path().join("missing").join("data.txt"));
        let err = log.append(1, "1").unwrap_err();
        assert_eq!(err.path(), log.path());
    }
}
