//! Session run log and its CSV/JSON export.
//!
//! The log is owned by whoever drives the session and passed into the
//! sequencer by reference. It only grows during a run; [`RunLog::clear`] is
//! the explicit operator reset.

use crate::{LogEntry, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Header row of the CSV export
pub const CSV_HEADER: [&str; 2] = ["Step", "Time (s)"];

/// Ordered record of every unit run in this session
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunLog {
    entries: Vec<LogEntry>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// Empty the log. There is no undo.
    pub fn clear(&mut self) {
        tracing::info!("Clearing run log ({} entries)", self.entries.len());
        self.entries.clear();
    }

    /// Entries in insertion order
    pub fn export(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn total_seconds(&self) -> u64 {
        self.entries.iter().map(|e| e.seconds).sum()
    }

    /// Write the log as CSV with a header row, even when empty
    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<W> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        writer.write_record(CSV_HEADER)?;
        for entry in &self.entries {
            writer.serialize(entry)?;
        }
        writer.flush()?;

        writer
            .into_inner()
            .map_err(|e| e.into_error().into())
    }

    /// UTF-8 encoded CSV document
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        self.to_csv_writer(Vec::new())
    }

    /// Write the CSV export to `path`, replacing any existing file
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        let file = self.to_csv_writer(file)?;
        file.sync_all()?;

        tracing::info!("Exported {} log entries to {:?}", self.entries.len(), path);
        Ok(())
    }

    /// JSON array of `{"Step": .., "Time (s)": ..}` records
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }
}

impl Extend<LogEntry> for RunLog {
    fn extend<I: IntoIterator<Item = LogEntry>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_log() -> RunLog {
        let mut log = RunLog::new();
        log.append(LogEntry::new("Coag", 10));
        log.append(LogEntry::new("Rotation", 8));
        log.append(LogEntry::new("Dip 2", 0));
        log
    }

    #[test]
    fn test_append_preserves_order() {
        let log = sample_log();
        let names: Vec<&str> = log.export().iter().map(|e| e.step.as_str()).collect();
        assert_eq!(names, vec!["Coag", "Rotation", "Dip 2"]);
        assert_eq!(log.total_seconds(), 18);
        assert_eq!(log.last(), Some(&LogEntry::new("Dip 2", 0)));
    }

    #[test]
    fn test_clear_empties_log() {
        let mut log = sample_log();
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.total_seconds(), 0);

        log.append(LogEntry::new("Cure", 2400));
        assert_eq!(log.export(), &[LogEntry::new("Cure", 2400)]);
    }

    #[test]
    fn test_csv_export_format() {
        let csv = String::from_utf8(sample_log().to_csv_bytes().unwrap()).unwrap();
        assert_eq!(csv, "Step,Time (s)\nCoag,10\nRotation,8\nDip 2,0\n");
    }

    #[test]
    fn test_empty_log_exports_header_only() {
        let csv = String::from_utf8(RunLog::new().to_csv_bytes().unwrap()).unwrap();
        assert_eq!(csv, "Step,Time (s)\n");
    }

    #[test]
    fn test_write_csv_reads_back() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("exports").join("glove_timer_log.csv");

        sample_log().write_csv(&path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "Step");
        assert_eq!(&headers[1], "Time (s)");

        let rows: Vec<LogEntry> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows, sample_log().export());
    }

    #[test]
    fn test_json_export() {
        let json = sample_log().to_json().unwrap();
        let parsed: Vec<LogEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 3);
        assert!(json.contains("\"Time (s)\": 8"));
    }
}
