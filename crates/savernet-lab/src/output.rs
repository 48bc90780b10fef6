//! Round record output
//!
//! Append-only JSONL logging of per-round records, one JSON object per
//! line so downstream tooling can tail or stream the file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::LabError;
use crate::experiment::RoundRecord;

/// JSONL writer for round records.
pub struct RoundLog {
    writer: Option<BufWriter<File>>,
    records_written: u64,
}

impl RoundLog {
    /// Creates a log writing to the given path, truncating any existing
    /// file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, LabError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            writer: Some(BufWriter::new(file)),
            records_written: 0,
        })
    }

    /// Creates a log that discards records (for quiet runs and tests).
    pub fn null() -> Self {
        Self {
            writer: None,
            records_written: 0,
        }
    }

    /// Appends one record as a single JSON line.
    pub fn record(&mut self, record: &RoundRecord) -> Result<(), LabError> {
        self.records_written += 1;
        if let Some(ref mut writer) = self.writer {
            let json = serde_json::to_string(record)?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    /// Flushes the buffer to disk.
    pub fn flush(&mut self) -> Result<(), LabError> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }
}

impl Drop for RoundLog {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            eprintln!("Warning: Failed to flush round log: {}", e);
        }
    }
}

/// Reads every record back from a JSONL file, skipping blank lines.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<RoundRecord>, LabError> {
    let content = std::fs::read_to_string(path)?;
    let mut records = Vec::new();
    for line in content.lines() {
        if !line.trim().is_empty() {
            records.push(serde_json::from_str(line)?);
        }
    }
    Ok(records)
}
