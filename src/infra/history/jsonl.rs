//! File-backed history sink.
//!
//! Each finished task is appended as one JSON object per line, which keeps the
//! log greppable and lets the history page read it back without a database.

use std::fs::{create_dir_all, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::core::{HistoryEntry, HistorySink, SchedulerError};

/// History sink using JSON lines for durability.
pub struct JsonLinesHistorySink {
    path: PathBuf,
    /// Serializes appends so concurrent releases never interleave lines.
    write_lock: Mutex<()>,
}

impl JsonLinesHistorySink {
    /// Open (or prepare to create) the history file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Backend`] if the parent directory cannot be created.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SchedulerError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent).map_err(|e| SchedulerError::Backend(e.to_string()))?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Location of the history file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back the most recent `limit` records, newest first.
    ///
    /// Lines that fail to parse are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Backend`] if the file exists but cannot be read.
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, SchedulerError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = OpenOptions::new()
            .read(true)
            .open(&self.path)
            .map_err(|e| SchedulerError::Backend(e.to_string()))?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| SchedulerError::Backend(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HistoryEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!("skipping malformed history line: {}", e),
            }
        }
        entries.sort_by(|a, b| b.completed_at_ms.cmp(&a.completed_at_ms));
        entries.truncate(limit);
        Ok(entries)
    }
}

impl HistorySink for JsonLinesHistorySink {
    fn record(&self, entry: &HistoryEntry) -> Result<(), SchedulerError> {
        let line = serde_json::to_string(entry)
            .map_err(|e| SchedulerError::HistoryWriteFailed(e.to_string()))?;
        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| SchedulerError::HistoryWriteFailed(e.to_string()))?;
        writeln!(file, "{line}").map_err(|e| SchedulerError::HistoryWriteFailed(e.to_string()))
    }
}
