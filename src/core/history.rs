//! History sink contract and the in-memory implementation.
//!
//! A history record is produced exactly once per terminal task. Sinks report
//! failures through `Result`; the scheduler logs them and carries on.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::{SchedulerError, Task, TaskStatus};
use crate::util::clock::elapsed_secs;
use crate::util::serde::{Privilege, TaskId};

/// Record handed to a [`HistorySink`] when a task finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Task identifier.
    pub id: TaskId,
    /// Kind of work.
    pub name: String,
    /// Caller class.
    pub privilege: Privilege,
    /// Caller descriptor.
    pub origin: String,
    /// Work subject.
    pub label: Option<String>,
    /// Terminal status (`completed` or `failed`).
    pub status: TaskStatus,
    /// Creation timestamp (ms since epoch).
    pub created_at_ms: u128,
    /// Admission timestamp (ms since epoch).
    pub started_at_ms: Option<u128>,
    /// Completion timestamp (ms since epoch).
    pub completed_at_ms: u128,
    /// Seconds between admission and completion, never negative.
    pub duration_seconds: f64,
    /// Failure detail for failed tasks.
    pub error_detail: Option<String>,
}

/// Build a history record from a task that has just been released.
#[must_use]
pub fn build_history_entry(task: &Task) -> HistoryEntry {
    let completed_at_ms = task.completed_at_ms.unwrap_or(task.created_at_ms);
    let started = task.started_at_ms.unwrap_or(completed_at_ms);
    HistoryEntry {
        id: task.id,
        name: task.name.clone(),
        privilege: task.privilege,
        origin: task.origin.clone(),
        label: task.label.clone(),
        status: task.status,
        created_at_ms: task.created_at_ms,
        started_at_ms: task.started_at_ms,
        completed_at_ms,
        duration_seconds: elapsed_secs(started, completed_at_ms),
        error_detail: task.error_detail.clone(),
    }
}

/// Persistence consumer for finished tasks.
///
/// Implementations must be cheap to call from the release path; slow
/// backends should be wrapped in [`crate::runtime::DeferredHistorySink`].
pub trait HistorySink: Send + Sync {
    /// Persist one record.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::HistoryWriteFailed`] (or a backend error) when
    /// the record could not be stored.
    fn record(&self, entry: &HistoryEntry) -> Result<(), SchedulerError>;
}

/// Sink that discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHistorySink;

impl HistorySink for NoopHistorySink {
    fn record(&self, _entry: &HistoryEntry) -> Result<(), SchedulerError> {
        Ok(())
    }
}

/// In-memory history sink for testing and dev.
pub struct InMemoryHistorySink {
    entries: Mutex<VecDeque<HistoryEntry>>,
    max_entries: usize,
}

impl InMemoryHistorySink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(max_entries.min(1024))),
            max_entries,
        }
    }

    /// Retrieve a snapshot of stored records, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Most recent `limit` records, newest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<HistoryEntry> {
        self.entries.lock().iter().rev().take(limit).cloned().collect()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl HistorySink for InMemoryHistorySink {
    fn record(&self, entry: &HistoryEntry) -> Result<(), SchedulerError> {
        if self.max_entries == 0 {
            return Ok(());
        }
        let mut entries = self.entries.lock();
        if entries.len() >= self.max_entries {
            entries.pop_front();
        }
        entries.push_back(entry.clone());
        Ok(())
    }
}
