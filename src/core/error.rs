//! Error types for scheduler operations.

use thiserror::Error;

use crate::util::serde::TaskId;

/// Errors produced by scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The id is neither waiting nor active (never enqueued, withdrawn, or already released).
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// A bounded admission wait elapsed; the task has been withdrawn from the queue.
    #[error("admission timed out: {0}")]
    AdmissionTimeout(TaskId),
    /// The gate was shut down while the caller was waiting or before it arrived.
    #[error("scheduler is shutting down")]
    ShuttingDown,
    /// A history sink could not persist a record. Never fatal to `release`.
    #[error("history write failed: {0}")]
    HistoryWriteFailed(String),
    /// Configuration value out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Backend-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
