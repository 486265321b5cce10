//! Task entity: immutable identity plus the lifecycle fields the scheduler mutates.

use serde::{Deserialize, Serialize};

use crate::util::clock::now_ms;
use crate::util::serde::{Privilege, TaskId};

/// Status of a task in the scheduler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Held in the admission queue.
    Waiting,
    /// Admitted; holds a slot in the active set.
    Processing,
    /// Finished successfully.
    Completed,
    /// Finished with an error reported by the caller.
    Failed,
}

impl TaskStatus {
    /// Completed and failed tasks are never mutated again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Outcome a caller reports when it releases an admitted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The work succeeded.
    Completed,
    /// The work failed; the caller supplies an error detail alongside.
    Failed,
}

impl From<Outcome> for TaskStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Completed => Self::Completed,
            Outcome::Failed => Self::Failed,
        }
    }
}

/// Caller-supplied description of a unit of work, consumed by `enqueue`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Kind of work, e.g. `"Word to PDF"`.
    pub name: String,
    /// Caller class.
    pub privilege: Privilege,
    /// Caller descriptor kept for auditing (client address, browser id).
    pub origin: String,
    /// Subject of the work, e.g. uploaded file names.
    pub label: Option<String>,
}

impl TaskRequest {
    /// Ordinary request with no label.
    pub fn new(name: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            privilege: Privilege::Ordinary,
            origin: origin.into(),
            label: None,
        }
    }

    /// Set the privilege class.
    #[must_use]
    pub fn with_privilege(mut self, privilege: Privilege) -> Self {
        self.privilege = privilege;
        self
    }

    /// Set the work subject.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// One unit of work tracked by the scheduler.
///
/// Identity fields are fixed at creation. `status`, the `*_at_ms` stamps and
/// `error_detail` are written only by [`crate::core::Scheduler`]; callers only
/// ever see clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique handle for every later operation.
    pub id: TaskId,
    /// Kind of work.
    pub name: String,
    /// Caller class.
    pub privilege: Privilege,
    /// Caller descriptor.
    pub origin: String,
    /// Work subject.
    pub label: Option<String>,
    /// Lifecycle state.
    pub status: TaskStatus,
    /// Creation timestamp (ms since epoch).
    pub created_at_ms: u128,
    /// Admission timestamp, unset while waiting.
    pub started_at_ms: Option<u128>,
    /// Completion timestamp, unset until released.
    pub completed_at_ms: Option<u128>,
    /// Failure detail, set only on failed completion.
    pub error_detail: Option<String>,
}

impl Task {
    pub(crate) fn from_request(request: TaskRequest) -> Self {
        Self {
            id: TaskId::new(),
            name: request.name,
            privilege: request.privilege,
            origin: request.origin,
            label: request.label,
            status: TaskStatus::Waiting,
            created_at_ms: now_ms(),
            started_at_ms: None,
            completed_at_ms: None,
            error_detail: None,
        }
    }

    pub(crate) fn mark_processing(&mut self) {
        self.status = TaskStatus::Processing;
        self.started_at_ms = Some(now_ms());
    }

    pub(crate) fn mark_finished(&mut self, outcome: Outcome, error_detail: Option<String>) {
        self.status = outcome.into();
        self.completed_at_ms = Some(now_ms());
        self.error_detail = match outcome {
            Outcome::Failed => error_detail,
            Outcome::Completed => None,
        };
    }
}
