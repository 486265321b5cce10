//! Core scheduling abstractions: tasks, the admission gate, history handoff.

pub mod error;
pub mod history;
pub mod scheduler;
pub mod spawn;
pub mod task;

pub use error::{AppResult, SchedulerError};
pub use history::{build_history_entry, HistoryEntry, HistorySink, InMemoryHistorySink, NoopHistorySink};
pub use scheduler::{QueueSnapshot, QueueStatus, Scheduler};
pub use spawn::Spawn;
pub use task::{Outcome, Task, TaskRequest, TaskStatus};
