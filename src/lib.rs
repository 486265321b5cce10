//! # Admission Gate
//!
//! A process-wide admission gate for scarce, CPU/memory-heavy workers such as
//! document converters.
//!
//! Many request handlers compete for a handful of conversion slots. The gate
//! serializes them through one in-memory queue:
//!
//! - **Strict FIFO** for ordinary callers, bounded by a runtime-adjustable
//!   `max_concurrent` cap
//! - **Privileged bypass** for administrative callers, who are admitted as soon
//!   as they ask, even when that pushes the active set over the cap
//! - **Broadcast wake-ups** on every state change, with each waiter re-checking
//!   its own eligibility
//! - **History handoff** of every finished task to a pluggable sink; sink
//!   failures are logged and never hold a slot hostage
//!
//! Live queue state is not persisted and does not survive a restart.
//!
//! ## Blocking usage
//!
//! ```rust
//! use admission_gate::core::{Outcome, Scheduler, TaskRequest};
//!
//! let gate = Scheduler::new(1).unwrap();
//! let task = gate.enqueue(TaskRequest::new("Word to PDF", "10.0.0.1")).unwrap();
//! let task = gate.admit(task.id).unwrap();
//! // ... convert ...
//! gate.release(task.id, Outcome::Completed, None);
//! assert_eq!(gate.status().active_count, 0);
//! ```
//!
//! ## Async usage
//!
//! ```rust,ignore
//! use admission_gate::core::TaskRequest;
//! use admission_gate::runtime::run_admitted;
//!
//! let pdf = run_admitted(&gate, TaskRequest::new("Markdown to PDF", ip), |task| async move {
//!     render(task.label.as_deref()).await
//! })
//! .await?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: tasks, admission, history handoff.
pub mod core;
/// Configuration models for the gate and its history backend.
pub mod config;
/// Builders to construct the scheduler from configuration.
pub mod builders;
/// Infrastructure adapters for history persistence.
pub mod infra;
/// Runtime adapters (tokio) and guarded execution.
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
/// Shared utilities.
pub mod util;
