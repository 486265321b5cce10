//! Admission queue, concurrency gate and the scheduler tying them together.
//!
//! All queue and active-set state lives behind one `parking_lot::Mutex`. Blocking
//! admission waits on a `parking_lot::Condvar` paired with that mutex; async
//! admission waits on a `tokio::sync::Notify`. Every state change that can make
//! some waiter eligible (enqueue, withdraw, admission, release, cap change,
//! shutdown) wakes *all* waiters of both kinds, and each waiter re-runs the
//! eligibility check from scratch.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};

use crate::core::history::{build_history_entry, HistorySink, NoopHistorySink};
use crate::core::{Outcome, SchedulerError, Task, TaskRequest};
use crate::util::serde::TaskId;

/// Point-in-time counters for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Tasks in the admission queue.
    pub waiting_count: usize,
    /// Tasks holding a slot, privileged ones included.
    pub active_count: usize,
    /// Current nominal cap.
    pub max_concurrent: usize,
}

/// Cloned view of every live task, for the operator queue monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Active tasks, earliest admitted first.
    pub active: Vec<Task>,
    /// Waiting tasks in queue order.
    pub waiting: Vec<Task>,
    /// Current nominal cap.
    pub max_concurrent: usize,
}

/// State guarded by the scheduler mutex.
struct GateState {
    waiting: VecDeque<Task>,
    active: HashMap<TaskId, Task>,
    max_concurrent: usize,
    shutdown: bool,
}

/// Result of one evaluation of the admission rules.
enum Admission {
    /// The task holds a slot. `fresh` is false when it already did.
    Granted { task: Task, fresh: bool },
    /// Not eligible yet.
    Pending,
}

impl GateState {
    fn evaluate(&mut self, id: TaskId) -> Result<Admission, SchedulerError> {
        if let Some(task) = self.active.get(&id) {
            return Ok(Admission::Granted {
                task: task.clone(),
                fresh: false,
            });
        }
        if self.shutdown {
            return Err(SchedulerError::ShuttingDown);
        }

        let index = self
            .waiting
            .iter()
            .position(|t| t.id == id)
            .ok_or(SchedulerError::TaskNotFound(id))?;
        let privileged = self.waiting[index].privilege.is_privileged();

        if !privileged && (index != 0 || self.active.len() >= self.max_concurrent) {
            return Ok(Admission::Pending);
        }

        let mut task = self
            .waiting
            .remove(index)
            .ok_or(SchedulerError::TaskNotFound(id))?;
        task.mark_processing();
        if privileged && self.active.len() >= self.max_concurrent {
            tracing::warn!(
                "privileged task {} admitted over cap (active={}, max={})",
                id,
                self.active.len() + 1,
                self.max_concurrent
            );
        }
        self.active.insert(id, task.clone());
        Ok(Admission::Granted { task, fresh: true })
    }

    fn withdraw(&mut self, id: TaskId) -> Option<Task> {
        let index = self.waiting.iter().position(|t| t.id == id)?;
        self.waiting.remove(index)
    }

    fn status(&self) -> QueueStatus {
        QueueStatus {
            waiting_count: self.waiting.len(),
            active_count: self.active.len(),
            max_concurrent: self.max_concurrent,
        }
    }
}

/// Process-wide admission gate for scarce conversion workers.
///
/// Construct once, share behind an `Arc`, and drive each unit of work through
/// `enqueue` → `admit` → (work) → `release`.
///
/// - Ordinary tasks are admitted in strict FIFO order and only while the active
///   set is below `max_concurrent`.
/// - Privileged tasks are admitted as soon as they ask, regardless of queue
///   position or the cap; the active set may exceed the cap until releases
///   bring it back down.
/// - Finished tasks are handed to the [`HistorySink`] and dropped from memory.
pub struct Scheduler {
    state: Mutex<GateState>,
    /// Wakes threads parked in `admit`/`admit_timeout`.
    wake_condvar: Condvar,
    /// Wakes futures parked in `admit_async`.
    #[cfg(feature = "tokio-runtime")]
    wake_notify: tokio::sync::Notify,
    history: Arc<dyn HistorySink>,
    /// Bound applied by [`Scheduler::admit_bounded`] and guarded runs.
    default_admit_timeout: Option<Duration>,
}

impl Scheduler {
    /// Create a scheduler with the given cap and a history sink that discards records.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] if `max_concurrent` is zero.
    pub fn new(max_concurrent: usize) -> Result<Self, SchedulerError> {
        validate_cap(max_concurrent)?;
        Ok(Self {
            state: Mutex::new(GateState {
                waiting: VecDeque::new(),
                active: HashMap::new(),
                max_concurrent,
                shutdown: false,
            }),
            wake_condvar: Condvar::new(),
            #[cfg(feature = "tokio-runtime")]
            wake_notify: tokio::sync::Notify::new(),
            history: Arc::new(NoopHistorySink),
            default_admit_timeout: None,
        })
    }

    /// Attach a history sink.
    #[must_use]
    pub fn with_history(mut self, history: Arc<dyn HistorySink>) -> Self {
        self.history = history;
        self
    }

    /// Bound admission waits that go through [`Scheduler::admit_bounded`] or
    /// `runtime::run_admitted`.
    #[must_use]
    pub fn with_default_admit_timeout(mut self, timeout: Duration) -> Self {
        self.default_admit_timeout = Some(timeout);
        self
    }

    /// Configured admission bound, if any.
    #[must_use]
    pub const fn default_admit_timeout(&self) -> Option<Duration> {
        self.default_admit_timeout
    }

    /// Create a waiting task at the back of the queue. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ShuttingDown`] after [`Scheduler::shutdown`].
    pub fn enqueue(&self, request: TaskRequest) -> Result<Task, SchedulerError> {
        let task = Task::from_request(request);
        {
            let mut state = self.state.lock();
            if state.shutdown {
                return Err(SchedulerError::ShuttingDown);
            }
            state.waiting.push_back(task.clone());
            tracing::info!(
                "task {} ({}, {}) enqueued at position {}",
                task.id,
                task.name,
                task.privilege,
                state.waiting.len() - 1
            );
        }
        self.wake_all();
        Ok(task)
    }

    /// Block the calling thread until the task holds an active slot.
    ///
    /// Idempotent: if the task is already active (another caller won the grant),
    /// the active task is returned.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::TaskNotFound`] if the id is neither waiting nor active
    /// - [`SchedulerError::ShuttingDown`] if the gate is closed while waiting
    pub fn admit(&self, id: TaskId) -> Result<Task, SchedulerError> {
        let mut state = self.state.lock();
        loop {
            match state.evaluate(id)? {
                Admission::Granted { task, fresh } => {
                    drop(state);
                    self.on_granted(&task, fresh);
                    return Ok(task);
                }
                Admission::Pending => {
                    tracing::debug!("task {} not eligible, parking", id);
                    self.wake_condvar.wait(&mut state);
                }
            }
        }
    }

    /// Like [`Scheduler::admit`] but gives up after `timeout`.
    ///
    /// On timeout the task is withdrawn from the queue before returning, so no
    /// phantom entry holds up the tasks behind it.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::AdmissionTimeout`] if the deadline passes first
    /// - [`SchedulerError::TaskNotFound`] if the id is neither waiting nor active
    /// - [`SchedulerError::ShuttingDown`] if the gate is closed while waiting
    pub fn admit_timeout(&self, id: TaskId, timeout: Duration) -> Result<Task, SchedulerError> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.admit(id);
        };
        let mut state = self.state.lock();
        loop {
            match state.evaluate(id)? {
                Admission::Granted { task, fresh } => {
                    drop(state);
                    self.on_granted(&task, fresh);
                    return Ok(task);
                }
                Admission::Pending => {
                    if Instant::now() >= deadline {
                        state.withdraw(id);
                        drop(state);
                        tracing::warn!("task {} timed out waiting for admission", id);
                        self.wake_all();
                        return Err(SchedulerError::AdmissionTimeout(id));
                    }
                    // A timed-out wait still loops once more so a grant that raced
                    // the deadline is not thrown away.
                    let _ = self.wake_condvar.wait_until(&mut state, deadline);
                }
            }
        }
    }

    /// Blocking admission bounded by the configured default timeout.
    ///
    /// Falls back to [`Scheduler::admit`] when no default is set.
    ///
    /// # Errors
    ///
    /// Same as [`Scheduler::admit_timeout`].
    pub fn admit_bounded(&self, id: TaskId) -> Result<Task, SchedulerError> {
        match self.default_admit_timeout {
            Some(timeout) => self.admit_timeout(id, timeout),
            None => self.admit(id),
        }
    }

    /// Async form of [`Scheduler::admit`]; parks the future instead of the thread.
    ///
    /// Dropping the future does not withdraw the task. Callers that wrap this in
    /// a timeout must call [`Scheduler::withdraw`] themselves.
    ///
    /// # Errors
    ///
    /// Same as [`Scheduler::admit`].
    #[cfg(feature = "tokio-runtime")]
    pub async fn admit_async(&self, id: TaskId) -> Result<Task, SchedulerError> {
        loop {
            let mut notified = std::pin::pin!(self.wake_notify.notified());
            // Register before checking state so a wake between the check and
            // the await is not lost.
            notified.as_mut().enable();

            let granted = {
                let mut state = self.state.lock();
                state.evaluate(id)?
            };
            match granted {
                Admission::Granted { task, fresh } => {
                    self.on_granted(&task, fresh);
                    return Ok(task);
                }
                Admission::Pending => {
                    tracing::debug!("task {} not eligible, awaiting wake", id);
                    notified.await;
                }
            }
        }
    }

    /// Report completion of an admitted task and free its slot.
    ///
    /// Unknown, withdrawn, or already-released ids are ignored. History
    /// persistence failures are logged and never affect the slot release.
    /// Returns the terminal task when one was released.
    pub fn release(
        &self,
        id: TaskId,
        outcome: Outcome,
        error_detail: Option<String>,
    ) -> Option<Task> {
        let task = {
            let mut state = self.state.lock();
            let Some(mut task) = state.active.remove(&id) else {
                tracing::warn!("release for task {} ignored: not active", id);
                return None;
            };
            task.mark_finished(outcome, error_detail);
            tracing::info!(
                "task {} {:?}; active={}, waiting={}",
                id,
                task.status,
                state.active.len(),
                state.waiting.len()
            );
            task
        };
        self.wake_all();

        let entry = build_history_entry(&task);
        if let Err(e) = self.history.record(&entry) {
            tracing::error!("failed to record history for task {}: {}", id, e);
        }
        Some(task)
    }

    /// Remove a task that is still waiting. Active tasks are left alone.
    ///
    /// This is the cleanup path for callers that stop waiting (timeout, client
    /// disconnect). Returns the removed task, if it was waiting.
    pub fn withdraw(&self, id: TaskId) -> Option<Task> {
        let removed = self.state.lock().withdraw(id);
        if removed.is_some() {
            tracing::info!("task {} withdrawn from queue", id);
            self.wake_all();
        }
        removed
    }

    /// Counters for display.
    #[must_use]
    pub fn status(&self) -> QueueStatus {
        self.state.lock().status()
    }

    /// Zero-based queue position of a waiting task; `None` once it is active or gone.
    #[must_use]
    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.state.lock().waiting.iter().position(|t| t.id == id)
    }

    /// Clone of a live (waiting or active) task.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<Task> {
        let state = self.state.lock();
        state
            .active
            .get(&id)
            .or_else(|| state.waiting.iter().find(|t| t.id == id))
            .cloned()
    }

    /// Cloned listing of all live tasks.
    #[must_use]
    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.state.lock();
        let mut active: Vec<Task> = state.active.values().cloned().collect();
        active.sort_by_key(|t| (t.started_at_ms, t.created_at_ms));
        QueueSnapshot {
            active,
            waiting: state.waiting.iter().cloned().collect(),
            max_concurrent: state.max_concurrent,
        }
    }

    /// Current nominal cap.
    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.state.lock().max_concurrent
    }

    /// Change the cap at runtime.
    ///
    /// Already-active tasks are never evicted; lowering the cap below the
    /// active count only delays further ordinary admissions.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] if `max_concurrent` is zero.
    pub fn set_max_concurrent(&self, max_concurrent: usize) -> Result<(), SchedulerError> {
        validate_cap(max_concurrent)?;
        let previous = {
            let mut state = self.state.lock();
            std::mem::replace(&mut state.max_concurrent, max_concurrent)
        };
        tracing::info!("max_concurrent changed {} -> {}", previous, max_concurrent);
        self.wake_all();
        Ok(())
    }

    /// Close the gate: new enqueues and pending admissions fail with
    /// [`SchedulerError::ShuttingDown`]. Waiting tasks are dropped from the
    /// queue; active tasks may still be released.
    pub fn shutdown(&self) {
        let dropped = {
            let mut state = self.state.lock();
            state.shutdown = true;
            std::mem::take(&mut state.waiting).len()
        };
        tracing::info!("scheduler shutting down; {} waiting tasks dropped", dropped);
        self.wake_all();
    }

    /// Whether [`Scheduler::shutdown`] has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.state.lock().shutdown
    }

    fn on_granted(&self, task: &Task, fresh: bool) {
        if fresh {
            tracing::info!("task {} ({}) admitted", task.id, task.privilege);
            self.wake_all();
        }
    }

    /// Broadcast to every parked waiter, blocking and async alike.
    fn wake_all(&self) {
        self.wake_condvar.notify_all();
        #[cfg(feature = "tokio-runtime")]
        self.wake_notify.notify_waiters();
    }
}

fn validate_cap(max_concurrent: usize) -> Result<(), SchedulerError> {
    if max_concurrent == 0 {
        return Err(SchedulerError::InvalidConfig(
            "max_concurrent must be greater than 0".into(),
        ));
    }
    Ok(())
}
